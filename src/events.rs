//! In-process broadcast of task completion events.
//!
//! The orchestrator publishes one [`TaskEvent`] per task run; the dev server
//! subscribes and turns reload-worthy events into live-reload messages.

use crate::tasks::TaskId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

/// How a task run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Completed,
    CompletedWithErrors,
    Failed,
}

/// What connected browsers should do after a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reload {
    /// Nothing
    None,
    /// Full page reload, only after a successful run
    OnSuccess,
    /// Full page reload regardless of outcome
    Always,
    /// Re-fetch stylesheets after a successful run
    InjectCss,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEvent {
    pub task: TaskId,
    pub outcome: Outcome,
    pub written: Vec<PathBuf>,
    pub reload: Reload,
}

/// Message pushed to live-reload clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReloadMessage {
    Reload { task: TaskId },
    Css { task: TaskId },
}

impl TaskEvent {
    /// The live-reload message this event calls for, if any.
    pub fn reload_message(&self) -> Option<ReloadMessage> {
        let succeeded = self.outcome != Outcome::Failed;
        match self.reload {
            Reload::None => None,
            Reload::Always => Some(ReloadMessage::Reload { task: self.task }),
            Reload::OnSuccess if succeeded => Some(ReloadMessage::Reload { task: self.task }),
            Reload::InjectCss if self.outcome == Outcome::Completed => {
                Some(ReloadMessage::Css { task: self.task })
            }
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Arc<TaskEvent>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Publish an event; returns the number of subscribers that received it.
    pub fn publish(&self, event: TaskEvent) -> usize {
        tracing::trace!(task = %event.task, outcome = ?event.outcome, "publishing task event");
        self.tx.send(Arc::new(event)).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<TaskEvent>> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
