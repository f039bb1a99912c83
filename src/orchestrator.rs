//! Orchestrator - only controls WHEN tasks run
//!
//! Tasks are self-contained and know:
//! - Which asset class they read
//! - Where they write
//! - What live-reload action follows them
//!
//! The orchestrator walks a [`TaskGraph`], runs each leaf on the blocking
//! pool and publishes a [`TaskEvent`] when it settles.

use crate::events::{EventBus, Outcome, TaskEvent};
use crate::graph::{run_graph, Executor, TaskGraph};
use crate::tasks::{standard_tasks, BuildContext, Task, TaskId, TaskReport};
use anyhow::{Context as _, Result};
use colored::*;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

pub struct Orchestrator {
    tasks: HashMap<TaskId, Arc<dyn Task>>,
    ctx: Arc<BuildContext>,
    events: EventBus,
}

impl Orchestrator {
    /// Create an orchestrator with no tasks registered
    pub fn new(ctx: BuildContext) -> Self {
        Self { tasks: HashMap::new(), ctx: Arc::new(ctx), events: EventBus::new() }
    }

    /// Create an orchestrator with every standard task registered
    pub fn with_standard_tasks(ctx: BuildContext) -> Self {
        let mut orch = Self::new(ctx);
        for task in standard_tasks() {
            orch.register_task(Arc::from(task));
        }
        orch
    }

    /// Register a task, replacing any task with the same id
    pub fn register_task(&mut self, task: Arc<dyn Task>) {
        tracing::debug!("📦 Registered task: {} (reload: {:?})", task.id(), task.reload());
        self.tasks.insert(task.id(), task);
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Run a single task to completion
    pub async fn run_task(&self, id: TaskId) -> Result<TaskReport> {
        let task = self
            .tasks
            .get(&id)
            .cloned()
            .with_context(|| format!("Task '{}' is not registered", id))?;

        println!("{} {}", "🚀 Running".cyan(), id.to_string().bold());
        let reload = task.reload();
        let ctx = self.ctx.clone();
        let start = Instant::now();
        let result = tokio::task::spawn_blocking(move || task.run(&ctx))
            .await
            .with_context(|| format!("Task '{}' panicked", id))?;
        let elapsed = start.elapsed();

        match result {
            Ok(mut report) => {
                report.duration = elapsed;
                let outcome = report.outcome();
                match outcome {
                    Outcome::Completed => println!(
                        "{} {} completed in {}ms ({} files)",
                        "✅".green(),
                        id,
                        elapsed.as_millis(),
                        report.written.len()
                    ),
                    _ => println!(
                        "{} {} completed with {} error(s) in {}ms",
                        "⚠️ ".yellow(),
                        id,
                        report.errors.len(),
                        elapsed.as_millis()
                    ),
                }
                self.events.publish(TaskEvent {
                    task: id,
                    outcome,
                    written: report.written.clone(),
                    reload,
                });
                Ok(report)
            }
            Err(e) => {
                println!("{} {} failed after {}ms", "❌".red(), id, elapsed.as_millis());
                self.events.publish(TaskEvent { task: id, outcome: Outcome::Failed, written: Vec::new(), reload });
                Err(e)
            }
        }
    }

    /// Run a task graph; the first fatal error aborts it
    pub async fn run(&self, graph: &TaskGraph) -> Result<Vec<TaskReport>> {
        tracing::debug!("running graph {}", graph);
        run_graph(graph, self).await
    }

    /// The full build, followed by a summary
    pub async fn build(&self) -> Result<Vec<TaskReport>> {
        let start = Instant::now();
        let reports = self.run(&TaskGraph::build()).await?;

        let written: usize = reports.iter().map(|r| r.written.len()).sum();
        let errors: Vec<&String> = reports.iter().flat_map(|r| &r.errors).collect();
        println!(
            "\n{} {} tasks, {} files in {}ms",
            "✨ Build finished:".green().bold(),
            reports.len(),
            written,
            start.elapsed().as_millis()
        );
        for error in &errors {
            println!("   {} {}", "⚠️ ".yellow(), error);
        }
        Ok(reports)
    }

    /// Build once, then watch sources and serve the output until the
    /// process is stopped
    pub async fn watch(self: Arc<Self>) -> Result<()> {
        self.build().await?;

        let config = &self.ctx.config;
        let root = self.ctx.resolve(self.ctx.paths.output_root());
        let coordinator = crate::watcher::WatchCoordinator::new(self.clone())?;
        let server = crate::server::start(&config.server.host, config.server.port, root, self.events.clone());

        tokio::try_join!(coordinator.run(), server)?;
        Ok(())
    }
}

impl Executor for Orchestrator {
    fn execute(&self, id: TaskId) -> BoxFuture<'_, Result<TaskReport>> {
        self.run_task(id).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::events::{Reload, ReloadMessage};
    use crate::graph::{parallel, series, task};
    use tempfile::TempDir;

    struct MockTask {
        id: TaskId,
        fail: bool,
        reload: Reload,
    }

    impl MockTask {
        fn ok(id: TaskId) -> Arc<dyn Task> {
            Arc::new(Self { id, fail: false, reload: Reload::None })
        }
    }

    impl Task for MockTask {
        fn id(&self) -> TaskId {
            self.id
        }

        fn reload(&self) -> Reload {
            self.reload
        }

        fn run(&self, _ctx: &BuildContext) -> Result<TaskReport> {
            if self.fail {
                anyhow::bail!("{} exploded", self.id);
            }
            let mut report = TaskReport::new(self.id);
            report.written.push(format!("{}.out", self.id).into());
            Ok(report)
        }
    }

    fn orchestrator(temp: &TempDir) -> Orchestrator {
        Orchestrator::new(BuildContext::new(temp.path(), Config::default()))
    }

    #[tokio::test]
    async fn test_runs_graph_and_reports() {
        let temp = TempDir::new().unwrap();
        let mut orch = orchestrator(&temp);
        for id in [TaskId::Clean, TaskId::Images, TaskId::Webp] {
            orch.register_task(MockTask::ok(id));
        }

        let graph = series([task(TaskId::Clean), parallel([task(TaskId::Images), task(TaskId::Webp)])]);
        let reports = orch.run(&graph).await.unwrap();

        let ids: Vec<_> = reports.iter().map(|r| r.task).collect();
        assert_eq!(ids, vec![TaskId::Clean, TaskId::Images, TaskId::Webp]);
        assert!(reports.iter().all(|r| r.written.len() == 1));
    }

    #[tokio::test]
    async fn test_unregistered_task_fails() {
        let temp = TempDir::new().unwrap();
        let orch = orchestrator(&temp);
        assert!(orch.run_task(TaskId::Fonts).await.is_err());
    }

    #[tokio::test]
    async fn test_failure_still_publishes_event() {
        let temp = TempDir::new().unwrap();
        let mut orch = orchestrator(&temp);
        orch.register_task(Arc::new(MockTask { id: TaskId::Scripts, fail: true, reload: Reload::Always }));
        let mut rx = orch.events().subscribe();

        let err = orch.run_task(TaskId::Scripts).await.unwrap_err();
        assert!(err.to_string().contains("exploded"));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.outcome, Outcome::Failed);
        assert_eq!(event.reload_message(), Some(ReloadMessage::Reload { task: TaskId::Scripts }));
    }

    #[tokio::test]
    async fn test_series_stops_at_failure() {
        let temp = TempDir::new().unwrap();
        let mut orch = orchestrator(&temp);
        orch.register_task(Arc::new(MockTask { id: TaskId::Fonts, fail: true, reload: Reload::None }));
        orch.register_task(MockTask::ok(TaskId::FontsStyle));
        let mut rx = orch.events().subscribe();

        let graph = series([task(TaskId::Fonts), task(TaskId::FontsStyle)]);
        assert!(orch.run(&graph).await.is_err());

        assert_eq!(rx.recv().await.unwrap().task, TaskId::Fonts);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_image_tasks_reload_page() {
        let temp = TempDir::new().unwrap();
        let orch = Orchestrator::with_standard_tasks(BuildContext::new(temp.path(), Config::default()));
        let mut rx = orch.events().subscribe();

        for id in [TaskId::Images, TaskId::Webp] {
            orch.run_task(id).await.unwrap();
            let event = rx.recv().await.unwrap();
            assert_eq!(event.outcome, Outcome::Completed);
            assert_eq!(event.reload_message(), Some(ReloadMessage::Reload { task: id }));
        }
    }

    #[test]
    fn test_standard_registration() {
        let temp = TempDir::new().unwrap();
        let orch = Orchestrator::with_standard_tasks(BuildContext::new(temp.path(), Config::default()));
        assert_eq!(orch.tasks.len(), TaskId::ALL.len());
    }
}
