//! Typed task graph and its generic runner.
//!
//! `Series` is a hard barrier between its children; `Parallel` starts all
//! children together and settles once every child has settled.

use crate::tasks::{TaskId, TaskReport};
use anyhow::Result;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskGraph {
    Task(TaskId),
    Series(Vec<TaskGraph>),
    Parallel(Vec<TaskGraph>),
}

pub fn task(id: TaskId) -> TaskGraph {
    TaskGraph::Task(id)
}

pub fn series(children: impl IntoIterator<Item = TaskGraph>) -> TaskGraph {
    TaskGraph::Series(children.into_iter().collect())
}

pub fn parallel(children: impl IntoIterator<Item = TaskGraph>) -> TaskGraph {
    TaskGraph::Parallel(children.into_iter().collect())
}

impl TaskGraph {
    /// `clean → fonts → fonts-style → (images ∥ webp) → (scripts ∥ styles ∥ html)`
    pub fn build() -> Self {
        series([
            task(TaskId::Clean),
            task(TaskId::Fonts),
            task(TaskId::FontsStyle),
            parallel([task(TaskId::Images), task(TaskId::Webp)]),
            parallel([task(TaskId::Scripts), task(TaskId::Styles), task(TaskId::Html)]),
        ])
    }

    /// Leaf tasks in declaration order.
    pub fn tasks(&self) -> Vec<TaskId> {
        let mut out = Vec::new();
        self.collect_tasks(&mut out);
        out
    }

    fn collect_tasks(&self, out: &mut Vec<TaskId>) {
        match self {
            TaskGraph::Task(id) => out.push(*id),
            TaskGraph::Series(children) | TaskGraph::Parallel(children) => {
                children.iter().for_each(|c| c.collect_tasks(out))
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[TaskGraph], sep: &str) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", child)?;
    }
    Ok(())
}

impl fmt::Display for TaskGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskGraph::Task(id) => write!(f, "{}", id),
            TaskGraph::Series(children) => write_joined(f, children, " → "),
            TaskGraph::Parallel(children) => {
                f.write_str("(")?;
                write_joined(f, children, " ∥ ")?;
                f.write_str(")")
            }
        }
    }
}

/// Runs a single leaf; the returned future resolves when the task is done.
pub trait Executor: Send + Sync {
    fn execute(&self, id: TaskId) -> BoxFuture<'_, Result<TaskReport>>;
}

/// Execute `graph`, returning the reports of every task that ran, in
/// completion-group order. The first fatal error aborts the remaining
/// `Series` steps; a `Parallel` group waits for all its members first.
pub fn run_graph<'a, E>(graph: &'a TaskGraph, executor: &'a E) -> BoxFuture<'a, Result<Vec<TaskReport>>>
where
    E: Executor + ?Sized,
{
    async move {
        match graph {
            TaskGraph::Task(id) => Ok(vec![executor.execute(*id).await?]),
            TaskGraph::Series(children) => {
                let mut reports = Vec::new();
                for child in children {
                    reports.extend(run_graph(child, executor).await?);
                }
                Ok(reports)
            }
            TaskGraph::Parallel(children) => {
                let results = join_all(children.iter().map(|c| run_graph(c, executor))).await;
                let mut reports = Vec::new();
                for result in results {
                    reports.extend(result?);
                }
                Ok(reports)
            }
        }
    }
    .boxed()
}
