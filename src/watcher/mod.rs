//! Watch mode: map source changes to the tasks that rebuild them.

pub mod detector;

use crate::discovery::{compile_glob, discover_patterns, to_slash};
use crate::orchestrator::Orchestrator;
use crate::paths::AssetClass;
use crate::tasks::TaskId;
use anyhow::{Context as _, Result};
use colored::*;
use detector::{FileChange, FileWatcher};
use globset::GlobMatcher;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// A watch glob bound to the task it triggers.
#[derive(Debug, Clone)]
pub struct Binding {
    pub pattern: String,
    pub task: TaskId,
    /// Fire once at startup when the glob matches an existing file
    pub initial: bool,
    matcher: GlobMatcher,
}

impl Binding {
    fn new(pattern: &str, task: TaskId, initial: bool) -> Result<Self> {
        let matcher = compile_glob(pattern)?.compile_matcher();
        Ok(Self { pattern: pattern.to_string(), task, initial, matcher })
    }

    /// `rel` is a project-relative path with `/` separators.
    pub fn matches(&self, rel: &str) -> bool {
        self.matcher.is_match(rel)
    }
}

pub struct WatchCoordinator {
    orchestrator: Arc<Orchestrator>,
    bindings: Vec<Binding>,
}

impl WatchCoordinator {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Result<Self> {
        let paths = &orchestrator.context().paths;
        let mut bindings = Vec::new();
        for (class, task, initial) in [
            (AssetClass::Markup, TaskId::Html, true),
            (AssetClass::Styles, TaskId::Styles, true),
            (AssetClass::Scripts, TaskId::Scripts, true),
            (AssetClass::RasterImages, TaskId::Images, false),
            (AssetClass::NextGenImages, TaskId::Webp, false),
        ] {
            if let Some(pattern) = &paths.get(class).watch {
                bindings.push(Binding::new(pattern, task, initial)?);
            }
        }
        Ok(Self { orchestrator, bindings })
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Tasks triggered by a batch of changed paths, deduplicated, in
    /// binding order.
    pub fn tasks_for(&self, paths: &[PathBuf]) -> Vec<TaskId> {
        let project_root = &self.orchestrator.context().project_root;
        let canonical_root = project_root.canonicalize().ok();
        let relative: Vec<String> = paths
            .iter()
            .filter_map(|p| relative_to(p, project_root, canonical_root.as_deref()))
            .collect();

        let mut tasks = Vec::new();
        for binding in &self.bindings {
            if tasks.contains(&binding.task) {
                continue;
            }
            if relative.iter().any(|rel| binding.matches(rel)) {
                tasks.push(binding.task);
            }
        }
        tasks
    }

    /// Tasks whose bindings fire on the initial scan.
    pub fn initial_tasks(&self) -> Result<Vec<TaskId>> {
        let project_root = &self.orchestrator.context().project_root;
        let mut tasks = Vec::new();
        for binding in self.bindings.iter().filter(|b| b.initial) {
            if tasks.contains(&binding.task) {
                continue;
            }
            if !discover_patterns(project_root, std::slice::from_ref(&binding.pattern))?.is_empty() {
                tasks.push(binding.task);
            }
        }
        Ok(tasks)
    }

    /// Watch the source root until the process is stopped.
    pub async fn run(self) -> Result<()> {
        let ctx = self.orchestrator.context();
        let source_root = ctx.resolve(ctx.paths.source_root());
        let debounce = Duration::from_millis(ctx.config.watch.debounce_ms);

        let (mut watcher, mut rx) = FileWatcher::new(debounce)?;
        watcher
            .watch(&source_root)
            .with_context(|| format!("Cannot watch source root {}", source_root.display()))?;
        println!("{} {}", "👁️  Watching".bright_cyan().bold(), source_root.display());

        self.run_tasks(&self.initial_tasks()?).await;

        while let Some(batch) = rx.recv().await {
            let paths: Vec<PathBuf> = batch.into_iter().map(|FileChange { path, .. }| path).collect();
            let tasks = self.tasks_for(&paths);
            if tasks.is_empty() {
                continue;
            }
            tracing::debug!("{} change(s) -> {:?}", paths.len(), tasks);
            self.run_tasks(&tasks).await;
        }

        watcher.stop();
        Ok(())
    }

    /// Run tasks one after another; failures are logged and watching
    /// continues.
    async fn run_tasks(&self, tasks: &[TaskId]) {
        for &task in tasks {
            if let Err(e) = self.orchestrator.run_task(task).await {
                tracing::error!("{} failed: {:#}", task, e);
            }
        }
    }
}

fn relative_to(path: &Path, root: &Path, canonical_root: Option<&Path>) -> Option<String> {
    let rel = path
        .strip_prefix(root)
        .ok()
        .or_else(|| canonical_root.and_then(|c| path.strip_prefix(c).ok()))?;
    Some(to_slash(rel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::tasks::BuildContext;
    use std::fs;
    use tempfile::TempDir;

    fn coordinator(root: &Path) -> WatchCoordinator {
        let orch = Orchestrator::new(BuildContext::new(root, Config::default()));
        WatchCoordinator::new(Arc::new(orch)).unwrap()
    }

    #[test]
    fn test_binding_order() {
        let temp = TempDir::new().unwrap();
        let watch = coordinator(temp.path());
        let tasks: Vec<_> = watch.bindings().iter().map(|b| (b.task, b.initial)).collect();
        assert_eq!(
            tasks,
            vec![
                (TaskId::Html, true),
                (TaskId::Styles, true),
                (TaskId::Scripts, true),
                (TaskId::Images, false),
                (TaskId::Webp, false),
            ]
        );
    }

    #[test]
    fn test_tasks_for_changes() {
        let temp = TempDir::new().unwrap();
        let watch = coordinator(temp.path());
        let root = temp.path();

        assert_eq!(watch.tasks_for(&[root.join("src/_header.html")]), vec![TaskId::Html]);
        assert_eq!(watch.tasks_for(&[root.join("src/sass/blocks/_nav.scss")]), vec![TaskId::Styles]);
        assert_eq!(
            watch.tasks_for(&[root.join("src/img/a.png"), root.join("src/js/app/menu.js")]),
            vec![TaskId::Scripts, TaskId::Images, TaskId::Webp]
        );
        assert_eq!(
            watch.tasks_for(&[root.join("src/index.html"), root.join("src/about.html")]),
            vec![TaskId::Html]
        );
        assert!(watch.tasks_for(&[root.join("src/fonts/a.ttf"), PathBuf::from("/elsewhere/x.html")]).is_empty());
    }

    #[test]
    fn test_initial_scan_ignores_images() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/img")).unwrap();
        fs::create_dir_all(temp.path().join("src/sass")).unwrap();
        fs::write(temp.path().join("src/img/a.png"), "x").unwrap();
        fs::write(temp.path().join("src/sass/style.scss"), "").unwrap();

        let watch = coordinator(temp.path());
        assert_eq!(watch.initial_tasks().unwrap(), vec![TaskId::Styles]);
    }
}
