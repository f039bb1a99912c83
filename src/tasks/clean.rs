//! Remove the output root.

use super::{BuildContext, Task, TaskId, TaskReport};
use anyhow::{Context as _, Result};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CleanError {
    #[error("refusing to remove {target}: it contains {protected}")]
    Protected { target: PathBuf, protected: PathBuf },
}

pub struct CleanTask;

impl Task for CleanTask {
    fn id(&self) -> TaskId {
        TaskId::Clean
    }

    fn run(&self, ctx: &BuildContext) -> Result<TaskReport> {
        let report = TaskReport::new(TaskId::Clean);
        let target = ctx.resolve(ctx.paths.clean_target());
        if !target.exists() {
            tracing::debug!("nothing to clean at {}", target.display());
            return Ok(report);
        }

        let target = canonical(&target);
        let project = canonical(&ctx.project_root);
        let source = project.join(ctx.paths.source_root());
        for protected in [&project, &source] {
            if protected.starts_with(&target) {
                return Err(CleanError::Protected { target, protected: protected.clone() }.into());
            }
        }

        fs::remove_dir_all(&target)
            .with_context(|| format!("Failed to remove {}", target.display()))?;
        tracing::info!("removed {}", target.display());
        Ok(report)
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn context(root: &Path, output: &str) -> BuildContext {
        let mut config = Config::default();
        config.paths.output = Some(output.to_string());
        BuildContext::new(root, config)
    }

    #[test]
    fn test_removes_output() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("site/css")).unwrap();
        fs::write(temp.path().join("site/css/old.css"), "x").unwrap();

        CleanTask.run(&context(temp.path(), "site")).unwrap();
        assert!(!temp.path().join("site").exists());
    }

    #[test]
    fn test_missing_output_is_noop() {
        let temp = TempDir::new().unwrap();
        let report = CleanTask.run(&context(temp.path(), "site")).unwrap();
        assert!(report.written.is_empty());
    }

    #[test]
    fn test_refuses_project_root() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();

        let err = CleanTask.run(&context(temp.path(), ".")).unwrap_err();
        assert!(err.downcast_ref::<CleanError>().is_some());
        assert!(temp.path().join("src").exists());
    }
}
