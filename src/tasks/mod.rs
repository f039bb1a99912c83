//! Transformation tasks, one per asset class, plus output cleanup.
//!
//! Tasks are self-contained: each knows which asset class it reads, where it
//! writes, and what live-reload action follows it. The orchestrator only
//! decides when they run.

pub mod clean;
pub mod font_style;
pub mod fonts;
pub mod images;
pub mod markup;
pub mod scripts;
pub mod styles;
pub mod webp;

use crate::config::Config;
use crate::events::{Outcome, Reload};
use crate::paths::{AssetClass, PathConfig};
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub use clean::CleanTask;
pub use font_style::FontStyleTask;
pub use fonts::FontsTask;
pub use images::ImagesTask;
pub use markup::MarkupTask;
pub use scripts::ScriptsTask;
pub use styles::StylesTask;
pub use webp::WebpTask;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskId {
    Clean,
    Fonts,
    FontsStyle,
    Images,
    Webp,
    Scripts,
    Styles,
    Html,
}

impl TaskId {
    pub const ALL: [TaskId; 8] = [
        TaskId::Clean,
        TaskId::Fonts,
        TaskId::FontsStyle,
        TaskId::Images,
        TaskId::Webp,
        TaskId::Scripts,
        TaskId::Styles,
        TaskId::Html,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskId::Clean => "clean",
            TaskId::Fonts => "fonts",
            TaskId::FontsStyle => "fonts-style",
            TaskId::Images => "images",
            TaskId::Webp => "webp",
            TaskId::Scripts => "scripts",
            TaskId::Styles => "styles",
            TaskId::Html => "html",
        }
    }

    /// Asset class the task reads; `clean` has none.
    pub fn class(&self) -> Option<AssetClass> {
        match self {
            TaskId::Clean => None,
            TaskId::Fonts => Some(AssetClass::Fonts),
            TaskId::FontsStyle => Some(AssetClass::FontStyleSheet),
            TaskId::Images => Some(AssetClass::RasterImages),
            TaskId::Webp => Some(AssetClass::NextGenImages),
            TaskId::Scripts => Some(AssetClass::Scripts),
            TaskId::Styles => Some(AssetClass::Styles),
            TaskId::Html => Some(AssetClass::Markup),
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        TaskId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown task: {}", s))
    }
}

/// Everything a task needs; built once and shared read-only.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub project_root: PathBuf,
    pub config: Arc<Config>,
    pub paths: PathConfig,
}

impl BuildContext {
    pub fn new(project_root: impl Into<PathBuf>, config: Config) -> Self {
        let project_root = project_root.into();
        let paths = config.path_config(&project_root);
        Self { project_root, config: Arc::new(config), paths }
    }

    /// Join a project-relative path onto the project root.
    pub fn resolve(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.project_root.join(rel)
    }

    /// Absolute output directory of an asset class.
    pub fn output_dir(&self, class: AssetClass) -> PathBuf {
        self.resolve(&self.paths.get(class).output)
    }
}

/// Result of one task run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
    pub task: TaskId,
    pub written: Vec<PathBuf>,
    /// Non-fatal errors; the task still completed.
    pub errors: Vec<String>,
    pub duration: Duration,
}

impl TaskReport {
    pub fn new(task: TaskId) -> Self {
        Self { task, written: Vec::new(), errors: Vec::new(), duration: Duration::ZERO }
    }

    pub fn outcome(&self) -> Outcome {
        if self.errors.is_empty() {
            Outcome::Completed
        } else {
            Outcome::CompletedWithErrors
        }
    }

    /// Write `contents` to `path`, creating parent directories, and record it.
    pub fn write(&mut self, path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
        write_file(path, contents.as_ref())?;
        self.written.push(path.to_path_buf());
        Ok(())
    }
}

pub(crate) fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

/// A unit of the build graph.
pub trait Task: Send + Sync {
    fn id(&self) -> TaskId;

    /// Live-reload action after this task
    fn reload(&self) -> Reload {
        Reload::None
    }

    /// Run to completion on the calling thread.
    fn run(&self, ctx: &BuildContext) -> Result<TaskReport>;
}

/// The standard task set, one instance per [`TaskId`].
pub fn standard_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(CleanTask),
        Box::new(FontsTask),
        Box::new(FontStyleTask),
        Box::new(ImagesTask),
        Box::new(WebpTask),
        Box::new(ScriptsTask),
        Box::new(StylesTask),
        Box::new(MarkupTask),
    ]
}
