//! TrueType fonts to WOFF and WOFF2.

use super::{BuildContext, Task, TaskId, TaskReport};
use crate::discovery::discover;
use crate::paths::AssetClass;
use crate::transform::woff::{to_woff, to_woff2};
use anyhow::{Context as _, Result};
use std::fs;

pub struct FontsTask;

impl Task for FontsTask {
    fn id(&self) -> TaskId {
        TaskId::Fonts
    }

    fn run(&self, ctx: &BuildContext) -> Result<TaskReport> {
        let mut report = TaskReport::new(TaskId::Fonts);
        let output = ctx.output_dir(AssetClass::Fonts);

        for source in discover(&ctx.project_root, ctx.paths.get(AssetClass::Fonts))? {
            let bytes = fs::read(&source.path)
                .with_context(|| format!("Failed to read {}", source.path.display()))?;

            let woff = to_woff(&bytes)
                .with_context(|| format!("Failed to convert {} to WOFF", source.path.display()))?;
            let woff2 = to_woff2(&bytes)
                .with_context(|| format!("Failed to convert {} to WOFF2", source.path.display()))?;

            let base = output.join(&source.relative);
            report.write(&base.with_extension("woff"), &woff)?;
            report.write(&base.with_extension("woff2"), &woff2)?;
            tracing::debug!(
                "{}: {} bytes -> woff {} / woff2 {}",
                source.relative.display(),
                bytes.len(),
                woff.len(),
                woff2.len()
            );
        }

        Ok(report)
    }
}
