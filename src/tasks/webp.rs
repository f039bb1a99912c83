//! WebP variants of JPEG and PNG images.

use super::images::extension;
use super::{BuildContext, Task, TaskId, TaskReport};
use crate::discovery::discover;
use crate::events::Reload;
use crate::paths::AssetClass;
use crate::transform::raster::to_webp;
use anyhow::{Context as _, Result};
use std::fs;

pub struct WebpTask;

impl Task for WebpTask {
    fn id(&self) -> TaskId {
        TaskId::Webp
    }

    fn reload(&self) -> Reload {
        Reload::OnSuccess
    }

    fn run(&self, ctx: &BuildContext) -> Result<TaskReport> {
        let mut report = TaskReport::new(TaskId::Webp);
        let output = ctx.output_dir(AssetClass::NextGenImages);
        let quality = ctx.config.images.webp_quality;

        for source in discover(&ctx.project_root, ctx.paths.get(AssetClass::NextGenImages))? {
            // Source .webp files are copied by the images task.
            if !matches!(extension(&source.path).as_str(), "jpg" | "jpeg" | "png") {
                continue;
            }

            let bytes = fs::read(&source.path)
                .with_context(|| format!("Failed to read {}", source.path.display()))?;
            let webp = to_webp(&bytes, quality)
                .with_context(|| format!("Failed to convert {} to WebP", source.path.display()))?;
            report.write(&output.join(&source.relative).with_extension("webp"), &webp)?;
        }

        Ok(report)
    }
}
