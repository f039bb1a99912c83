//! Image recompression.

use super::{BuildContext, Task, TaskId, TaskReport};
use crate::discovery::{discover, SourceFile};
use crate::events::Reload;
use crate::paths::AssetClass;
use crate::transform::raster::{keep_if_smaller, recompress_jpeg, recompress_png};
use crate::transform::svg::minify_svg;
use anyhow::{Context as _, Result};
use std::fs;
use std::path::Path;

pub struct ImagesTask;

/// Lower-cased extension of `path`.
pub(crate) fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

impl Task for ImagesTask {
    fn id(&self) -> TaskId {
        TaskId::Images
    }

    fn reload(&self) -> Reload {
        Reload::OnSuccess
    }

    fn run(&self, ctx: &BuildContext) -> Result<TaskReport> {
        let mut report = TaskReport::new(TaskId::Images);
        let output = ctx.output_dir(AssetClass::RasterImages);
        let mut saved = 0usize;

        for source in discover(&ctx.project_root, ctx.paths.get(AssetClass::RasterImages))? {
            let original = fs::read(&source.path)
                .with_context(|| format!("Failed to read {}", source.path.display()))?;
            let optimized = optimize(ctx, &source, &original)?;

            let bytes = match optimized {
                Some(smaller) => {
                    saved += original.len() - smaller.len();
                    tracing::info!(
                        "{}: {} -> {} bytes (-{:.1}%)",
                        source.relative.display(),
                        original.len(),
                        smaller.len(),
                        100.0 * (original.len() - smaller.len()) as f64 / original.len() as f64
                    );
                    smaller
                }
                None => original,
            };
            report.write(&output.join(&source.relative), &bytes)?;
        }

        if !report.written.is_empty() {
            tracing::info!("images: {} files, {} bytes saved", report.written.len(), saved);
        }
        Ok(report)
    }
}

/// A smaller encoding of `original`, or `None` to copy it as is.
fn optimize(ctx: &BuildContext, source: &SourceFile, original: &[u8]) -> Result<Option<Vec<u8>>> {
    let candidate = match extension(&source.path).as_str() {
        "jpg" | "jpeg" => recompress_jpeg(original, ctx.config.images.jpeg_quality),
        "png" => recompress_png(original),
        "svg" => {
            let text = String::from_utf8_lossy(original);
            Ok(minify_svg(&text).into_bytes())
        }
        _ => return Ok(None),
    }
    .with_context(|| format!("Failed to optimize {}", source.path.display()))?;

    Ok(keep_if_smaller(original, candidate))
}
