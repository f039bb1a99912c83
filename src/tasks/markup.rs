//! HTML pages: includes expanded, raster images wrapped for WebP.

use super::{BuildContext, Task, TaskId, TaskReport};
use crate::discovery::discover;
use crate::events::Reload;
use crate::paths::AssetClass;
use crate::transform::include::expand_file;
use crate::transform::picture::wrap_images;
use anyhow::{Context as _, Result};

pub struct MarkupTask;

impl Task for MarkupTask {
    fn id(&self) -> TaskId {
        TaskId::Html
    }

    fn reload(&self) -> Reload {
        Reload::OnSuccess
    }

    fn run(&self, ctx: &BuildContext) -> Result<TaskReport> {
        let mut report = TaskReport::new(TaskId::Html);
        let output = ctx.output_dir(AssetClass::Markup);

        for source in discover(&ctx.project_root, ctx.paths.get(AssetClass::Markup))? {
            let expanded = expand_file(&source.path)
                .with_context(|| format!("Failed to process {}", source.path.display()))?;
            report.write(&output.join(&source.relative), wrap_images(&expanded))?;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_partials_are_included_not_emitted() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("_header.html"), "<h1>@@title</h1>").unwrap();
        fs::write(
            src.join("index.html"),
            "<body>@@include('_header.html', {\"title\": \"Home\"})<img src=\"img/a.png\"></body>",
        )
        .unwrap();

        let mut config = Config::default();
        config.paths.output = Some("site".into());
        let report = MarkupTask.run(&BuildContext::new(temp.path(), config)).unwrap();

        assert_eq!(report.written, vec![temp.path().join("site/index.html")]);
        assert!(!temp.path().join("site/_header.html").exists());
        assert_eq!(
            fs::read_to_string(temp.path().join("site/index.html")).unwrap(),
            "<body><h1>Home</h1><picture><source srcset=\"img/a.webp\" type=\"image/webp\">\
             <img src=\"img/a.png\"></picture></body>"
        );
    }

    #[test]
    fn test_missing_include_is_fatal() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/index.html"), "@@include('nope.html')").unwrap();

        let err = MarkupTask.run(&BuildContext::new(temp.path(), Config::default())).unwrap_err();
        assert!(err.to_string().contains("index.html"));
    }
}
