//! Stylesheets: Sass, media query grouping, WebP backgrounds, prefixing and
//! minification, each output with its own source map.

use super::{BuildContext, Task, TaskId, TaskReport};
use crate::discovery::discover;
use crate::events::Reload;
use crate::paths::AssetClass;
use crate::transform::browsers::BrowserPolicy;
use crate::transform::css::{self, CssOptions};
use crate::transform::media_queries::group_media_queries;
use crate::transform::sass;
use crate::transform::webp_css::rewrite_backgrounds;
use anyhow::Result;
use std::path::Path;

pub struct StylesTask;

impl Task for StylesTask {
    fn id(&self) -> TaskId {
        TaskId::Styles
    }

    fn reload(&self) -> Reload {
        Reload::InjectCss
    }

    fn run(&self, ctx: &BuildContext) -> Result<TaskReport> {
        let mut report = TaskReport::new(TaskId::Styles);
        let output = ctx.output_dir(AssetClass::Styles);
        let policy = BrowserPolicy::from_queries(&ctx.config.styles.browsers)?;

        for source in discover(&ctx.project_root, ctx.paths.get(AssetClass::Styles))? {
            let compiled = match sass::compile(&source.path) {
                Ok(css) => css,
                Err(e) => {
                    // Non-fatal: recorded on the report.
                    tracing::error!("Sass error in {}: {}", source.path.display(), e);
                    report.errors.push(format!("{}: {}", source.relative.display(), e));
                    continue;
                }
            };

            let target = output.join(&source.relative);
            let dir = target.parent().unwrap_or(output.as_path());
            let stem = file_name(target.with_extension("").as_path());
            let source_name = file_name(&source.relative);

            let css_name = format!("{stem}.css");
            // The expanded map points into the compiled Sass output, which it
            // embeds as the content of the `.scss` source.
            let expanded = css::process_with(
                &compiled,
                CssOptions {
                    source_name: &source_name,
                    map_name: &format!("{css_name}.map"),
                    targets: policy.css_targets(),
                    minify: false,
                },
                |rules| {
                    group_media_queries(rules);
                    rewrite_backgrounds(rules);
                },
            )?;
            report.write(&dir.join(&css_name), &expanded.code)?;
            report.write(&dir.join(format!("{css_name}.map")), &expanded.map)?;

            let min_name = format!("{stem}.min.css");
            let minified = css::process(
                &expanded.code,
                CssOptions {
                    source_name: &css_name,
                    map_name: &format!("{min_name}.map"),
                    targets: policy.css_targets(),
                    minify: true,
                },
            )?;
            report.write(&dir.join(&min_name), &minified.code)?;
            report.write(&dir.join(format!("{min_name}.map")), &minified.map)?;
        }

        Ok(report)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::events::Outcome;
    use std::fs;
    use tempfile::TempDir;

    fn project(scss: &str) -> (TempDir, BuildContext) {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/sass")).unwrap();
        fs::write(temp.path().join("src/sass/style.scss"), scss).unwrap();
        let mut config = Config::default();
        config.paths.output = Some("site".into());
        let ctx = BuildContext::new(temp.path(), config);
        (temp, ctx)
    }

    fn read(root: &Path, rel: &str) -> String {
        fs::read_to_string(root.join(rel)).unwrap()
    }

    #[test]
    fn test_writes_four_outputs() {
        let (temp, ctx) = project(
            "@media (min-width: 768px) { .a { color: red; } }\n\
             .hero { background-image: url(\"../img/hero.jpg\"); }\n\
             @media (min-width: 768px) { .b { color: blue; } }\n",
        );

        let report = StylesTask.run(&ctx).unwrap();
        assert_eq!(report.outcome(), Outcome::Completed);
        assert_eq!(report.written.len(), 4);

        let css = read(temp.path(), "site/css/style.css");
        assert!(css.contains("hero.webp"));
        assert!(css.contains(".no-webp .hero"));
        assert_eq!(css.matches("@media").count(), 1);
        assert!(css.ends_with("/*# sourceMappingURL=style.css.map */\n"));

        let min = read(temp.path(), "site/css/style.min.css");
        assert!(min.ends_with("/*# sourceMappingURL=style.min.css.map */\n"));
        assert!(min.len() < css.len());

        let map: serde_json::Value = serde_json::from_str(&read(temp.path(), "site/css/style.css.map")).unwrap();
        assert!(map["sources"][0].as_str().unwrap().ends_with("style.scss"));
        let min_map: serde_json::Value =
            serde_json::from_str(&read(temp.path(), "site/css/style.min.css.map")).unwrap();
        assert!(min_map["sources"][0].as_str().unwrap().ends_with("style.css"));
    }

    #[test]
    fn test_sass_error_is_reported_not_fatal() {
        let (temp, ctx) = project(".a { color: ; ");

        let report = StylesTask.run(&ctx).unwrap();
        assert_eq!(report.outcome(), Outcome::CompletedWithErrors);
        assert!(report.written.is_empty());
        assert!(!temp.path().join("site/css/style.css").exists());
    }

    #[test]
    fn test_missing_entry_is_noop() {
        let temp = TempDir::new().unwrap();
        let report = StylesTask.run(&BuildContext::new(temp.path(), Config::default())).unwrap();
        assert!(report.written.is_empty());
        assert!(report.errors.is_empty());
    }
}
