//! Generate the Sass font registry from the converted fonts.
//!
//! The registry is only generated when it is missing or empty, so hand
//! edits survive later builds.

use super::{BuildContext, Task, TaskId, TaskReport};
use anyhow::{Context as _, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub struct FontStyleTask;

impl Task for FontStyleTask {
    fn id(&self) -> TaskId {
        TaskId::FontsStyle
    }

    fn run(&self, ctx: &BuildContext) -> Result<TaskReport> {
        let mut report = TaskReport::new(TaskId::FontsStyle);
        let registry = ctx.resolve(ctx.paths.font_registry());

        if registry_has_content(&registry)? {
            tracing::debug!("{} already populated, leaving it alone", registry.display());
            return Ok(report);
        }

        let names = list_font_files(&ctx.resolve(ctx.paths.font_output_dir()))?;
        report.write(&registry, render_registry(&names))?;
        tracing::info!("generated {} ({} entries)", registry.display(), names.len());
        Ok(report)
    }
}

fn registry_has_content(path: &Path) -> Result<bool> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.len() > 0),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to inspect {}", path.display())),
    }
}

/// Entry names in `dir`, sorted. A missing directory lists nothing.
fn list_font_files(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("Failed to list {}", dir.display())),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

/// One `@include font(...)` line per family, skipping a family equal to the
/// one immediately before it. Families that reappear non-consecutively are
/// emitted again.
pub fn render_registry(file_names: &[String]) -> String {
    let mut out = String::new();
    let mut previous: Option<&str> = None;

    for name in file_names {
        let family = name.split('.').next().unwrap_or(name);
        if previous == Some(family) {
            continue;
        }
        out.push_str(&format!("@include font(\"{0}\", \"{0}\", \"400\", \"normal\");\r\n", family));
        previous = Some(family);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_consecutive_duplicates_only() {
        let out = render_registry(&names(&[
            "OpenSans.woff",
            "OpenSans.woff2",
            "Roboto-Bold.woff",
            "Roboto-Bold.woff2",
            "Roboto-Regular.woff",
        ]));
        assert_eq!(
            out,
            "@include font(\"OpenSans\", \"OpenSans\", \"400\", \"normal\");\r\n\
             @include font(\"Roboto-Bold\", \"Roboto-Bold\", \"400\", \"normal\");\r\n\
             @include font(\"Roboto-Regular\", \"Roboto-Regular\", \"400\", \"normal\");\r\n"
        );

        let listed = render_registry(&names(&["Roboto-Regular.woff", "Roboto-Bold.woff", "OpenSans.woff"]));
        let families: Vec<_> = listed.lines().map(|l| l.split('"').nth(1).unwrap()).collect();
        assert_eq!(families, vec!["Roboto-Regular", "Roboto-Bold", "OpenSans"]);

        let interleaved = render_registry(&names(&["a.woff", "b.woff", "a.woff2"]));
        assert_eq!(interleaved.lines().count(), 3);
    }

    #[test]
    fn test_guard_keeps_existing_registry() {
        let temp = TempDir::new().unwrap();
        let ctx = BuildContext::new(temp.path(), Config::default());
        let registry = ctx.resolve(ctx.paths.font_registry());
        fs::create_dir_all(registry.parent().unwrap()).unwrap();
        fs::write(&registry, "// custom\n").unwrap();

        let fonts = ctx.resolve(ctx.paths.font_output_dir());
        fs::create_dir_all(&fonts).unwrap();
        fs::write(fonts.join("Roboto.woff"), "x").unwrap();

        let report = FontStyleTask.run(&ctx).unwrap();
        assert!(report.written.is_empty());
        assert_eq!(fs::read_to_string(&registry).unwrap(), "// custom\n");
    }

    #[test]
    fn test_generates_when_empty() {
        let temp = TempDir::new().unwrap();
        let ctx = BuildContext::new(temp.path(), Config::default());
        let registry = ctx.resolve(ctx.paths.font_registry());
        fs::create_dir_all(registry.parent().unwrap()).unwrap();
        fs::write(&registry, "").unwrap();

        let fonts = ctx.resolve(ctx.paths.font_output_dir());
        fs::create_dir_all(&fonts).unwrap();
        fs::write(fonts.join("Lato.woff"), "x").unwrap();
        fs::write(fonts.join("Lato.woff2"), "x").unwrap();

        FontStyleTask.run(&ctx).unwrap();
        assert_eq!(
            fs::read_to_string(&registry).unwrap(),
            "@include font(\"Lato\", \"Lato\", \"400\", \"normal\");\r\n"
        );
    }

    #[test]
    fn test_missing_fonts_dir_writes_empty_registry() {
        let temp = TempDir::new().unwrap();
        let ctx = BuildContext::new(temp.path(), Config::default());

        FontStyleTask.run(&ctx).unwrap();
        assert_eq!(fs::read_to_string(ctx.resolve(ctx.paths.font_registry())).unwrap(), "");
    }
}
