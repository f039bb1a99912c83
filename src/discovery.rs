//! Source discovery: expand an asset class's glob patterns against the
//! project tree.

use crate::paths::{glob_base, AssetPaths};
use anyhow::{Context as _, Result};
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A matched source file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceFile {
    /// Absolute (project-joined) path
    pub path: PathBuf,
    /// Path relative to the glob base of the pattern that matched it
    pub relative: PathBuf,
}

/// Compile a single pattern; `*` never crosses a `/`.
pub fn compile_glob(pattern: &str) -> Result<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("Invalid glob pattern: {}", pattern))
}

fn compile_set<'a>(patterns: impl Iterator<Item = &'a str>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(compile_glob(pattern)?);
    }
    builder.build().context("Failed to build glob set")
}

/// Find every file under `project_root` matched by the asset's include
/// patterns and by none of its exclusions. Results are sorted by path.
/// A missing base directory yields an empty list.
pub fn discover(project_root: &Path, paths: &AssetPaths) -> Result<Vec<SourceFile>> {
    discover_patterns(project_root, &paths.sources)
}

/// Same as [`discover`] for a raw pattern list.
pub fn discover_patterns(project_root: &Path, patterns: &[String]) -> Result<Vec<SourceFile>> {
    let excludes = compile_set(patterns.iter().filter_map(|p| p.strip_prefix('!')))?;
    let mut found = Vec::new();

    for pattern in patterns.iter().filter(|p| !p.starts_with('!')) {
        let matcher = compile_glob(pattern)?.compile_matcher();
        let base = glob_base(pattern);
        let root = project_root.join(&base);
        if !root.is_dir() {
            tracing::debug!("skipping {}: {} does not exist", pattern, root.display());
            continue;
        }

        for entry in WalkDir::new(&root).follow_links(true) {
            let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel_to_project) = entry.path().strip_prefix(project_root) else {
                continue;
            };
            let candidate = to_slash(rel_to_project);
            if !matcher.is_match(&candidate) || excludes.is_match(&candidate) {
                continue;
            }
            let relative = rel_to_project
                .strip_prefix(&base)
                .unwrap_or(rel_to_project)
                .to_path_buf();
            found.push(SourceFile { path: entry.path().to_path_buf(), relative });
        }
    }

    found.sort();
    found.dedup_by(|a, b| a.path == b.path);
    Ok(found)
}

/// Render a relative path with `/` separators for glob matching.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::{AssetClass, PathConfig};
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_markup_excludes_partials() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "src/index.html");
        touch(temp.path(), "src/about.html");
        touch(temp.path(), "src/_header.html");
        touch(temp.path(), "src/parts/nested.html");

        let paths = PathConfig::resolve("src", "site");
        let files = discover(temp.path(), paths.get(AssetClass::Markup)).unwrap();
        let names: Vec<_> = files.iter().map(|f| to_slash(&f.relative)).collect();

        assert_eq!(names, vec!["about.html", "index.html"]);
    }

    #[test]
    fn test_images_keep_subdirectories() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "src/img/logo.png");
        touch(temp.path(), "src/img/icons/arrow.svg");
        touch(temp.path(), "src/img/notes.txt");

        let paths = PathConfig::resolve("src", "site");
        let files = discover(temp.path(), paths.get(AssetClass::RasterImages)).unwrap();
        let names: Vec<_> = files.iter().map(|f| to_slash(&f.relative)).collect();

        assert_eq!(names, vec!["icons/arrow.svg", "logo.png"]);
    }

    #[test]
    fn test_missing_base_is_empty() {
        let temp = TempDir::new().unwrap();
        let paths = PathConfig::resolve("src", "site");

        assert!(discover(temp.path(), paths.get(AssetClass::Fonts)).unwrap().is_empty());
        assert!(discover(temp.path(), paths.get(AssetClass::Scripts)).unwrap().is_empty());
    }

    #[test]
    fn test_literal_pattern() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "src/sass/style.scss");
        touch(temp.path(), "src/sass/_vars.scss");

        let paths = PathConfig::resolve("src", "site");
        let files = discover(temp.path(), paths.get(AssetClass::Styles)).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative, PathBuf::from("style.scss"));
    }
}
