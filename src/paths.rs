//! Path resolution for every asset class.
//!
//! All source, output and watch patterns are derived from two root names:
//! the source root (`src` by default) and the output root (by default the
//! name of the project directory). Patterns are relative to the project root
//! and use `/` separators; a leading `!` marks an exclusion.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// File name of the generated font registry inside `<source>/sass/fonts/`.
pub const FONT_REGISTRY: &str = "fonts.scss";

/// Extensions picked up by both image pipelines.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "svg", "gif", "ico", "webp"];

/// Category of source file with its own transformation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetClass {
    Markup,
    Styles,
    Scripts,
    RasterImages,
    NextGenImages,
    Fonts,
    FontStyleSheet,
}

impl AssetClass {
    pub const ALL: [AssetClass; 7] = [
        AssetClass::Markup,
        AssetClass::Styles,
        AssetClass::Scripts,
        AssetClass::RasterImages,
        AssetClass::NextGenImages,
        AssetClass::Fonts,
        AssetClass::FontStyleSheet,
    ];
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetClass::Markup => "markup",
            AssetClass::Styles => "styles",
            AssetClass::Scripts => "scripts",
            AssetClass::RasterImages => "raster-images",
            AssetClass::NextGenImages => "next-gen-images",
            AssetClass::Fonts => "fonts",
            AssetClass::FontStyleSheet => "font-style-sheet",
        };
        f.write_str(name)
    }
}

/// Source globs, output directory and optional watch glob of one asset class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetPaths {
    /// Glob patterns relative to the project root; `!` prefixes exclude.
    pub sources: Vec<String>,
    /// Output directory relative to the project root.
    pub output: PathBuf,
    /// Glob that triggers a rebuild in watch mode.
    pub watch: Option<String>,
}

impl AssetPaths {
    /// Patterns without the `!` prefix.
    pub fn includes(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(String::as_str).filter(|p| !p.starts_with('!'))
    }

    /// Exclusion patterns with the `!` prefix stripped.
    pub fn excludes(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().filter_map(|p| p.strip_prefix('!'))
    }
}

/// Immutable path table for a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathConfig {
    source_root: String,
    output_root: String,
    markup: AssetPaths,
    styles: AssetPaths,
    scripts: AssetPaths,
    raster_images: AssetPaths,
    next_gen_images: AssetPaths,
    fonts: AssetPaths,
    font_style_sheet: AssetPaths,
}

impl PathConfig {
    /// Derive every asset pattern from the two root names.
    pub fn resolve(source_root: &str, output_root: &str) -> Self {
        let src = source_root.trim_end_matches('/');
        let out = output_root.trim_end_matches('/');
        let images = format!("{src}/img/**/*.{{{}}}", IMAGE_EXTENSIONS.join(","));

        Self {
            source_root: src.to_string(),
            output_root: out.to_string(),
            markup: AssetPaths {
                sources: vec![format!("{src}/*.html"), format!("!{src}/_*.html")],
                output: PathBuf::from(out),
                watch: Some(format!("{src}/**/*.html")),
            },
            styles: AssetPaths {
                sources: vec![format!("{src}/sass/style.scss")],
                output: Path::new(out).join("css"),
                watch: Some(format!("{src}/sass/**/*.{{scss,sass}}")),
            },
            scripts: AssetPaths {
                sources: vec![format!("{src}/js/script.js")],
                output: Path::new(out).join("js"),
                watch: Some(format!("{src}/js/**/*.js")),
            },
            raster_images: AssetPaths {
                sources: vec![images.clone()],
                output: Path::new(out).join("img"),
                watch: Some(images.clone()),
            },
            next_gen_images: AssetPaths {
                sources: vec![images.clone()],
                output: Path::new(out).join("img"),
                watch: Some(images),
            },
            fonts: AssetPaths {
                sources: vec![format!("{src}/fonts/*.ttf")],
                output: Path::new(out).join("fonts"),
                watch: None,
            },
            font_style_sheet: AssetPaths {
                sources: vec![format!("{out}/fonts/*")],
                output: Path::new(src).join("sass").join("fonts"),
                watch: None,
            },
        }
    }

    pub fn source_root(&self) -> &str {
        &self.source_root
    }

    pub fn output_root(&self) -> &str {
        &self.output_root
    }

    /// Paths for one asset class.
    pub fn get(&self, class: AssetClass) -> &AssetPaths {
        match class {
            AssetClass::Markup => &self.markup,
            AssetClass::Styles => &self.styles,
            AssetClass::Scripts => &self.scripts,
            AssetClass::RasterImages => &self.raster_images,
            AssetClass::NextGenImages => &self.next_gen_images,
            AssetClass::Fonts => &self.fonts,
            AssetClass::FontStyleSheet => &self.font_style_sheet,
        }
    }

    /// Directory removed by the clean task.
    pub fn clean_target(&self) -> PathBuf {
        PathBuf::from(&self.output_root)
    }

    /// Generated font registry, relative to the project root.
    pub fn font_registry(&self) -> PathBuf {
        self.font_style_sheet.output.join(FONT_REGISTRY)
    }

    /// Directory scanned when generating the font registry.
    pub fn font_output_dir(&self) -> &Path {
        &self.fonts.output
    }
}

/// Output root name used when none is configured: the project directory's
/// own name.
pub fn default_output_root(project_root: &Path) -> String {
    project_root
        .canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(project_root)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dist".to_string())
}

/// Leading part of a glob pattern that contains no glob metacharacters.
///
/// Matched files are written relative to this base, so
/// `src/img/**/*.png` maps `src/img/icons/a.png` to `icons/a.png`.
/// A pattern without metacharacters yields its parent directory.
pub fn glob_base(pattern: &str) -> PathBuf {
    let pattern = pattern.strip_prefix('!').unwrap_or(pattern);
    let segments: Vec<&str> = pattern.split('/').collect();
    let literal = segments
        .iter()
        .position(|s| s.contains(['*', '?', '[', '{']))
        .unwrap_or(segments.len().saturating_sub(1));

    segments[..literal].iter().filter(|s| !s.is_empty()).collect()
}
