//! Project configuration (`assembly.toml`).
//!
//! Every section is optional; a project without a config file builds with
//! the defaults below. CLI flags are merged on top after loading.

use crate::paths::{default_output_root, PathConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the project root.
pub const CONFIG_FILE: &str = "assembly.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub paths: PathsConfig,
    pub server: ServerConfig,
    pub watch: WatchConfig,
    pub styles: StylesConfig,
    pub images: ImagesConfig,
    pub scripts: ScriptsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Source root, relative to the project root
    pub source: String,
    /// Output root; defaults to the project directory's name
    pub output: Option<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self { source: "src".to_string(), output: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 4000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Debounce window for filesystem events
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 100 }
    }
}

/// Browser support policy shared by the autoprefixer and the bundler target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StylesConfig {
    /// browserslist queries
    pub browsers: Vec<String>,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self { browsers: vec!["defaults".to_string()] }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    pub jpeg_quality: u8,
    pub webp_quality: f32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self { jpeg_quality: 75, webp_quality: 70.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScriptsConfig {
    /// Bundler executable, looked up on `PATH`
    pub bundler: String,
    /// Extra arguments appended after the generated ones
    pub extra_args: Vec<String>,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self { bundler: "esbuild".to_string(), extra_args: Vec::new() }
    }
}

impl Config {
    /// Check value ranges; returns one message per problem.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.paths.source.trim().is_empty() {
            errors.push("paths.source must not be empty".to_string());
        }
        if matches!(self.paths.output.as_deref(), Some(out) if out.trim().is_empty()) {
            errors.push("paths.output must not be empty".to_string());
        }
        if self.paths.output.as_deref() == Some(self.paths.source.as_str()) {
            errors.push("paths.output must differ from paths.source".to_string());
        }
        if !(1..=100).contains(&self.images.jpeg_quality) {
            errors.push(format!(
                "images.jpeg_quality must be within 1-100 (got {})",
                self.images.jpeg_quality
            ));
        }
        if !(0.0..=100.0).contains(&self.images.webp_quality) {
            errors.push(format!(
                "images.webp_quality must be within 0-100 (got {})",
                self.images.webp_quality
            ));
        }
        if self.styles.browsers.is_empty() {
            errors.push("styles.browsers must contain at least one query".to_string());
        }
        if self.scripts.bundler.trim().is_empty() {
            errors.push("scripts.bundler must not be empty".to_string());
        }

        errors
    }

    /// Build the path table, deriving the output root from the project
    /// directory when none is configured.
    pub fn path_config(&self, project_root: &Path) -> PathConfig {
        let output = self
            .paths
            .output
            .clone()
            .unwrap_or_else(|| default_output_root(project_root));
        PathConfig::resolve(&self.paths.source, &output)
    }
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub output: Option<String>,
    pub port: Option<u16>,
}

/// Load `assembly.toml` from `path`, or from the project root when `path` is
/// `None`. A missing file in the project root yields the defaults; an
/// explicitly named file must exist.
pub fn load_config(project_root: &Path, path: Option<&Path>) -> Result<Config, ConfigError> {
    let (config_path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (project_root.join(CONFIG_FILE), false),
    };

    if !required && !config_path.exists() {
        tracing::debug!("no {} in {}, using defaults", CONFIG_FILE, project_root.display());
        return Ok(Config::default());
    }

    let contents = fs::read_to_string(&config_path)
        .map_err(|source| ConfigError::Io { path: config_path.clone(), source })?;
    let config: Config = toml::from_str(&contents)
        .map_err(|source| ConfigError::Parse { path: config_path.clone(), source })?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors));
    }

    tracing::debug!("loaded config from {}", config_path.display());
    Ok(config)
}

/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut Config, overrides: &CliOverrides) {
    if let Some(ref output) = overrides.output {
        config.paths.output = Some(output.clone());
    }
    if let Some(port) = overrides.port {
        config.server.port = port;
    }
}
