//! Fatal error reporting
//!
//! Fatal errors travel up as `anyhow::Error`. At the top level they are
//! categorized by inspecting the error chain and printed with context lines
//! and suggestions.

use crate::config::ConfigError;
use crate::tasks::clean::CleanError;
use crate::transform::bundle::BundleError;
use crate::transform::include::IncludeError;
use crate::transform::sfnt::FontError;

/// Categorized error types for better reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid or unreadable configuration
    Configuration,

    /// Reading or writing the project tree failed
    FileSystem,

    /// A transformation rejected its input (template, font, image)
    Transformation,

    /// The external script bundler failed or is missing
    Bundler,

    /// The dev server could not start
    Server,

    /// Unknown errors
    Unknown,
}

/// Categorize an error by the typed errors in its chain, falling back to
/// the message text.
pub fn categorize_error(error: &anyhow::Error) -> ErrorCategory {
    for cause in error.chain() {
        if cause.is::<ConfigError>() {
            return ErrorCategory::Configuration;
        }
        if cause.is::<BundleError>() {
            return ErrorCategory::Bundler;
        }
        if cause.is::<FontError>() || cause.is::<IncludeError>() {
            return ErrorCategory::Transformation;
        }
        if cause.is::<CleanError>() {
            return ErrorCategory::FileSystem;
        }
    }

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("bind") || error_str.contains("address") || error_str.contains("server") {
        ErrorCategory::Server
    } else if error.chain().any(|c| c.is::<std::io::Error>())
        || error_str.contains("directory")
        || error_str.contains("permission")
    {
        ErrorCategory::FileSystem
    } else if error_str.contains("config") {
        ErrorCategory::Configuration
    } else if error_str.contains("decode") || error_str.contains("encode") {
        ErrorCategory::Transformation
    } else {
        ErrorCategory::Unknown
    }
}

/// Enhanced error with context and suggestions
#[derive(Debug)]
pub struct EnhancedError {
    pub error: anyhow::Error,
    pub category: ErrorCategory,
    pub context: Vec<String>,
    pub suggestions: Vec<String>,
}

impl EnhancedError {
    /// Create an enhanced error
    pub fn new(error: anyhow::Error) -> Self {
        let category = categorize_error(&error);
        let (context, suggestions) = generate_context_and_suggestions(category, &error);

        Self {
            error,
            category,
            context,
            suggestions,
        }
    }

    /// Display the error with all context
    pub fn display(&self) -> String {
        let mut output = format!("❌ Error: {}\n", self.error);

        let causes: Vec<String> = self.error.chain().skip(1).map(|c| c.to_string()).collect();
        if !causes.is_empty() || !self.context.is_empty() {
            output.push_str("\n📋 Context:\n");
            for line in causes.iter().chain(self.context.iter()) {
                output.push_str(&format!("   • {}\n", line));
            }
        }

        if !self.suggestions.is_empty() {
            output.push_str("\n💡 Suggestions:\n");
            for suggestion in &self.suggestions {
                output.push_str(&format!("   • {}\n", suggestion));
            }
        }

        output
    }
}

/// Generate helpful context and suggestions based on error category
fn generate_context_and_suggestions(
    category: ErrorCategory,
    error: &anyhow::Error,
) -> (Vec<String>, Vec<String>) {
    let mut context = Vec::new();
    let mut suggestions = Vec::new();

    match category {
        ErrorCategory::Configuration => {
            context.push("Configuration error detected".to_string());
            suggestions.push("Review assembly.toml in the project root".to_string());
            suggestions.push("Unknown keys are rejected; check for typos".to_string());
        }
        ErrorCategory::FileSystem => {
            context.push("File system operation failed".to_string());
            suggestions.push("Check file permissions".to_string());
            suggestions.push("Verify the project directory (-C) is correct".to_string());
        }
        ErrorCategory::Transformation => {
            context.push("A source file could not be transformed".to_string());
            suggestions.push("Fix the file named above and run the build again".to_string());
        }
        ErrorCategory::Bundler => {
            context.push("Script bundling failed".to_string());
            suggestions.push("Make sure the bundler (esbuild by default) is on PATH".to_string());
            suggestions.push("Set scripts.bundler in assembly.toml to use another one".to_string());
        }
        ErrorCategory::Server => {
            context.push("Dev server could not start".to_string());
            suggestions.push("Another process may be using the port; try --port".to_string());
        }
        ErrorCategory::Unknown => {
            context.push(format!("Unexpected error: {}", error));
            suggestions.push("Re-run with -v or RUST_LOG=assembly=debug for details".to_string());
        }
    }

    (context, suggestions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context as _;

    #[test]
    fn test_error_categorization() {
        let cfg = anyhow::Error::new(ConfigError::Validation(vec!["bad".into()]));
        assert_eq!(categorize_error(&cfg), ErrorCategory::Configuration);

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let fs_err = anyhow::Error::new(io).context("Failed to write site/index.html");
        assert_eq!(categorize_error(&fs_err), ErrorCategory::FileSystem);

        let font = Err::<(), _>(FontError::Truncated)
            .context("Failed to convert src/fonts/a.ttf")
            .unwrap_err();
        assert_eq!(categorize_error(&font), ErrorCategory::Transformation);

        let server = anyhow::anyhow!("Failed to bind 0.0.0.0:4000");
        assert_eq!(categorize_error(&server), ErrorCategory::Server);

        let other = anyhow::anyhow!("something odd");
        assert_eq!(categorize_error(&other), ErrorCategory::Unknown);
    }

    #[test]
    fn test_display_includes_chain_and_suggestions() {
        let err = anyhow::Error::new(BundleError::NotFound("esbuild".into()))
            .context("Task scripts failed");
        let enhanced = EnhancedError::new(err);

        assert_eq!(enhanced.category, ErrorCategory::Bundler);
        let text = enhanced.display();
        assert!(text.starts_with("❌ Error: Task scripts failed"));
        assert!(text.contains("esbuild"));
        assert!(text.contains("💡 Suggestions:"));
    }
}
