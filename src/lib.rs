//! # Assembly - static-site asset pipeline
//!
//! Builds a site's front-end assets from a source tree into an output tree,
//! then watches the sources and serves the output with live reload.
//!
//! ## Pipeline
//!
//! - **html**: `@@include` expansion, `<picture>` wrapping for WebP
//! - **styles**: Sass, grouped media queries, WebP backgrounds, prefixing, minification
//! - **scripts**: bundled by an external bundler (esbuild by default)
//! - **images** / **webp**: recompression and WebP variants
//! - **fonts** / **fonts-style**: TTF to WOFF/WOFF2 and a generated Sass registry
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use assembly::config::Config;
//! use assembly::orchestrator::Orchestrator;
//! use assembly::tasks::BuildContext;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = BuildContext::new(".", Config::default());
//!     let orchestrator = Orchestrator::with_standard_tasks(ctx);
//!     orchestrator.build().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod events;
pub mod graph;
pub mod logging;
pub mod orchestrator;
pub mod paths;
pub mod server;
pub mod tasks;
pub mod transform;
pub mod watcher;

// Re-export main types for library consumers
pub use config::{load_config, Config};
pub use events::{EventBus, ReloadMessage, TaskEvent};
pub use graph::TaskGraph;
pub use orchestrator::Orchestrator;
pub use tasks::{BuildContext, TaskId, TaskReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
