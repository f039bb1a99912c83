//! Development server: static files from the output root plus live reload.

pub mod api;

use crate::events::EventBus;
use anyhow::{Context as _, Result};
use colored::*;
use std::path::PathBuf;
use tokio::net::TcpListener;

pub use api::router;

/// Bind `host:port` and serve until the process is stopped.
pub async fn start(host: &str, port: u16, root: PathBuf, events: EventBus) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind dev server to {}", addr))?;

    println!(
        "{} Server running at {}",
        "✓".green(),
        format!("http://{}", addr).bright_blue()
    );
    serve(listener, root, events).await
}

/// Serve on an already bound listener.
pub async fn serve(listener: TcpListener, root: PathBuf, events: EventBus) -> Result<()> {
    axum::serve(listener, router(root, events))
        .await
        .context("Dev server stopped unexpectedly")
}
