//! JavaScript bundling through an external bundler process.
//!
//! The bundler is invoked esbuild-style:
//! `<bundler> <entry> --bundle --minify --sourcemap=inline --target=<t> --outfile=<out>`.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("bundler '{0}' was not found on PATH")]
    NotFound(String),
    #[error("bundler '{program}' exited with {status}: {stderr}")]
    Failed { program: String, status: String, stderr: String },
    #[error("failed to run bundler '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct BundleRequest<'a> {
    pub entry: &'a Path,
    pub outfile: &'a Path,
    /// Comma-separated target list
    pub target: &'a str,
    pub extra_args: &'a [String],
}

impl BundleRequest<'_> {
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            self.entry.display().to_string(),
            "--bundle".to_string(),
            "--minify".to_string(),
            "--sourcemap=inline".to_string(),
            format!("--target={}", self.target),
            format!("--outfile={}", self.outfile.display()),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

/// Run `program` for `request` with `cwd` as working directory.
pub fn run_bundler(program: &str, request: &BundleRequest<'_>, cwd: &Path) -> Result<(), BundleError> {
    tracing::debug!("running {} {}", program, request.args().join(" "));

    let output = Command::new(program)
        .args(request.args())
        .current_dir(cwd)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => BundleError::NotFound(program.to_string()),
            _ => BundleError::Spawn { program: program.to_string(), source },
        })?;

    if !output.status.success() {
        return Err(BundleError::Failed {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}
