use anyhow::{Context as _, Result};
use assembly::config::{load_config, merge_cli_overrides, CliOverrides};
use assembly::error::EnhancedError;
use assembly::{logging, BuildContext, Orchestrator, TaskId, VERSION};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "assembly")]
#[command(about = "Static-site asset pipeline with a live-reloading dev server", version)]
#[command(after_help = "Tasks:
- watch (default): build, then rebuild on change and serve the output with live reload
- build: clean → fonts → fonts-style → (images ∥ webp) → (scripts ∥ styles ∥ html)
- clean-dist, fonts, fonts-style: run a single step

Configuration is read from assembly.toml in the project directory when present.
Set RUST_LOG to override the log filter.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Project directory
    #[arg(short = 'C', long, global = true, default_value = ".")]
    project: PathBuf,

    /// Config file (defaults to <project>/assembly.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output root name (defaults to the project directory's name)
    #[arg(short, long, global = true)]
    output: Option<String>,

    /// Dev server port
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Remove the output root
    #[command(alias = "cleanDist")]
    CleanDist,

    /// Convert TTF fonts to WOFF and WOFF2
    Fonts,

    /// Generate the Sass font registry if it is missing or empty
    #[command(alias = "fontsStyle")]
    FontsStyle,

    /// Run the full build once
    Build,

    /// Build, then watch sources and serve the output
    #[command(alias = "watchTask")]
    Watch,
}

#[tokio::main(flavor = "multi_thread", worker_threads = 10)]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let code = tokio::select! {
        result = run(cli) => match result {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("{}", EnhancedError::new(e).display());
                1
            }
        },
        _ = tokio::signal::ctrl_c() => {
            println!("\n{}", "👋 Stopped".yellow());
            0
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<()> {
    let project = cli
        .project
        .canonicalize()
        .with_context(|| format!("Project directory {} not found", cli.project.display()))?;

    let mut config = load_config(&project, cli.config.as_deref())?;
    merge_cli_overrides(&mut config, &CliOverrides { output: cli.output.clone(), port: cli.port });

    let orchestrator = Arc::new(Orchestrator::with_standard_tasks(BuildContext::new(&project, config)));
    let command = cli.command.unwrap_or(Commands::Watch);

    println!("{}", format!("🚀 assembly v{} in {}", VERSION, project.display()).cyan().bold());

    match command {
        Commands::CleanDist => {
            orchestrator.run_task(TaskId::Clean).await?;
        }
        Commands::Fonts => {
            orchestrator.run_task(TaskId::Fonts).await?;
        }
        Commands::FontsStyle => {
            orchestrator.run_task(TaskId::FontsStyle).await?;
        }
        Commands::Build => {
            orchestrator.build().await?;
        }
        Commands::Watch => {
            orchestrator.watch().await?;
        }
    }

    Ok(())
}
