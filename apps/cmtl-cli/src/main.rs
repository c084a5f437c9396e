//! CMTL CLI - CyberSec Multi Tool Launcher
//!
//! Command-line interface for running the configured security tools, either
//! all at once, through an interactive menu, or from a terminal UI.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cmtl_core::{Launcher, LauncherConfig, OutputLayout};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

mod menu;
mod tui;

/// CMTL - CyberSec Multi Tool Launcher
///
/// Runs internal probes and external security tools against a target and
/// records every run in an append-only ledger.
#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Path of the JSON config file; created with defaults when missing
    #[arg(long, global = true, default_value = "config.json")]
    config: PathBuf,

    /// Directory receiving results.json and per-tool logs
    #[arg(long, global = true, default_value = "output")]
    output_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available CMTL commands
#[derive(Subcommand)]
enum Commands {
    /// Run every registered tool once and print the summary as JSON
    ///
    /// Internal probes run first, then external tools, one at a time.
    /// Tool failures are recorded, never fatal.
    RunAll {
        /// Target host or address; defaults to the configured target
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Interactive text menu on stdin
    Cli {
        /// Target host or address; defaults to the configured target
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Interactive terminal UI
    Gui {
        /// Target host or address; defaults to the configured target
        #[arg(short, long)]
        target: Option<String>,
    },

    /// List registered tools and whether they are available
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Console logging would tear the alternate screen
    if !matches!(cli.command, Commands::Gui { .. }) {
        init_tracing(cli.verbose);
    }

    // Execute command
    if let Err(e) = run_command(cli).await {
        error!("Command failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Initialize tracing subscriber for structured logging on stderr
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = if verbose {
        EnvFilter::new("cmtl=debug,cmtl_core=debug")
    } else {
        EnvFilter::new("cmtl=info,cmtl_core=info")
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();
}

/// Resolve configuration, prepare the output layout and dispatch
async fn run_command(cli: Cli) -> Result<()> {
    let config = LauncherConfig::resolve(&cli.config);
    let launcher = Launcher::new(config, OutputLayout::new(&cli.output_dir))
        .context("Failed to prepare output directory")?;
    let default_target = launcher.config().default_target.clone();

    match cli.command {
        Commands::RunAll { target } => {
            let target = target.unwrap_or(default_target);
            info!("Running all tools against {}", target);
            run_all(&launcher, &target).await
        }
        Commands::Cli { target } => {
            let target = target.unwrap_or(default_target);
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            menu::run_menu(&launcher, &target, stdin.lock(), stdout.lock())
                .await
                .context("Interactive menu failed")
        }
        Commands::Gui { target } => {
            let target = target.unwrap_or(default_target);
            tui::run_launcher_tui(Arc::new(launcher), target)
                .await
                .context("Terminal UI failed")
        }
        Commands::Tools => {
            print_tools(&launcher);
            Ok(())
        }
    }
}

/// Run the run-all command
async fn run_all(launcher: &Launcher, target: &str) -> Result<()> {
    let summary = launcher.run_all(target).await;

    let json = serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
    println!("{}", json);

    info!(
        "{} of {} tools succeeded; results in {}",
        summary.succeeded(),
        summary.outcomes.len(),
        launcher.layout().results_file.display()
    );
    Ok(())
}

/// Run the tools command
fn print_tools(launcher: &Launcher) {
    println!("{}", launcher.config().project_name);
    for entry in launcher.registry().entries() {
        let availability = if launcher.is_available(entry) {
            "available"
        } else if entry.spec.is_missing() {
            "no launcher"
        } else {
            "not found"
        };
        println!("[{:<8}] {:<22} {}", entry.source.as_str(), entry.name, availability);
    }
}
