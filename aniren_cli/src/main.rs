use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use log::{debug, info, warn};
use std::fmt::Display;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::BufReader;

use aniren_cli::config::ConfigManager;
use aniren_cli::progress::{
    RenderOptions, create_progress_infrastructure, finish_rendering, render_progress,
};
use aniren_cli::terminal;
use aniren_core::{
    PipelineOptions, ProgressProvider, RenamePipeline, SharedProvider, Shutdown, WorkerState,
};

/// Time allowed for blocked tasks (stdin reads, renames) once the run is over
const RUNTIME_SHUTDOWN: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "aniren")]
#[command(author, version, about = "Rename anime files from ed2k links read on stdin", long_about = None)]
struct Cli {
    /// Print the new names instead of renaming
    #[arg(short, long)]
    dry: bool,

    /// Only print errors, dry-run names and unfinished jobs
    #[arg(short, long)]
    quiet: bool,

    /// Configuration file (falls back to the default locations)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default())
            .filter_level(log::LevelFilter::Warn)
            .filter_module("aniren_core", log::LevelFilter::Debug)
            .filter_module("aniren_cli", log::LevelFilter::Debug)
            .format_timestamp_millis()
            .init();
        debug!("Debug logging enabled");
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    if terminal::color_disabled() || !terminal::supports_ansi() {
        colored::control::set_override(false);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            report_error(format!("Failed to start async runtime: {e}"));
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(execute(cli));
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN);

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            report_error(format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

/// Run one session; `Ok(false)` means the run stopped before finishing
async fn execute(cli: Cli) -> Result<bool> {
    let config = ConfigManager::new(cli.config)
        .load()?
        .into_renamer_config()
        .context("Invalid configuration")?;

    let (provider, rx) = create_progress_infrastructure();
    let renderer = tokio::spawn(render_progress(
        rx,
        RenderOptions {
            quiet: cli.quiet,
            spinner: terminal::spinner_enabled(),
        },
    ));

    let shutdown = Shutdown::new();
    let interrupt = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping");
                shutdown.abort();
            }
        })
    };

    let pipeline = RenamePipeline::new(
        config,
        PipelineOptions { dry_run: cli.dry },
        SharedProvider::new(provider.clone()),
        shutdown,
    );
    let outcome = pipeline
        .run(BufReader::new(tokio::io::stdin()))
        .await;

    interrupt.abort();
    provider.complete();
    finish_rendering(renderer).await;

    let summary = outcome.context("Session failed")?;
    match (summary.state, summary.failure) {
        (WorkerState::Completed, _) => {
            info!("Done, {} files processed", summary.processed);
            Ok(true)
        }
        (_, Some(failure)) => {
            report_error(failure);
            Ok(false)
        }
        (state, None) => {
            report_error(format!("Run stopped ({state:?})"));
            Ok(false)
        }
    }
}

fn report_error(message: impl Display) {
    eprintln!("{} {message}", "! ERROR!".red().bold());
}
