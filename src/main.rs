//! vcs-walker - Find working copies with uncommitted changes
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vcs_walker::config::{CliArgs, ScanConfig};
use vcs_walker::progress::{print_header, print_summary, ProgressReporter};
use vcs_walker::vcs::CommandProbe;
use vcs_walker::walker::{ScanCoordinator, ScanReport};

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every directory was scanned without failure
fn run() -> Result<bool> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    // Validate and create config
    let config = ScanConfig::from_args(args).context("Invalid configuration")?;

    if config.show_progress {
        print_header(&config.roots, config.threads);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.threads)
        .enable_all()
        .build()
        .context("Failed to create async runtime")?;

    let report = runtime.block_on(scan(config.clone()))?;

    write_report(&report)?;

    if config.show_progress {
        print_summary(&report);
    }

    for failure in &report.failures {
        eprintln!("Error: {}", failure);
    }

    if !report.is_clean_run() {
        info!(failures = report.failures.len(), "Scan completed with failures");
    }

    Ok(report.is_clean_run())
}

async fn scan(config: ScanConfig) -> Result<ScanReport> {
    let show_progress = config.show_progress;
    let mut coordinator = ScanCoordinator::new(config, CommandProbe::default());

    if show_progress {
        coordinator = coordinator.with_progress(ProgressReporter::new());
    }

    coordinator.run().await.context("Scan failed")
}

fn write_report(report: &ScanReport) -> Result<()> {
    let output = report.render();
    if output.is_empty() {
        return Ok(());
    }

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(output.as_bytes())
        .context("Failed to write results")?;
    stdout.flush().context("Failed to write results")
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("vcs_walker=debug,warn")
    } else {
        EnvFilter::new("vcs_walker=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
