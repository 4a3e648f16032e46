//! Progress reporting for the forest scan
//!
//! Draws an indicatif spinner and a short summary on stderr, so standard
//! output only ever carries the scan result.

use crate::walker::ScanReport;
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Progress reporter that displays scan status
#[derive(Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, report: &ScanReport) {
        let msg = format!(
            "Dirs: {} | Repos: {} | Dirty: {} | Failed: {}",
            format_number(report.dirs_visited),
            format_number(report.repos_probed),
            format_number(report.dirty),
            report.failures.len(),
        );

        self.bar.set_message(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Print a summary of the scan on stderr
pub fn print_summary(report: &ScanReport) {
    let duration_secs = report.duration.as_secs_f64();

    eprintln!();
    eprintln!("{}", style("Scan Complete").green().bold());
    eprintln!("{}", style("─".repeat(50)).dim());
    eprintln!(
        "  {} {}",
        style("Directories:").bold(),
        format_number(report.dirs_visited)
    );
    eprintln!(
        "  {} {}",
        style("Working copies:").bold(),
        format_number(report.repos_probed)
    );
    eprintln!(
        "  {} {}",
        style("With changes:").bold(),
        format_number(report.dirty)
    );
    eprintln!("  {} {:.1}s", style("Duration:").bold(), duration_secs);
    if !report.failures.is_empty() {
        eprintln!(
            "  {} {}",
            style("Failed:").yellow().bold(),
            report.failures.len()
        );
    }
    eprintln!();
}

/// Print a header at the start of the scan on stderr
pub fn print_header(roots: &[std::path::PathBuf], threads: usize) {
    eprintln!();
    eprintln!(
        "{} {}",
        style("vcs-walker").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("{}", style("─".repeat(50)).dim());
    for root in roots {
        eprintln!("  {} {}", style("Root:").bold(), root.display());
    }
    eprintln!("  {} {}", style("Threads:").bold(), threads);
    eprintln!();
}
