//! Result aggregation and completion detection
//!
//! The aggregator is the only consumer of the event queue. It keeps the live
//! unit count, folds results into the report and decides the scan is over
//! when, and only when, the count returns to zero.

use crate::error::{Result, ScanError};
use crate::progress::ProgressReporter;
use crate::walker::tracker::{RepoStatus, WalkEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

/// How results are aggregated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// Buffer one block of text per dirty working copy
    #[default]
    List,
    /// Only count dirty working copies
    Count,
}

/// What to do when a unit fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// The first failure ends the scan with that error
    #[default]
    FailFast,
    /// Failures are collected and the rest of the forest still reports
    KeepGoing,
}

/// Outcome of a completed scan
#[derive(Debug, Default)]
pub struct ScanReport {
    pub mode: ScanMode,

    /// Listing-mode output, blocks separated by a blank line
    pub listing: String,

    /// Working copies with pending changes
    pub dirty: u64,

    /// Plain directories listed
    pub dirs_visited: u64,

    /// Working copies probed, clean or not
    pub repos_probed: u64,

    /// Failures collected in keep-going mode
    pub failures: Vec<ScanError>,

    pub duration: Duration,
}

impl ScanReport {
    fn new(mode: ScanMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Final text for standard output
    ///
    /// Empty in listing mode when nothing is dirty.
    pub fn render(&self) -> String {
        match self.mode {
            ScanMode::List => self.listing.clone(),
            ScanMode::Count => format!("{}\n", self.dirty),
        }
    }

    /// True when no unit failed
    pub fn is_clean_run(&self) -> bool {
        self.failures.is_empty()
    }

    fn push_block(&mut self, repo: &RepoStatus) {
        if !self.listing.is_empty() {
            // Status text may lack its final newline
            if !self.listing.ends_with('\n') {
                self.listing.push('\n');
            }
            self.listing.push('\n');
        }
        self.listing.push_str(&format!(
            "{} - {}\n{}",
            repo.path.display(),
            repo.kind,
            repo.status
        ));
    }
}

/// Single consumer of the event queue
pub struct Aggregator {
    policy: ErrorPolicy,
    live: i64,
    report: ScanReport,
    shutdown: Arc<AtomicBool>,
    progress: Option<ProgressReporter>,
}

impl Aggregator {
    /// Create an aggregator; `shutdown` is raised when a failure ends the scan
    pub fn new(mode: ScanMode, policy: ErrorPolicy, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            policy,
            live: 0,
            report: ScanReport::new(mode),
            shutdown,
            progress: None,
        }
    }

    /// Drive a progress spinner while the scan runs
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Consume events until the live count reaches zero
    ///
    /// The first event must be the seed delta queued before any unit starts.
    /// The receiver is dropped on return, which closes the queue for any
    /// unit still holding a sender.
    pub async fn run(mut self, mut events: UnboundedReceiver<WalkEvent>) -> Result<ScanReport> {
        let start = Instant::now();

        loop {
            let Some(event) = events.recv().await else {
                warn!(live = self.live, "Event queue closed with units outstanding");
                self.finish_progress("Scan aborted");
                return Err(ScanError::ChannelClosed);
            };

            match self.apply(event) {
                Ok(true) => break,
                Ok(false) => {}
                Err(e) => {
                    self.finish_progress("Scan failed");
                    return Err(e);
                }
            }

            if let Some(progress) = &self.progress {
                progress.update(&self.report);
            }
        }

        drop(events);
        self.report.duration = start.elapsed();
        self.finish_progress("Scan complete");

        debug!(
            dirs = self.report.dirs_visited,
            repos = self.report.repos_probed,
            dirty = self.report.dirty,
            failures = self.report.failures.len(),
            "All units finished"
        );

        Ok(self.report)
    }

    /// Apply one event; returns true once no unit is live
    fn apply(&mut self, event: WalkEvent) -> Result<bool> {
        match event {
            WalkEvent::Delta(delta) => {
                self.live += delta;
                debug_assert!(self.live >= 0, "live unit count went negative");
                return Ok(self.live == 0);
            }
            WalkEvent::Visited => self.report.dirs_visited += 1,
            WalkEvent::Probed(_) => self.report.repos_probed += 1,
            WalkEvent::Dirty(repo) => {
                self.report.dirty += 1;
                if self.report.mode == ScanMode::List {
                    self.report.push_block(&repo);
                }
            }
            WalkEvent::Failed(err) => match self.policy {
                ErrorPolicy::FailFast => {
                    self.shutdown.store(true, Ordering::SeqCst);
                    return Err(err);
                }
                ErrorPolicy::KeepGoing => {
                    warn!(error = %err, "Subtree failed");
                    self.report.failures.push(err);
                }
            },
        }
        Ok(false)
    }

    fn finish_progress(&self, message: &str) {
        if let Some(progress) = &self.progress {
            progress.finish(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::VcsKind;
    use crate::walker::tracker::event_channel;

    fn dirty(path: &str, kind: VcsKind, status: &str) -> WalkEvent {
        WalkEvent::Dirty(RepoStatus {
            path: path.into(),
            kind,
            status: status.into(),
        })
    }

    fn aggregator(mode: ScanMode, policy: ErrorPolicy) -> Aggregator {
        Aggregator::new(mode, policy, Arc::new(AtomicBool::new(false)))
    }

    #[tokio::test]
    async fn test_listing_blocks_separated_by_blank_line() {
        let (events, rx) = event_channel();
        events.seed(1);
        events.send(dirty("/a", VcsKind::Git, "M file.txt\n"));
        events.send(dirty("/b", VcsKind::Hg, "? new\n"));
        events.send(WalkEvent::Delta(-1));

        let report = aggregator(ScanMode::List, ErrorPolicy::FailFast)
            .run(rx)
            .await
            .unwrap();
        assert_eq!(report.render(), "/a - git\nM file.txt\n\n/b - hg\n? new\n");
        assert_eq!(report.dirty, 2);
    }

    #[tokio::test]
    async fn test_blank_line_without_trailing_newline() {
        let (events, rx) = event_channel();
        events.seed(1);
        events.send(dirty("/a", VcsKind::Git, "M x"));
        events.send(dirty("/b", VcsKind::Svn, "M y"));
        events.send(WalkEvent::Delta(-1));

        let report = aggregator(ScanMode::List, ErrorPolicy::FailFast)
            .run(rx)
            .await
            .unwrap();
        assert_eq!(report.render(), "/a - git\nM x\n\n/b - svn\nM y");
    }

    #[tokio::test]
    async fn test_count_mode_buffers_nothing() {
        let (events, rx) = event_channel();
        events.seed(2);
        events.send(dirty("/a", VcsKind::Svn, "M x\n"));
        events.send(WalkEvent::Delta(-1));
        events.send(dirty("/b", VcsKind::Svn, "M y\n"));
        events.send(WalkEvent::Delta(-1));

        let report = aggregator(ScanMode::Count, ErrorPolicy::FailFast)
            .run(rx)
            .await
            .unwrap();
        assert!(report.listing.is_empty());
        assert_eq!(report.render(), "2\n");
    }

    #[tokio::test]
    async fn test_stops_at_zero_not_at_last_message() {
        let (events, rx) = event_channel();
        events.seed(1);
        events.send(WalkEvent::Delta(1));
        events.send(WalkEvent::Delta(-1));
        events.send(dirty("/late", VcsKind::Git, "M z\n"));
        events.send(WalkEvent::Delta(-1));
        // Anything after zero belongs to no one and is never read
        events.send(dirty("/ignored", VcsKind::Git, "M q\n"));

        let report = aggregator(ScanMode::List, ErrorPolicy::FailFast)
            .run(rx)
            .await
            .unwrap();
        assert_eq!(report.dirty, 1);
        assert!(report.listing.starts_with("/late - git"));
    }

    #[tokio::test]
    async fn test_fail_fast_raises_shutdown() {
        let (events, rx) = event_channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        events.seed(1);
        events.send(WalkEvent::Failed(ScanError::ToolNotFound { tool: "hg" }));
        events.send(WalkEvent::Delta(-1));

        let err = Aggregator::new(ScanMode::List, ErrorPolicy::FailFast, Arc::clone(&shutdown))
            .run(rx)
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::ToolNotFound { tool: "hg" }));
        assert!(shutdown.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_keep_going_collects_failures() {
        let (events, rx) = event_channel();
        events.seed(2);
        events.send(WalkEvent::Failed(ScanError::ToolNotFound { tool: "svn" }));
        events.send(WalkEvent::Delta(-1));
        events.send(dirty("/ok", VcsKind::Git, "M a\n"));
        events.send(WalkEvent::Delta(-1));

        let report = aggregator(ScanMode::Count, ErrorPolicy::KeepGoing)
            .run(rx)
            .await
            .unwrap();
        assert_eq!(report.dirty, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(!report.is_clean_run());
    }

    #[tokio::test]
    async fn test_closed_queue_with_live_units() {
        let (events, rx) = event_channel();
        events.seed(1);
        drop(events);

        let err = aggregator(ScanMode::List, ErrorPolicy::FailFast)
            .run(rx)
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::ChannelClosed));
    }

    #[tokio::test]
    async fn test_zero_roots_finishes_immediately() {
        let (events, rx) = event_channel();
        events.seed(0);

        let report = aggregator(ScanMode::Count, ErrorPolicy::FailFast)
            .run(rx)
            .await
            .unwrap();
        assert_eq!(report.render(), "0\n");
    }
}
