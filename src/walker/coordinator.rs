//! Scan coordinator - fans out one tokio task per directory
//!
//! Each unit looks at exactly one directory. A working copy is probed and
//! ends its branch of the walk; a plain directory spawns one child unit per
//! subdirectory. Units report through the event queue only, and the
//! aggregator ends the scan once every unit in the forest has finished.

use crate::config::ScanConfig;
use crate::error::{Result, ScanError};
use crate::progress::ProgressReporter;
use crate::vcs::{self, Probe};
use crate::walker::aggregator::{Aggregator, ScanReport};
use crate::walker::tracker::{event_channel, EventSender, LiveGuard, RepoStatus, WalkEvent};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinError;
use tracing::{debug, info, trace};

/// A directory to explore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirTask {
    /// Full path to the directory
    pub path: PathBuf,

    /// Depth below the root it was reached from (0 = root)
    pub depth: usize,
}

impl DirTask {
    /// Create the task for a root path
    pub fn root(path: PathBuf) -> Self {
        Self { path, depth: 0 }
    }

    /// Create the task for a subdirectory of this one
    pub fn child(&self, path: PathBuf) -> Self {
        Self {
            path,
            depth: self.depth + 1,
        }
    }
}

/// State shared by every unit of one scan
struct UnitContext<P> {
    config: Arc<ScanConfig>,
    probe: Arc<P>,
    shutdown: Arc<AtomicBool>,
}

impl<P> UnitContext<P> {
    fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

/// Coordinates a concurrent scan over all configured roots
pub struct ScanCoordinator<P> {
    config: Arc<ScanConfig>,
    probe: Arc<P>,
    shutdown: Arc<AtomicBool>,
    progress: Option<ProgressReporter>,
}

impl<P: Probe> ScanCoordinator<P> {
    /// Create a new coordinator
    pub fn new(config: ScanConfig, probe: P) -> Self {
        Self {
            config: Arc::new(config),
            probe: Arc::new(probe),
            shutdown: Arc::new(AtomicBool::new(false)),
            progress: None,
        }
    }

    /// Report progress while scanning
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Flag raised once a failure has ended the scan
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run the scan to completion
    ///
    /// Must be called from within a tokio runtime. Returns the first failure
    /// under [`ErrorPolicy::FailFast`](crate::walker::ErrorPolicy::FailFast).
    pub async fn run(self) -> Result<ScanReport> {
        info!(
            roots = self.config.roots.len(),
            mode = ?self.config.mode,
            "Starting scan"
        );

        let (events, rx) = event_channel();

        // The root count is queued before any unit can report
        events.seed(self.config.roots.len());

        let ctx = Arc::new(UnitContext {
            config: Arc::clone(&self.config),
            probe: Arc::clone(&self.probe),
            shutdown: Arc::clone(&self.shutdown),
        });

        for root in &self.config.roots {
            spawn_unit(
                Arc::clone(&ctx),
                DirTask::root(root.clone()),
                events.seeded_guard(),
            );
        }

        // Only unit guards may keep the queue open from here on
        drop(events);
        drop(ctx);

        let mut aggregator = Aggregator::new(
            self.config.mode,
            self.config.error_policy,
            Arc::clone(&self.shutdown),
        );
        if let Some(progress) = self.progress {
            progress.set_status("Scanning...");
            aggregator = aggregator.with_progress(progress);
        }

        let report = aggregator.run(rx).await?;

        info!(
            dirty = report.dirty,
            repos = report.repos_probed,
            dirs = report.dirs_visited,
            duration_ms = report.duration.as_millis() as u64,
            "Scan completed"
        );

        Ok(report)
    }
}

/// Spawn one unit for `task`, owning `guard` until it finishes
///
/// The directory work runs in its own task so that a panic surfaces as a
/// `JoinError` here and is reported as a failure before `guard` drops.
fn spawn_unit<P: Probe>(ctx: Arc<UnitContext<P>>, task: DirTask, guard: LiveGuard) {
    tokio::spawn(async move {
        if ctx.is_shutdown() {
            return;
        }

        let path = task.path.clone();
        let outcome = tokio::spawn(explore(ctx, task, guard.events().clone())).await;

        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(join_err) => Some(ScanError::UnitPanicked {
                path: path.clone(),
                message: panic_message(join_err),
            }),
        };

        if let Some(e) = failure {
            debug!(path = %path.display(), error = %e, "Unit failed");
            guard.events().send(WalkEvent::Failed(e));
        }

        // `guard` drops here and reports this unit as finished
    });
}

fn panic_message(err: JoinError) -> String {
    match err.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string()),
        Err(err) => err.to_string(),
    }
}

/// Explore one directory
async fn explore<P: Probe>(
    ctx: Arc<UnitContext<P>>,
    task: DirTask,
    events: EventSender,
) -> Result<()> {
    if let Some(kind) = vcs::detect(&task.path).await {
        debug!(path = %task.path.display(), kind = %kind, "Found working copy");

        let status = ctx.probe.probe(&task.path, kind).await?;
        events.send(WalkEvent::Probed(kind));

        if !status.is_empty() {
            events.send(WalkEvent::Dirty(RepoStatus {
                path: task.path.clone(),
                kind,
                status,
            }));
        }
        return Ok(());
    }

    let unreadable = |source: std::io::Error| ScanError::DirectoryUnreadable {
        path: task.path.clone(),
        source,
    };

    let mut entries = tokio::fs::read_dir(&task.path).await.map_err(unreadable)?;
    let mut spawned = 0usize;

    while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
        // Symlinks are not followed
        let file_type = entry.file_type().await.map_err(unreadable)?;
        if !file_type.is_dir() {
            continue;
        }

        let child = task.child(entry.path());
        if !ctx.config.within_depth(child.depth) || ctx.config.is_excluded(&child.path) {
            trace!(path = %child.path.display(), "Skipping directory");
            continue;
        }

        if ctx.is_shutdown() {
            break;
        }

        spawn_unit(Arc::clone(&ctx), child, events.child_guard());
        spawned += 1;
    }

    events.send(WalkEvent::Visited);
    trace!(path = %task.path.display(), children = spawned, "Listed directory");

    Ok(())
}
