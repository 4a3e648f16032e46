//! vcs-walker - Find working copies with uncommitted changes
//!
//! A tool for auditing many repositories at once. It walks one or more
//! directory trees concurrently, recognises git, Mercurial and Subversion
//! working copies by their marker directory, and reports the status of
//! every working copy that has pending changes.
//!
//! # Features
//!
//! - **Unbounded Fan-out**: One tokio task per directory, so wide and deep
//!   forests are explored in parallel.
//!
//! - **Stops at Working Copies**: A directory with a `.git`, `.hg` or `.svn`
//!   marker is probed and not searched any further.
//!
//! - **Exact Completion**: Units report `+1`/`-1` deltas through the same
//!   queue as their results; the scan ends precisely when the live count
//!   returns to zero.
//!
//! - **Two Modes**: List each dirty working copy with its status, or only
//!   count them.
//!
//! # Example
//!
//! ```bash
//! # List dirty working copies under ~/src
//! vcs-walker ~/src
//!
//! # Count them across several roots
//! vcs-walker -n ~/src ~/work
//! ```

pub mod config;
pub mod error;
pub mod progress;
pub mod vcs;
pub mod walker;

pub use config::{CliArgs, ScanConfig};
pub use error::{ConfigError, Result, ScanError};
pub use vcs::{CommandProbe, Probe, ToolPathCache, VcsKind};
pub use walker::{ErrorPolicy, ScanCoordinator, ScanMode, ScanReport};
