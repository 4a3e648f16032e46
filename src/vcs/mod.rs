//! Version-control kinds and working-copy detection
//!
//! A directory is a working copy when it contains a kind-specific marker
//! entry. Markers are checked in a fixed priority order (git, then hg, then
//! svn) and the first one present decides the kind, so a directory is never
//! treated as two kinds at once.

pub mod probe;
pub mod tool;

pub use probe::{CommandProbe, Probe};
pub use tool::ToolPathCache;

use std::fmt;
use std::path::Path;

/// Version-control system of a working copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VcsKind {
    Git,
    Hg,
    Svn,
}

impl VcsKind {
    /// All kinds in detection priority order
    pub const PRIORITY: [VcsKind; 3] = [VcsKind::Git, VcsKind::Hg, VcsKind::Svn];

    /// Name of the marker entry inside a working copy root
    pub fn marker(self) -> &'static str {
        match self {
            VcsKind::Git => ".git",
            VcsKind::Hg => ".hg",
            VcsKind::Svn => ".svn",
        }
    }

    /// Executable name resolved on the search path
    pub fn tool_name(self) -> &'static str {
        match self {
            VcsKind::Git => "git",
            VcsKind::Hg => "hg",
            VcsKind::Svn => "svn",
        }
    }

    /// Fixed arguments of the status command
    pub fn status_args(self) -> &'static [&'static str] {
        match self {
            VcsKind::Git => &["-c", "color.status=always", "status", "-s"],
            VcsKind::Hg => &["--config", "extensions.color=!", "st"],
            VcsKind::Svn => &["st", "-v"],
        }
    }

    /// Slot index used by per-kind tables
    pub(crate) fn index(self) -> usize {
        match self {
            VcsKind::Git => 0,
            VcsKind::Hg => 1,
            VcsKind::Svn => 2,
        }
    }
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tool_name())
    }
}

/// Detect the kind of working copy rooted at `dir`
///
/// Returns `None` for a plain directory. Marker presence is all that is
/// checked: a `.git` file (worktrees, submodules) counts the same as a
/// `.git` directory.
pub async fn detect(dir: &Path) -> Option<VcsKind> {
    for kind in VcsKind::PRIORITY {
        if tokio::fs::try_exists(dir.join(kind.marker()))
            .await
            .unwrap_or(false)
        {
            return Some(kind);
        }
    }
    None
}
