//! Error types for vcs-walker
//!
//! This module defines the error hierarchy for a forest scan:
//! - Tool resolution errors (a VCS executable is missing from PATH)
//! - Directory listing errors
//! - Probe (status subprocess) errors
//! - Panics inside a scan unit
//! - Configuration and CLI errors
//!
//! Every variant is fatal under the default policy: the first one observed
//! anywhere in the forest ends the scan. In keep-going mode they are
//! collected per directory instead and reported alongside the results.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the vcs-walker library
#[derive(Error, Debug)]
pub enum ScanError {
    /// A required VCS executable could not be found
    #[error("Tool not found: '{tool}' is not on the search path")]
    ToolNotFound { tool: &'static str },

    /// Listing a directory's entries failed
    #[error("Failed to read directory '{}': {source}", .path.display())]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The status subprocess failed to launch or exited abnormally
    #[error("{tool} status failed in '{}': {reason}", .path.display())]
    ProbeExecutionFailed {
        path: PathBuf,
        tool: &'static str,
        reason: String,
    },

    /// A scan unit panicked before it could report
    #[error("Scan of '{}' panicked: {message}", .path.display())]
    UnitPanicked { path: PathBuf, message: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Event channel closed while units were still live
    #[error("Event channel closed unexpectedly")]
    ChannelClosed,
}

impl ScanError {
    /// Path of the directory the error was raised for, if any
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            ScanError::DirectoryUnreadable { path, .. }
            | ScanError::ProbeExecutionFailed { path, .. }
            | ScanError::UnitPanicked { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A root path does not exist
    #[error("Path not found: '{}'", .path.display())]
    PathNotFound { path: PathBuf },

    /// A root path exists but is not a directory
    #[error("Not a directory: '{}'", .path.display())]
    NotADirectory { path: PathBuf },

    /// Invalid runtime thread count
    #[error("Invalid thread count {count}: must be between 1 and {max}")]
    InvalidThreadCount { count: usize, max: usize },

    /// Invalid exclude pattern
    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidExcludePattern { pattern: String, reason: String },
}

/// Result type alias for ScanError
pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let config_err = ConfigError::NotADirectory {
            path: "/etc/hosts".into(),
        };
        let scan_err: ScanError = config_err.into();
        assert!(matches!(scan_err, ScanError::Config(_)));
        assert!(scan_err.path().is_none());
    }

    #[test]
    fn test_error_messages() {
        let err = ScanError::ToolNotFound { tool: "hg" };
        assert_eq!(err.to_string(), "Tool not found: 'hg' is not on the search path");

        let err = ScanError::ProbeExecutionFailed {
            path: "/src/repo".into(),
            tool: "git",
            reason: "exit status: 128".into(),
        };
        assert_eq!(err.to_string(), "git status failed in '/src/repo': exit status: 128");
        assert_eq!(err.path(), Some(std::path::Path::new("/src/repo")));
    }

    #[test]
    fn test_panic_message() {
        let err = ScanError::UnitPanicked {
            path: "/src/repo".into(),
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "Scan of '/src/repo' panicked: boom");
        assert_eq!(err.path(), Some(std::path::Path::new("/src/repo")));
    }

    #[test]
    fn test_unreadable_keeps_source() {
        use std::error::Error as _;

        let err = ScanError::DirectoryUnreadable {
            path: "/locked".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("Failed to read directory '/locked'"));
    }
}
