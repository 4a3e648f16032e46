//! Configuration types for vcs-walker
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use crate::walker::{ErrorPolicy, ScanMode};
use clap::Parser;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Maximum reasonable runtime thread count
const MAX_THREADS: usize = 512;

/// Find working copies with uncommitted changes
#[derive(Parser, Debug, Clone)]
#[command(
    name = "vcs-walker",
    version,
    about = "Find git, Mercurial and Subversion working copies with uncommitted changes",
    long_about = "Walks one or more directory trees concurrently, stops at every working copy it \
                  finds and prints the status of those with pending changes.\n\n\
                  Directories are recognised by a .git, .hg or .svn marker, checked in that order. \
                  Working copies nested inside another working copy are not searched.",
    after_help = "EXAMPLES:\n    \
        vcs-walker ~/src\n    \
        vcs-walker -n ~/src ~/work          # count dirty working copies\n    \
        vcs-walker --exclude node_modules -k ~/src"
)]
pub struct CliArgs {
    /// Directories to scan
    #[arg(value_name = "PATH", default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Count the number of changed working copies
    #[arg(short = 'n', long)]
    pub count: bool,

    /// Keep scanning other directories after a failure
    #[arg(short = 'k', long)]
    pub keep_going: bool,

    /// Maximum directory depth below each root (unlimited if not set)
    #[arg(short = 'd', long, value_name = "NUM")]
    pub max_depth: Option<usize>,

    /// Skip directories whose path matches pattern (can be repeated)
    #[arg(long = "exclude", value_name = "PATTERN", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Number of runtime worker threads
    #[arg(
        short = 'j',
        long,
        default_value_t = default_threads(),
        value_name = "NUM"
    )]
    pub threads: usize,

    /// Show a progress spinner and summary on stderr
    #[arg(short = 'p', long)]
    pub progress: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

fn default_threads() -> usize {
    num_cpus::get()
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Root paths, each an existing directory
    pub roots: Vec<PathBuf>,

    /// Listing or count aggregation
    pub mode: ScanMode,

    /// Whether a failure ends the scan
    pub error_policy: ErrorPolicy,

    /// Maximum depth below a root
    pub max_depth: Option<usize>,

    /// Compiled exclude patterns
    pub exclude_patterns: Vec<Regex>,

    /// Runtime worker threads
    pub threads: usize,

    /// Show progress
    pub show_progress: bool,
}

impl ScanConfig {
    /// Configuration with defaults for the given roots, without validation
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            mode: ScanMode::List,
            error_policy: ErrorPolicy::FailFast,
            max_depth: None,
            exclude_patterns: Vec::new(),
            threads: default_threads(),
            show_progress: false,
        }
    }

    /// Create configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        // Every root must be an existing directory
        for path in &args.paths {
            let meta = std::fs::metadata(path).map_err(|_| ConfigError::PathNotFound {
                path: path.clone(),
            })?;
            if !meta.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        if args.threads == 0 || args.threads > MAX_THREADS {
            return Err(ConfigError::InvalidThreadCount {
                count: args.threads,
                max: MAX_THREADS,
            });
        }

        let exclude_patterns = args
            .exclude_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidExcludePattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            roots: args.paths,
            mode: if args.count {
                ScanMode::Count
            } else {
                ScanMode::List
            },
            error_policy: if args.keep_going {
                ErrorPolicy::KeepGoing
            } else {
                ErrorPolicy::FailFast
            },
            max_depth: args.max_depth,
            exclude_patterns,
            threads: args.threads,
            show_progress: args.progress,
        })
    }

    /// Check if a path should be excluded
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.exclude_patterns.is_empty() {
            return false;
        }
        let path = path.to_string_lossy();
        self.exclude_patterns.iter().any(|re| re.is_match(&path))
    }

    /// Check if a directory at `depth` below its root may be explored
    pub fn within_depth(&self, depth: usize) -> bool {
        self.max_depth.map(|max| depth <= max).unwrap_or(true)
    }
}
