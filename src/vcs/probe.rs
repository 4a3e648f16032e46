//! Status probes
//!
//! A probe runs the status command of one working copy and returns its
//! standard output. `CommandProbe` spawns the real tools; the `Probe` trait
//! lets the walker run against anything that can answer the same question.

use crate::error::{Result, ScanError};
use crate::vcs::tool::ToolPathCache;
use crate::vcs::VcsKind;
use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::trace;

/// Something that can report the pending changes of a working copy
///
/// Implementations must tolerate unbounded concurrent calls for different
/// directories.
pub trait Probe: Send + Sync + 'static {
    /// Return the raw status text of the working copy at `dir`
    ///
    /// An empty string means the working copy is clean.
    fn probe(&self, dir: &Path, kind: VcsKind) -> impl Future<Output = Result<String>> + Send;
}

/// Probe that runs `git`, `hg` or `svn` as a subprocess
#[derive(Debug, Clone)]
pub struct CommandProbe {
    tools: Arc<ToolPathCache>,
}

impl CommandProbe {
    /// Create a probe resolving tools through `tools`
    pub fn new(tools: Arc<ToolPathCache>) -> Self {
        Self { tools }
    }
}

impl Default for CommandProbe {
    fn default() -> Self {
        Self::new(Arc::new(ToolPathCache::new()))
    }
}

impl<P: Probe> Probe for Arc<P> {
    fn probe(&self, dir: &Path, kind: VcsKind) -> impl Future<Output = Result<String>> + Send {
        (**self).probe(dir, kind)
    }
}

impl Probe for CommandProbe {
    async fn probe(&self, dir: &Path, kind: VcsKind) -> Result<String> {
        let tool = self.tools.resolve(kind).await?;

        trace!(dir = %dir.display(), tool = kind.tool_name(), "Running status");

        let output = Command::new(tool)
            .args(kind.status_args())
            .current_dir(dir)
            .stdin(Stdio::inherit())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ScanError::ProbeExecutionFailed {
                path: dir.to_path_buf(),
                tool: kind.tool_name(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = match stderr.trim() {
                "" => output.status.to_string(),
                msg => format!("{}: {}", output.status, msg),
            };
            return Err(ScanError::ProbeExecutionFailed {
                path: dir.to_path_buf(),
                tool: kind.tool_name(),
                reason,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
