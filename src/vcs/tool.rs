//! Lazy, write-once cache of resolved VCS executables
//!
//! Each kind has its own `OnceCell`. The first unit that needs a tool runs
//! the search; concurrent units wait on the same initialization instead of
//! searching again, and every later read is a plain lookup.

use crate::error::{Result, ScanError};
use crate::vcs::VcsKind;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tracing::debug;

/// Mapping from VCS kind to its absolute executable path
#[derive(Debug, Default)]
pub struct ToolPathCache {
    /// Search path override; `None` reads `PATH` at resolution time
    search_path: Option<OsString>,

    /// One slot per kind, indexed by `VcsKind::index`
    slots: [OnceCell<PathBuf>; 3],
}

impl ToolPathCache {
    /// Create a cache that searches the process `PATH`
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache that searches the given path list instead of `PATH`
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
            slots: Default::default(),
        }
    }

    /// Resolve the executable for `kind`, searching at most once
    pub async fn resolve(&self, kind: VcsKind) -> Result<&Path> {
        let path = self.slots[kind.index()]
            .get_or_try_init(|| async move {
                match find_executable(kind.tool_name(), self.search_path()) {
                    Some(found) => {
                        debug!(tool = kind.tool_name(), path = %found.display(), "Resolved tool");
                        Ok(found)
                    }
                    None => Err(ScanError::ToolNotFound {
                        tool: kind.tool_name(),
                    }),
                }
            })
            .await?;
        Ok(path.as_path())
    }

    /// Already-resolved path for `kind`, without searching
    pub fn get(&self, kind: VcsKind) -> Option<&Path> {
        self.slots[kind.index()].get().map(PathBuf::as_path)
    }

    fn search_path(&self) -> Option<OsString> {
        self.search_path
            .clone()
            .or_else(|| std::env::var_os("PATH"))
    }
}

/// Search each directory of `search_path` for an executable named `name`
fn find_executable(name: &str, search_path: Option<OsString>) -> Option<PathBuf> {
    let search_path = search_path?;
    std::env::split_paths(&search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| candidates(&dir, name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(windows)]
fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    vec![dir.join(format!("{name}.exe")), dir.join(name)]
}

#[cfg(not(windows))]
fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    vec![dir.join(name)]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[cfg(unix)]
    fn install_tool(dir: &Path, name: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_missing_tool() {
        let dir = tempdir().unwrap();
        let cache = ToolPathCache::with_search_path(dir.path().as_os_str());

        let err = cache.resolve(VcsKind::Svn).await.unwrap_err();
        assert!(matches!(err, ScanError::ToolNotFound { tool: "svn" }));
        assert!(cache.get(VcsKind::Svn).is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_once() {
        let dir = tempdir().unwrap();
        let git = install_tool(dir.path(), "git");
        let cache = ToolPathCache::with_search_path(dir.path().as_os_str());

        assert!(cache.get(VcsKind::Git).is_none());
        assert_eq!(cache.resolve(VcsKind::Git).await.unwrap(), git.as_path());

        // Removing the tool does not matter once it has been resolved
        std::fs::remove_file(&git).unwrap();
        assert_eq!(cache.resolve(VcsKind::Git).await.unwrap(), git.as_path());
        assert_eq!(cache.get(VcsKind::Git), Some(git.as_path()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_search_order_and_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let first = tempdir().unwrap();
        let second = tempdir().unwrap();

        // Not executable, must be skipped
        let plain = first.path().join("hg");
        std::fs::write(&plain, "").unwrap();
        std::fs::set_permissions(&plain, std::fs::Permissions::from_mode(0o644)).unwrap();
        let hg = install_tool(second.path(), "hg");

        let search = std::env::join_paths([first.path(), second.path()]).unwrap();
        let cache = ToolPathCache::with_search_path(search);
        assert_eq!(cache.resolve(VcsKind::Hg).await.unwrap(), hg.as_path());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_concurrent_resolution_agrees() {
        use std::sync::Arc;

        let dir = tempdir().unwrap();
        let git = install_tool(dir.path(), "git");
        let cache = Arc::new(ToolPathCache::with_search_path(dir.path().as_os_str()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move {
                    cache.resolve(VcsKind::Git).await.map(Path::to_path_buf)
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), git);
        }
    }
}
