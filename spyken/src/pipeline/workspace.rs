//! Per-job scratch directory.

use crate::error::Result;
use std::path::Path;
use tempfile::TempDir;

/// A temporary directory owned by exactly one job.
///
/// Removed by [`JobWorkspace::close`], or on drop if the job unwinds early.
/// Removal failures are logged, never returned.
pub struct JobWorkspace {
    dir: TempDir,
}

impl JobWorkspace {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("spyken-").tempdir()?;
        log::debug!("Job workspace at {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            log::warn!("Could not remove job workspace {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_removes_directory() {
        let workspace = JobWorkspace::new().unwrap();
        let path = workspace.path().to_path_buf();
        std::fs::write(workspace.path().join("chunk.mp3"), b"x").unwrap();
        assert!(path.exists());

        workspace.close();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes_directory() {
        let path = {
            let workspace = JobWorkspace::new().unwrap();
            workspace.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_workspaces_are_distinct() {
        let a = JobWorkspace::new().unwrap();
        let b = JobWorkspace::new().unwrap();
        assert_ne!(a.path(), b.path());
    }
}
