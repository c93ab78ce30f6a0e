//! Locating the external programs the pipeline shells out to.

use crate::config::ToolPaths;
use std::path::{Path, PathBuf};

/// Resolved paths of ffmpeg, ffprobe and pdftoppm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTools {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub pdftoppm: PathBuf,
}

impl ExternalTools {
    /// Prefer configured paths, then `PATH`, then the bare program name.
    pub fn resolve(paths: &ToolPaths) -> Self {
        Self {
            ffmpeg: resolve_tool(paths.ffmpeg.as_deref(), "ffmpeg"),
            ffprobe: resolve_tool(paths.ffprobe.as_deref(), "ffprobe"),
            pdftoppm: resolve_tool(paths.pdftoppm.as_deref(), "pdftoppm"),
        }
    }
}

fn resolve_tool(configured: Option<&Path>, name: &str) -> PathBuf {
    if let Some(path) = configured {
        if path.exists() {
            return path.to_path_buf();
        }
        log::warn!("Configured {} not found at {}, searching PATH", name, path.display());
    }

    which::which(name).unwrap_or_else(|_| PathBuf::from(name))
}

/// Check that a program runs with `-version` (ffmpeg, ffprobe) or `-v` (poppler).
pub async fn is_runnable(program: &Path, version_flag: &str) -> bool {
    tokio::process::Command::new(program)
        .arg(version_flag)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_configured_path_wins_when_present() {
        let dir = TempDir::new().unwrap();
        let fake = dir.path().join("my-ffmpeg");
        std::fs::write(&fake, b"").unwrap();

        let paths = ToolPaths {
            ffmpeg: Some(fake.clone()),
            ..ToolPaths::default()
        };
        let tools = ExternalTools::resolve(&paths);
        assert_eq!(tools.ffmpeg, fake);
    }

    #[test]
    fn test_missing_configured_path_falls_back() {
        let paths = ToolPaths {
            pdftoppm: Some(PathBuf::from("/definitely/not/here/pdftoppm")),
            ..ToolPaths::default()
        };
        let tools = ExternalTools::resolve(&paths);
        assert_ne!(tools.pdftoppm, PathBuf::from("/definitely/not/here/pdftoppm"));
        assert!(tools.pdftoppm.ends_with("pdftoppm"));
    }

    #[tokio::test]
    async fn test_missing_program_is_not_runnable() {
        assert!(!is_runnable(Path::new("/definitely/not/here/ffmpeg"), "-version").await);
    }
}
