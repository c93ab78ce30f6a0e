//! Audio duration measurement.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Reads the playing time of an audio file.
///
/// Returns `None` when the file cannot be measured; callers substitute their
/// own default.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    async fn duration_seconds(&self, path: &Path) -> Option<f64>;
}

/// Measures durations with `ffprobe -show_entries format=duration`.
pub struct FfprobeProbe {
    program: PathBuf,
}

impl FfprobeProbe {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }
}

#[async_trait]
impl DurationProbe for FfprobeProbe {
    async fn duration_seconds(&self, path: &Path) -> Option<f64> {
        let output = tokio::process::Command::new(&self.program)
            .args([
                "-v",
                "quiet",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                log::debug!("Failed to run ffprobe on {}: {}", path.display(), e);
                return None;
            }
        };

        if !output.status.success() {
            log::debug!(
                "ffprobe failed on {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return None;
        }

        parse_duration(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse ffprobe's bare duration output ("12.345000" or "N/A").
fn parse_duration(stdout: &str) -> Option<f64> {
    stdout
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
}

/// Probe returning a fixed answer for every file.
#[cfg(test)]
pub(crate) struct FixedProbe(pub Option<f64>);

#[cfg(test)]
#[async_trait]
impl DurationProbe for FixedProbe {
    async fn duration_seconds(&self, _path: &Path) -> Option<f64> {
        self.0
    }
}
