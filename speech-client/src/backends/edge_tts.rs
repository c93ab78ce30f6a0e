//! edge-tts provider
//!
//! Drives the `edge-tts` command-line tool as a subprocess. Each call writes one
//! MP3 file for one piece of text.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::backend::{SpeechBackend, SpeechRequest};
use crate::config::BackendConfig;
use crate::error::{Result, SpeechError};

/// Backend that shells out to the edge-tts CLI
pub struct EdgeTtsBackend {
    cli_path: PathBuf,
    rate: Option<String>,
    volume: Option<String>,
}

impl EdgeTtsBackend {
    /// Create a new edge-tts backend
    ///
    /// Returns an error if the edge-tts CLI is not found.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let cli_path = match config.cli_path {
            Some(path) => {
                if !path.exists() {
                    return Err(SpeechError::BackendUnavailable(format!(
                        "edge-tts not found at specified path: {}",
                        path.display()
                    )));
                }
                path
            }
            None => which::which("edge-tts").map_err(|_| {
                SpeechError::BackendUnavailable(
                    "edge-tts not found. Install it with `pip install edge-tts`".into(),
                )
            })?,
        };

        Ok(Self {
            cli_path,
            rate: config.rate,
            volume: config.volume,
        })
    }

    fn build_args(&self, request: &SpeechRequest, output_path: &Path) -> Vec<String> {
        // Values may start with '-', so they must be glued to the flag
        let mut args = vec![
            format!("--voice={}", request.voice),
            format!("--text={}", request.text),
            format!("--write-media={}", output_path.display()),
        ];
        if let Some(rate) = &self.rate {
            args.push(format!("--rate={}", rate));
        }
        if let Some(volume) = &self.volume {
            args.push(format!("--volume={}", volume));
        }
        args
    }
}

#[async_trait]
impl SpeechBackend for EdgeTtsBackend {
    async fn speak(&self, request: &SpeechRequest, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let output = Command::new(&self.cli_path)
            .args(self.build_args(request, output_path))
            .output()
            .await
            .map_err(|e| SpeechError::Cli(format!("Failed to execute: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr.trim().to_string();
            if message.contains("429") || message.to_lowercase().contains("too many requests") {
                return Err(SpeechError::RateLimited { retry_after: None });
            }
            return Err(SpeechError::Backend {
                message,
                exit_code: output.status.code(),
            });
        }

        log::debug!(
            "edge-tts wrote {} ({} chars, voice {})",
            output_path.display(),
            request.text.chars().count(),
            request.voice
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "edge-tts"
    }

    fn is_available(&self) -> Result<()> {
        // Availability was checked in constructor
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_with(rate: Option<&str>, volume: Option<&str>) -> EdgeTtsBackend {
        EdgeTtsBackend {
            cli_path: PathBuf::from("edge-tts"),
            rate: rate.map(str::to_string),
            volume: volume.map(str::to_string),
        }
    }

    #[test]
    fn test_build_args_basic() {
        let backend = backend_with(None, None);
        let request = SpeechRequest::new("Καλημέρα", "el-GR-AthinaNeural");
        let args = backend.build_args(&request, Path::new("/tmp/out.mp3"));
        assert_eq!(
            args,
            vec![
                "--voice=el-GR-AthinaNeural",
                "--text=Καλημέρα",
                "--write-media=/tmp/out.mp3"
            ]
        );
    }

    #[test]
    fn test_build_args_text_starting_with_dash() {
        let backend = backend_with(None, None);
        let request = SpeechRequest::new("-abc", "en-GB-RyanNeural");
        let args = backend.build_args(&request, Path::new("out.mp3"));
        assert_eq!(args[1], "--text=-abc");
        assert!(!args.contains(&"-abc".to_string()));
    }

    #[test]
    fn test_build_args_negative_rate_is_glued() {
        let backend = backend_with(Some("-10%"), Some("+5%"));
        let request = SpeechRequest::new("Hello", "en-GB-RyanNeural");
        let args = backend.build_args(&request, Path::new("out.mp3"));
        assert!(args.contains(&"--rate=-10%".to_string()));
        assert!(args.contains(&"--volume=+5%".to_string()));
    }

    #[test]
    fn test_missing_explicit_path() {
        let config = BackendConfig {
            cli_path: Some(PathBuf::from("/nope/edge-tts")),
            ..Default::default()
        };
        let err = EdgeTtsBackend::new(config).err().unwrap();
        assert!(err.to_string().contains("/nope/edge-tts"));
    }
}
