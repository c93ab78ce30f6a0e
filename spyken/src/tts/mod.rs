//! Speech synthesis for text chunks, on top of a `speech_client` backend.

mod synthesizer;

pub use synthesizer::SpeechSynthesizer;

use crate::config::SynthesisSettings;
use crate::text::Chunk;
use std::path::PathBuf;
use std::time::Duration;

/// How often and how patiently to retry one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Fixed wait between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &SynthesisSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            backoff: Duration::from_millis(settings.retry_backoff_ms),
        }
    }
}

/// Outcome of synthesizing one chunk. `artifact` is set only on success.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    pub chunk: Chunk,
    pub artifact: Option<PathBuf>,
    pub succeeded: bool,
}

impl SynthesisResult {
    pub fn success(chunk: Chunk, artifact: PathBuf) -> Self {
        Self {
            chunk,
            artifact: Some(artifact),
            succeeded: true,
        }
    }

    pub fn failure(chunk: Chunk) -> Self {
        Self {
            chunk,
            artifact: None,
            succeeded: false,
        }
    }
}
