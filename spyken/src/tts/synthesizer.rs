//! Per-chunk synthesis with bounded, sequential retry.

use super::{RetryPolicy, SynthesisResult};
use crate::error::{ConvertError, Result};
use crate::text::Chunk;
use speech_client::{SpeechBackend, SpeechRequest};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Turns text chunks into audio files through a speech backend.
#[derive(Clone)]
pub struct SpeechSynthesizer {
    backend: Arc<dyn SpeechBackend>,
    policy: RetryPolicy,
}

impl SpeechSynthesizer {
    pub fn new(backend: Arc<dyn SpeechBackend>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    /// Synthesize one chunk into `output_path`, absorbing the failure.
    pub async fn synthesize(&self, chunk: &Chunk, voice_id: &str, output_path: &Path) -> SynthesisResult {
        match self.synthesize_with_retry(&chunk.text, voice_id, output_path).await {
            Ok(artifact) => SynthesisResult::success(chunk.clone(), artifact),
            Err(e) => {
                log::warn!(
                    "Giving up on chunk {} of paragraph {}: {}",
                    chunk.chunk_index + 1,
                    chunk.parent_unit_index + 1,
                    e
                );
                SynthesisResult::failure(chunk.clone())
            }
        }
    }

    /// Try up to `max_attempts` times, one attempt at a time.
    ///
    /// An attempt counts only if the backend returns without error and the
    /// output file exists and is non-empty.
    pub async fn synthesize_with_retry(
        &self,
        text: &str,
        voice_id: &str,
        output_path: &Path,
    ) -> Result<PathBuf> {
        let request = SpeechRequest::new(text, voice_id);
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.attempt(&request, output_path).await {
                Ok(()) => return Ok(output_path.to_path_buf()),
                Err(e) => {
                    log::debug!(
                        "Synthesis failed (attempt {}/{}) with {}: {}",
                        attempt,
                        max_attempts,
                        voice_id,
                        e
                    );
                    last_error = e;
                    discard_partial(output_path).await;
                }
            }

            if attempt < max_attempts && !self.policy.backoff.is_zero() {
                tokio::time::sleep(self.policy.backoff).await;
            }
        }

        Err(ConvertError::SynthesisFailure {
            attempts: max_attempts,
            message: last_error,
        })
    }

    async fn attempt(&self, request: &SpeechRequest, output_path: &Path) -> std::result::Result<(), String> {
        self.backend
            .speak(request, output_path)
            .await
            .map_err(|e| e.to_string())?;

        match tokio::fs::metadata(output_path).await {
            Ok(meta) if meta.len() > 0 => Ok(()),
            Ok(_) => Err(format!("backend wrote an empty file: {}", output_path.display())),
            Err(_) => Err(format!("backend produced no file: {}", output_path.display())),
        }
    }
}

async fn discard_partial(path: &Path) {
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            log::debug!("Could not remove partial output {}: {}", path.display(), e);
        }
    }
}
