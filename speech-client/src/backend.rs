use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

/// A single text-to-speech request
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    /// Backend voice identifier (e.g. `el-GR-NestorasNeural`)
    pub voice: String,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: voice.into(),
        }
    }
}

/// Trait for speech backends
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Synthesize the request and write the encoded audio to `output_path`
    async fn speak(&self, request: &SpeechRequest, output_path: &Path) -> Result<()>;

    /// Get the backend name for display
    fn name(&self) -> &'static str;

    /// Check if the backend is usable (CLI installed, etc.)
    fn is_available(&self) -> Result<()>;
}
