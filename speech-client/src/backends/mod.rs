//! Speech backend implementations

mod edge_tts;
pub mod mock;

pub use edge_tts::EdgeTtsBackend;
pub use mock::MockBackend;

use crate::backend::SpeechBackend;
use crate::config::BackendConfig;
use crate::error::{Result, SpeechError};

/// Supported backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    EdgeTts,
}

impl BackendKind {
    /// Parse backend kind from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "edge-tts" | "edge_tts" | "edgetts" | "edge" => Ok(Self::EdgeTts),
            _ => Err(SpeechError::Config(format!("Unknown speech backend: {}", s))),
        }
    }
}

/// Create a backend instance by name with optional config
pub fn get_backend(
    name: &str,
    backend_config: Option<&BackendConfig>,
) -> Result<Box<dyn SpeechBackend>> {
    match BackendKind::from_str(name)? {
        BackendKind::EdgeTts => {
            let config = backend_config.cloned().unwrap_or_default();
            Ok(Box::new(EdgeTtsBackend::new(config)?))
        }
    }
}
