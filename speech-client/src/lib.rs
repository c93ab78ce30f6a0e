//! Speech synthesis client library for the spyken workspace
//!
//! Provides a unified interface over text-to-speech backends:
//! - edge-tts (subprocess, Microsoft neural voices)
//! - Mock (scriptable, for tests)

pub mod backend;
pub mod backends;
pub mod config;
pub mod error;

pub use backend::{SpeechBackend, SpeechRequest};
pub use backends::{BackendKind, EdgeTtsBackend, MockBackend, get_backend};
pub use config::{BackendConfig, Config};
pub use error::{Result, SpeechError};
