//! Mock speech backend for testing
//!
//! Simulates flaky and failing synthesis: fail a number of times before
//! succeeding, always fail, produce empty files, or fail only for texts that
//! contain a marker. Every call is recorded.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::backend::{SpeechBackend, SpeechRequest};
use crate::error::{Result, SpeechError};

/// Default bytes written on success (looks like an MP3 frame header)
const DEFAULT_PAYLOAD: &[u8] = &[0xFF, 0xF3, 0x44, 0xC4, 0x00, 0x00, 0x00, 0x00];

/// A call the mock received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub text: String,
    pub voice: String,
}

/// A mock backend for testing retry and degradation behavior
pub struct MockBackend {
    /// Number of times to fail before succeeding (0 = always succeed)
    fail_count: AtomicUsize,
    /// Current call count
    call_count: AtomicUsize,
    /// Error to return on failure (None = always succeed)
    fail_with: Mutex<Option<SpeechError>>,
    /// Texts containing this marker always fail
    fail_marker: Option<String>,
    /// Bytes written to the output file on success
    payload: Vec<u8>,
    /// Calls received, in order
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockBackend {
    fn with_fail_count(n: usize, error: Option<SpeechError>) -> Self {
        Self {
            fail_count: AtomicUsize::new(n),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(error),
            fail_marker: None,
            payload: DEFAULT_PAYLOAD.to_vec(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a backend that fails `n` times with the given error, then succeeds
    pub fn fails_then_succeeds(n: usize, error: SpeechError) -> Self {
        Self::with_fail_count(n, Some(error))
    }

    /// Create a backend that always fails with the given error
    pub fn always_fails(error: SpeechError) -> Self {
        Self::with_fail_count(usize::MAX, Some(error))
    }

    /// Create a backend that always succeeds
    pub fn always_succeeds() -> Self {
        Self::with_fail_count(0, None)
    }

    /// Create a backend that reports success but writes a zero-byte file
    pub fn writes_empty_files() -> Self {
        Self::always_succeeds().with_payload(Vec::new())
    }

    /// Fail every request whose text contains `marker`
    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_marker = Some(marker.to_string());
        self
    }

    /// Set the bytes written on success
    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    /// Get the number of times speak() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Get the calls received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SpeechBackend for MockBackend {
    async fn speak(&self, request: &SpeechRequest, output_path: &Path) -> Result<()> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                text: request.text.clone(),
                voice: request.voice.clone(),
            });
        }

        if let Some(marker) = &self.fail_marker {
            if request.text.contains(marker.as_str()) {
                return Err(SpeechError::Backend {
                    message: format!("mock failure for text containing '{}'", marker),
                    exit_code: Some(1),
                });
            }
        }

        if call_num < self.fail_count.load(Ordering::SeqCst) {
            let error = self.fail_with.lock().ok().and_then(|e| e.as_ref().map(clone_error));
            if let Some(err) = error {
                return Err(err);
            }
        }

        tokio::fs::write(output_path, &self.payload).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }
}

/// Clone a SpeechError (needed because SpeechError doesn't implement Clone)
fn clone_error(err: &SpeechError) -> SpeechError {
    match err {
        SpeechError::BackendUnavailable(s) => SpeechError::BackendUnavailable(s.clone()),
        SpeechError::RateLimited { retry_after } => SpeechError::RateLimited {
            retry_after: *retry_after,
        },
        SpeechError::Backend { message, exit_code } => SpeechError::Backend {
            message: message.clone(),
            exit_code: *exit_code,
        },
        SpeechError::EmptyOutput(s) => SpeechError::EmptyOutput(s.clone()),
        SpeechError::Cli(s) => SpeechError::Cli(s.clone()),
        SpeechError::Config(s) => SpeechError::Config(s.clone()),
        // For Io and Toml errors, we create a generic error since they can't be cloned
        SpeechError::Io(_) => SpeechError::Cli("IO error (mock)".to_string()),
        SpeechError::TomlParse(_) => SpeechError::Config("TOML parse error (mock)".to_string()),
        SpeechError::TomlSerialize(_) => {
            SpeechError::Config("TOML serialize error (mock)".to_string())
        }
    }
}
