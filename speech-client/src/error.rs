use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Speech backend not available: {0}")]
    BackendUnavailable(String),

    #[error("Rate limit exceeded{}", .retry_after.map(|s| format!(". Retry after {} seconds", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    #[error("Backend error{}: {message}", exit_code.map(|c| format!(" (exit {})", c)).unwrap_or_default())]
    Backend {
        message: String,
        exit_code: Option<i32>,
    },

    #[error("Backend produced an empty audio file: {0}")]
    EmptyOutput(String),

    #[error("edge-tts CLI error: {0}")]
    Cli(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, SpeechError>;
