//! spyken configuration management.
//!
//! The loaded [`SpykenConfig`] is passed by reference into the pipeline; nothing
//! reads voices, canvas size or limits from global state.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_MAX_CHUNK_CHARS: usize = crate::text::chunker::DEFAULT_MAX_CHARS;
const DEFAULT_CLIP_SECS: f64 = 3.0;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpykenConfig {
    /// Longest piece of text sent to the speech backend in one call
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Duration used when a paragraph or artifact has no measurable audio
    #[serde(default = "default_clip_secs")]
    pub default_clip_secs: f64,

    #[serde(default)]
    pub voices: VoiceTable,

    #[serde(default)]
    pub synthesis: SynthesisSettings,

    #[serde(default)]
    pub video: VideoSettings,

    #[serde(default)]
    pub tools: ToolPaths,
}

/// Neural voice per (language family, gender).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceTable {
    #[serde(default = "default_greek_male")]
    pub greek_male: String,
    #[serde(default = "default_greek_female")]
    pub greek_female: String,
    #[serde(default = "default_english_male")]
    pub english_male: String,
    #[serde(default = "default_english_female")]
    pub english_female: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisSettings {
    /// Speech backend name. None defers to `default_backend` in speech.toml.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,

    /// Attempts per chunk, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed wait between attempts
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSettings {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_fps")]
    pub fps: u32,

    /// TTF/OTF font used for generated frames. None tries common system fonts.
    #[serde(default)]
    pub font_path: Option<PathBuf>,

    /// Footer text on generated frames
    #[serde(default = "default_caption")]
    pub caption: String,
}

/// Explicit locations of external tools. None means look them up in PATH.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolPaths {
    #[serde(default)]
    pub ffmpeg: Option<PathBuf>,
    #[serde(default)]
    pub ffprobe: Option<PathBuf>,
    #[serde(default)]
    pub pdftoppm: Option<PathBuf>,
}

fn default_max_chunk_chars() -> usize {
    DEFAULT_MAX_CHUNK_CHARS
}

fn default_clip_secs() -> f64 {
    DEFAULT_CLIP_SECS
}

fn default_greek_male() -> String {
    "el-GR-NestorasNeural".to_string()
}

fn default_greek_female() -> String {
    "el-GR-AthinaNeural".to_string()
}

fn default_english_male() -> String {
    "en-GB-RyanNeural".to_string()
}

fn default_english_female() -> String {
    "en-GB-SoniaNeural".to_string()
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_retry_backoff_ms() -> u64 {
    DEFAULT_RETRY_BACKOFF_MS
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_fps() -> u32 {
    10
}

fn default_caption() -> String {
    "Spyken - Document to Speech".to_string()
}

impl Default for VoiceTable {
    fn default() -> Self {
        Self {
            greek_male: default_greek_male(),
            greek_female: default_greek_female(),
            english_male: default_english_male(),
            english_female: default_english_female(),
        }
    }
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            backend: None,
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            font_path: None,
            caption: default_caption(),
        }
    }
}

impl Default for SpykenConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
            default_clip_secs: default_clip_secs(),
            voices: VoiceTable::default(),
            synthesis: SynthesisSettings::default(),
            video: VideoSettings::default(),
            tools: ToolPaths::default(),
        }
    }
}

impl SpykenConfig {
    /// Get the config file path: ~/.config/cli-programs/spyken.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(home.join(".config").join("cli-programs").join("spyken.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: SpykenConfig = toml::from_str(&content)?;
        Ok(config.sanitized())
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Clamp values that would make the pipeline loop or divide by zero.
    pub fn sanitized(mut self) -> Self {
        self.max_chunk_chars = self.max_chunk_chars.max(16);
        self.synthesis.max_attempts = self.synthesis.max_attempts.max(1);
        self.video.fps = self.video.fps.max(1);
        self.video.width = self.video.width.max(64);
        self.video.height = self.video.height.max(64);
        if !(self.default_clip_secs > 0.0) {
            self.default_clip_secs = DEFAULT_CLIP_SECS;
        }
        self
    }
}
