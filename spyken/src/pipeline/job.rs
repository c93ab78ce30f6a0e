//! Conversion job state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What to produce from a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Audio,
    Video,
}

impl Mode {
    pub fn extension(&self) -> &'static str {
        match self {
            Mode::Audio => "mp3",
            Mode::Video => "mp4",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Failed,
}

/// One input file in one batch.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub mode: Mode,
    pub status: JobStatus,
    /// (current, total)
    pub progress: (usize, usize),
}

impl ConversionJob {
    /// Output goes next to the input, or into `output_dir`, with the mode's extension.
    pub fn new(input: &Path, mode: Mode, output_dir: Option<&Path>) -> Self {
        let output = match (output_dir, input.file_name()) {
            (Some(dir), Some(name)) => dir.join(name).with_extension(mode.extension()),
            _ => input.with_extension(mode.extension()),
        };

        Self {
            input: input.to_path_buf(),
            output,
            mode,
            status: JobStatus::Pending,
            progress: (0, 0),
        }
    }

    pub fn start(&mut self) {
        self.status = JobStatus::Running;
    }

    pub fn set_progress(&mut self, current: usize, total: usize) {
        self.progress = (current, total);
    }

    pub fn finish(&mut self) {
        self.status = JobStatus::Done;
    }

    pub fn fail(&mut self) {
        self.status = JobStatus::Failed;
    }
}
