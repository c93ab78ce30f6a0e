//! The paragraph-to-media pipeline and the batch orchestrator that drives it.

mod audio_job;
mod job;
mod narration;
mod orchestrator;
mod progress;
mod video_job;
mod workspace;

pub use job::{ConversionJob, Mode};
pub use orchestrator::{FileOutcome, JobObserver, Orchestrator, dedup_inputs};
pub use progress::Progress;

use crate::audio::{AudioAssembler, DurationProbe};
use crate::config::SpykenConfig;
use crate::render::{PageRasterizer, TextPainter};
use crate::tts::SpeechSynthesizer;
use crate::video::VideoEncoder;
use std::sync::Arc;

/// Configuration plus every external capability a job uses.
pub struct Pipeline {
    pub config: SpykenConfig,
    pub synthesizer: SpeechSynthesizer,
    pub probe: Arc<dyn DurationProbe>,
    pub painter: Arc<TextPainter>,
    /// None renders every frame as a text card
    pub rasterizer: Option<Arc<dyn PageRasterizer>>,
    pub encoder: Arc<dyn VideoEncoder>,
}

impl Pipeline {
    pub fn assembler(&self) -> AudioAssembler {
        AudioAssembler::new(self.probe.clone(), self.config.default_clip_secs)
    }
}

/// What a finished job produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobSummary {
    pub units: usize,
    /// Units with no audio at all
    pub silent_units: usize,
}
