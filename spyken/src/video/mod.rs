//! Timed clips and their encoding into a video file.

pub mod clip;
pub mod encoder;

pub use clip::TimedClip;
pub use encoder::{FfmpegEncoder, VideoEncoder};
