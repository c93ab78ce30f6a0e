//! Paragraph and file level audio assembly.

pub mod assembler;
pub mod probe;

pub use assembler::{AudioAssembler, ParagraphAudio};
pub use probe::{DurationProbe, FfprobeProbe};
