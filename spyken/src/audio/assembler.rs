//! Audio assembly by raw byte concatenation.
//!
//! Chunk artifacts are MP3 streams from the same backend and voice family, so
//! appending them frame-for-frame produces a playable file without
//! re-encoding.

use super::probe::DurationProbe;
use crate::error::{ConvertError, Result};
use crate::tts::SynthesisResult;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// The combined audio of one text unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphAudio {
    pub unit_index: usize,
    /// Absent when no chunk of the unit was synthesized
    pub combined: Option<PathBuf>,
    pub duration_seconds: f64,
}

impl ParagraphAudio {
    /// Placeholder for a unit that produced no audio.
    pub fn silent(unit_index: usize, duration_seconds: f64) -> Self {
        Self {
            unit_index,
            combined: None,
            duration_seconds,
        }
    }

    pub fn has_audio(&self) -> bool {
        self.combined.is_some()
    }
}

/// Concatenates chunk artifacts and accounts for their durations.
#[derive(Clone)]
pub struct AudioAssembler {
    probe: Arc<dyn DurationProbe>,
    /// Used for silent units and for artifacts that cannot be measured
    default_secs: f64,
}

impl AudioAssembler {
    pub fn new(probe: Arc<dyn DurationProbe>, default_secs: f64) -> Self {
        Self { probe, default_secs }
    }

    pub fn default_secs(&self) -> f64 {
        self.default_secs
    }

    /// Join the successful chunk artifacts of one unit, in chunk order, into `output`.
    pub async fn combine_chunks(
        &self,
        unit_index: usize,
        results: &[SynthesisResult],
        output: &Path,
    ) -> Result<ParagraphAudio> {
        let mut artifacts: Vec<(usize, &Path)> = results
            .iter()
            .filter(|r| r.succeeded)
            .filter_map(|r| r.artifact.as_deref().map(|p| (r.chunk.chunk_index, p)))
            .collect();
        artifacts.sort_by_key(|(index, _)| *index);

        if artifacts.is_empty() {
            return Ok(ParagraphAudio::silent(unit_index, self.default_secs));
        }

        let mut duration_seconds = 0.0;
        for (_, path) in &artifacts {
            duration_seconds += match self.probe.duration_seconds(path).await {
                Some(secs) => secs,
                None => {
                    log::debug!(
                        "Could not measure {}, assuming {:.1}s",
                        path.display(),
                        self.default_secs
                    );
                    self.default_secs
                }
            };
        }

        let paths: Vec<&Path> = artifacts.iter().map(|(_, p)| *p).collect();
        concatenate_files(&paths, output).await?;

        Ok(ParagraphAudio {
            unit_index,
            combined: Some(output.to_path_buf()),
            duration_seconds,
        })
    }

    /// Write every unit's audio, in unit order, into one file.
    ///
    /// Silent units are left out rather than padded. Returns the number of
    /// units written.
    pub async fn combine_paragraphs_to_file(
        &self,
        paragraphs: &[ParagraphAudio],
        output: &Path,
    ) -> Result<usize> {
        let mut ordered: Vec<&ParagraphAudio> = paragraphs.iter().collect();
        ordered.sort_by_key(|p| p.unit_index);

        let paths: Vec<&Path> = ordered.iter().filter_map(|p| p.combined.as_deref()).collect();
        if paths.is_empty() {
            return Err(ConvertError::NothingSynthesized(paragraphs.len()));
        }

        concatenate_files(&paths, output).await?;
        Ok(paths.len())
    }
}

/// Append the raw bytes of `inputs` to a fresh `output` file.
async fn concatenate_files(inputs: &[&Path], output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let mut file = tokio::fs::File::create(output).await?;
    for input in inputs {
        let bytes = tokio::fs::read(input).await?;
        file.write_all(&bytes).await?;
    }
    file.flush().await?;

    Ok(())
}
