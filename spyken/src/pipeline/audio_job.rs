//! Audio mode: one MP3 of every paragraph that could be spoken.

use super::narration::Narrator;
use super::progress::ProgressReporter;
use super::workspace::JobWorkspace;
use super::{JobSummary, Pipeline};
use crate::error::Result;
use crate::text::TextUnit;
use crate::voice::VoiceAssigner;
use std::path::Path;

pub async fn run(
    pipeline: &Pipeline,
    units: &[TextUnit],
    workspace: &JobWorkspace,
    output: &Path,
    progress: &mut ProgressReporter<'_>,
) -> Result<JobSummary> {
    let total = units.len();
    let mut narrator = Narrator::new(
        &pipeline.synthesizer,
        pipeline.assembler(),
        VoiceAssigner::new(pipeline.config.voices.clone()),
        pipeline.config.max_chunk_chars,
        workspace.path(),
    );

    let mut paragraphs = Vec::with_capacity(total);
    for (i, unit) in units.iter().enumerate() {
        let narrated = narrator.narrate(i, unit).await?;
        progress.report(i + 1, format!("Narrated paragraph {}/{}", i + 1, total));
        paragraphs.push(narrated.audio);
        tokio::task::yield_now().await;
    }

    let silent_units = paragraphs.iter().filter(|p| !p.has_audio()).count();
    let written = narrator
        .assembler()
        .combine_paragraphs_to_file(&paragraphs, output)
        .await?;
    log::info!(
        "Wrote {} of {} paragraphs to {}",
        written,
        total,
        output.display()
    );
    progress.report(total + 1, format!("Saved {}", output.display()));

    Ok(JobSummary {
        units: total,
        silent_units,
    })
}
