//! Video mode: one clip per paragraph, each frame held for its narration.

use super::narration::Narrator;
use super::progress::ProgressReporter;
use super::workspace::JobWorkspace;
use super::{JobSummary, Pipeline};
use crate::document::Document;
use crate::error::Result;
use crate::render::FrameRenderer;
use crate::text::TextUnit;
use crate::video::TimedClip;
use crate::voice::VoiceAssigner;
use std::path::Path;

/// Progress steps for `units` paragraphs: narrate and render each, then encode.
pub fn total_steps(units: usize) -> usize {
    2 * units + 1
}

pub async fn run(
    pipeline: &Pipeline,
    document: &Document,
    units: &[TextUnit],
    workspace: &JobWorkspace,
    output: &Path,
    progress: &mut ProgressReporter<'_>,
) -> Result<JobSummary> {
    let total = units.len();
    let default_secs = pipeline.config.default_clip_secs;
    let mut narrator = Narrator::new(
        &pipeline.synthesizer,
        pipeline.assembler(),
        VoiceAssigner::new(pipeline.config.voices.clone()),
        pipeline.config.max_chunk_chars,
        workspace.path(),
    );
    let mut renderer = FrameRenderer::new(
        &pipeline.config.video,
        pipeline.painter.clone(),
        pipeline.rasterizer.clone(),
    );

    let mut clips = Vec::with_capacity(total);
    for (i, unit) in units.iter().enumerate() {
        let narrated = narrator.narrate(i, unit).await?;
        progress.report(2 * i + 1, format!("Narrated paragraph {}/{}", i + 1, total));

        let frame = renderer.render(document, unit, i, total, workspace.path()).await?;
        progress.report(2 * i + 2, format!("Rendered frame {}/{}", i + 1, total));

        let measured = match &narrated.audio.combined {
            Some(path) => pipeline.probe.duration_seconds(path).await,
            None => None,
        };
        clips.push(TimedClip::pair(frame, &narrated.audio, measured, default_secs));

        tokio::task::yield_now().await;
    }

    let silent_units = clips.iter().filter(|c| c.is_silent()).count();
    let encode_step = 2 * total;
    progress.note("Encoding video");

    let mut last_percent = 0;
    let mut on_encode = |fraction: f32| {
        let percent = (fraction * 100.0).round() as u32;
        if percent != last_percent {
            last_percent = percent;
            progress.report(encode_step, format!("Encoding video {}%", percent));
        }
    };

    let encoded = pipeline
        .encoder
        .encode(&clips, pipeline.config.video.fps, output, &mut on_encode)
        .await;
    if let Err(e) = encoded {
        if tokio::fs::try_exists(output).await.unwrap_or(false) {
            let _ = tokio::fs::remove_file(output).await;
        }
        return Err(e);
    }

    progress.report(total_steps(total), format!("Saved {}", output.display()));
    Ok(JobSummary {
        units: total,
        silent_units,
    })
}
