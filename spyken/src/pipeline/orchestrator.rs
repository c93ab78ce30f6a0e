//! Batch driver: files one after another, each failure contained to its file.

use super::job::{ConversionJob, JobStatus, Mode};
use super::progress::{Progress, ProgressReporter};
use super::workspace::JobWorkspace;
use super::{JobSummary, Pipeline, audio_job, video_job};
use crate::document::{self, Document};
use crate::error::{ConvertError, Result};
use crate::text::{self, TextUnit};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Result of one file in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub input: PathBuf,
    /// Set when the output was written
    pub output: Option<PathBuf>,
    pub mode: Mode,
    pub status: JobStatus,
    pub error: Option<String>,
    pub units: usize,
    pub silent_units: usize,
}

impl FileOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == JobStatus::Done
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Receives job lifecycle events, e.g. to drive a progress display.
pub trait JobObserver: Send {
    fn job_started(&mut self, _job: &ConversionJob) {}
    fn job_progress(&mut self, _job: &ConversionJob, _progress: &Progress) {}
    fn job_finished(&mut self, _outcome: &FileOutcome) {}
}

/// Drop repeated inputs, keeping the first occurrence and the given order.
pub fn dedup_inputs(inputs: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    inputs
        .into_iter()
        .filter(|p| seen.insert(std::fs::canonicalize(p).unwrap_or_else(|_| p.clone())))
        .collect()
}

pub struct Orchestrator {
    pipeline: Pipeline,
}

impl Orchestrator {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    /// Convert every input in order. Never fails as a whole; each file's
    /// error is recorded in its outcome.
    pub async fn run_batch(
        &self,
        inputs: &[PathBuf],
        mode: Mode,
        output_dir: Option<&Path>,
        observer: &mut dyn JobObserver,
    ) -> BatchReport {
        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(inputs.len());

        for (i, input) in inputs.iter().enumerate() {
            log::info!("[{}/{}] Converting {}", i + 1, inputs.len(), input.display());

            let mut job = ConversionJob::new(input, mode, output_dir);
            job.start();
            observer.job_started(&job);

            let result = self.convert(&mut job, observer).await;
            let outcome = match result {
                Ok(summary) => {
                    job.finish();
                    log::info!("Finished {} -> {}", input.display(), job.output.display());
                    outcome_of(&job, Some(summary), None)
                }
                Err(e) => {
                    job.fail();
                    log::error!("Failed {}: {}", input.display(), e);
                    outcome_of(&job, None, Some(e.to_string()))
                }
            };

            observer.job_finished(&outcome);
            outcomes.push(outcome);
        }

        BatchReport {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        }
    }

    /// Run one job inside its own workspace, which is removed whatever happens.
    async fn convert(&self, job: &mut ConversionJob, observer: &mut dyn JobObserver) -> Result<JobSummary> {
        let workspace = JobWorkspace::new()?;
        let result = self.convert_in(job, &workspace, observer).await;
        workspace.close();
        result
    }

    async fn convert_in(
        &self,
        job: &mut ConversionJob,
        workspace: &JobWorkspace,
        observer: &mut dyn JobObserver,
    ) -> Result<JobSummary> {
        let (document, units) = extract_units(&job.input).await?;

        if let Some(parent) = job.output.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let total = match job.mode {
            Mode::Audio => units.len() + 1,
            Mode::Video => video_job::total_steps(units.len()),
        };

        let snapshot = job.clone();
        let mut sink = |p: Progress| {
            let mut view = snapshot.clone();
            view.set_progress(p.current, p.total);
            observer.job_progress(&view, &p);
        };
        let mut progress = ProgressReporter::new(total, &mut sink);
        progress.report(0, format!("Extracted {} paragraphs", units.len()));

        let output = job.output.clone();
        let summary = match job.mode {
            Mode::Audio => audio_job::run(&self.pipeline, &units, workspace, &output, &mut progress).await?,
            Mode::Video => {
                video_job::run(&self.pipeline, &document, &units, workspace, &output, &mut progress).await?
            }
        };

        let last = (progress.current(), progress.total());
        drop(progress);
        job.set_progress(last.0, last.1);
        Ok(summary)
    }
}

/// Read the document off the async threads and filter it down to speakable units.
async fn extract_units(input: &Path) -> Result<(Document, Vec<TextUnit>)> {
    let path = input.to_path_buf();
    let document = tokio::task::spawn_blocking(move || document::extract(&path))
        .await
        .map_err(|e| ConvertError::Document(format!("reader task failed: {}", e)))??;

    let units = text::units_from_blocks(document.blocks.clone());
    if units.is_empty() {
        return Err(ConvertError::ExtractionEmpty(input.display().to_string()));
    }
    log::info!(
        "{}: {} paragraphs ({} blocks read)",
        input.display(),
        units.len(),
        document.blocks.len()
    );
    Ok((document, units))
}

fn outcome_of(job: &ConversionJob, summary: Option<JobSummary>, error: Option<String>) -> FileOutcome {
    let summary = summary.unwrap_or_default();
    FileOutcome {
        input: job.input.clone(),
        output: (job.status == JobStatus::Done).then(|| job.output.clone()),
        mode: job.mode,
        status: job.status,
        error,
        units: summary.units,
        silent_units: summary.silent_units,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::probe::FixedProbe;
    use crate::config::{SpykenConfig, VideoSettings};
    use crate::document::fixtures::{write_docx, write_pdf};
    use crate::render::TextPainter;
    use crate::render::testing::BlankPages;
    use crate::tts::{RetryPolicy, SpeechSynthesizer};
    use crate::video::encoder::testing::RecordingEncoder;
    use speech_client::MockBackend;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    const PAYLOAD: &[u8] = b"MP3DATA-";

    #[derive(Default)]
    struct Recorder {
        started: usize,
        progress: Vec<Progress>,
        finished: Vec<FileOutcome>,
    }

    impl JobObserver for Recorder {
        fn job_started(&mut self, _job: &ConversionJob) {
            self.started += 1;
        }
        fn job_progress(&mut self, _job: &ConversionJob, progress: &Progress) {
            self.progress.push(progress.clone());
        }
        fn job_finished(&mut self, outcome: &FileOutcome) {
            self.finished.push(outcome.clone());
        }
    }

    fn test_config() -> SpykenConfig {
        let mut config = SpykenConfig::default();
        config.synthesis.retry_backoff_ms = 0;
        config.video = VideoSettings {
            width: 320,
            height: 180,
            ..VideoSettings::default()
        };
        config
    }

    fn orchestrator(backend: Arc<MockBackend>, encoder: Arc<RecordingEncoder>, probe: Option<f64>) -> Orchestrator {
        let config = test_config();
        let synthesizer = SpeechSynthesizer::new(backend, RetryPolicy::from_settings(&config.synthesis));
        Orchestrator::new(Pipeline {
            config,
            synthesizer,
            probe: Arc::new(FixedProbe(probe)),
            painter: Arc::new(TextPainter::Bitmap),
            rasterizer: Some(Arc::new(BlankPages::new(false)) as Arc<dyn crate::render::PageRasterizer>),
            encoder,
        })
    }

    #[tokio::test]
    async fn test_docx_to_mp3_keeps_paragraph_order() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("story.docx");
        write_docx(&input, &["First paragraph.", "Second paragraph.", "Third paragraph."]);

        let backend = Arc::new(MockBackend::always_succeeds().with_payload(PAYLOAD.to_vec()));
        let orch = orchestrator(backend.clone(), Arc::new(RecordingEncoder::default()), Some(1.0));
        let mut recorder = Recorder::default();

        let report = orch.run_batch(&[input.clone()], Mode::Audio, None, &mut recorder).await;

        assert_eq!(report.succeeded(), 1);
        let outcome = &report.outcomes[0];
        assert_eq!(outcome.units, 3);
        assert_eq!(outcome.silent_units, 0);
        let output = outcome.output.clone().unwrap();
        assert_eq!(output, dir.path().join("story.mp3"));
        assert_eq!(std::fs::read(&output).unwrap(), PAYLOAD.repeat(3));

        let texts: Vec<String> = backend.calls().into_iter().map(|c| c.text).collect();
        assert_eq!(texts, vec!["First paragraph.", "Second paragraph.", "Third paragraph."]);

        assert_eq!(recorder.started, 1);
        assert_eq!(recorder.finished.len(), 1);
        let currents: Vec<usize> = recorder.progress.iter().map(|p| p.current).collect();
        assert!(currents.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(recorder.progress.last().unwrap().current, 4);
    }

    #[tokio::test]
    async fn test_pdf_short_block_is_dropped() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("page.pdf");
        write_pdf(
            &input,
            &[vec![
                (72.0, 700.0, 12.0, "A full sentence of body text."),
                (300.0, 40.0, 12.0, "ab"),
            ]],
        );

        let (document, units) = extract_units(&input).await.unwrap();
        assert_eq!(document.blocks.len(), 2);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].content, "A full sentence of body text.");
        assert_eq!(units[0].source.unwrap().page_index, 0);
    }

    #[tokio::test]
    async fn test_video_with_failed_paragraph() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("talk.docx");
        write_docx(&input, &["Opening remarks.", "Second BROKEN part.", "Closing words."]);

        let backend = Arc::new(MockBackend::always_succeeds().failing_on("BROKEN"));
        let encoder = Arc::new(RecordingEncoder::default());
        let orch = orchestrator(backend.clone(), encoder.clone(), Some(2.0));
        let mut recorder = Recorder::default();

        let report = orch.run_batch(&[input.clone()], Mode::Video, None, &mut recorder).await;

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.outcomes[0].silent_units, 1);
        assert_eq!(report.outcomes[0].output, Some(dir.path().join("talk.mp4")));

        let encoded = encoder.encoded.lock().unwrap();
        let (clips, fps) = &encoded[0];
        assert_eq!(*fps, 10);
        assert_eq!(clips.len(), 3);
        assert_eq!(clips[0].duration, 2.0);
        assert!(clips[1].audio.is_none());
        assert_eq!(clips[1].duration, 3.0);
        assert!(clips[2].audio.is_some());

        let calls = backend.calls();
        assert_eq!(calls.len(), 1 + 3 + 1);
        assert_eq!(calls[0].voice, "en-GB-RyanNeural");
        assert!(calls[1..4].iter().all(|c| c.voice == "en-GB-SoniaNeural"));
        // the paragraph after the silent one takes the slot the silent one would have had
        assert_eq!(calls[4].voice, "en-GB-SoniaNeural");

        assert_eq!(recorder.progress.last().unwrap().current, 7);
    }

    #[tokio::test]
    async fn test_pdf_video_renders_pages() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("slides.pdf");
        write_pdf(
            &input,
            &[
                vec![(72.0, 700.0, 12.0, "Slide one text.")],
                vec![(72.0, 700.0, 12.0, "Slide two text.")],
            ],
        );

        let backend = Arc::new(MockBackend::always_succeeds());
        let encoder = Arc::new(RecordingEncoder::default());
        let orch = orchestrator(backend, encoder.clone(), Some(1.5));

        let report = orch
            .run_batch(&[input], Mode::Video, Some(&dir.path().join("out")), &mut Recorder::default())
            .await;

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.outcomes[0].output, Some(dir.path().join("out").join("slides.mp4")));
        let encoded = encoder.encoded.lock().unwrap();
        assert_eq!(encoded[0].0.len(), 2);
    }

    #[tokio::test]
    async fn test_one_bad_file_does_not_stop_the_batch() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.docx");
        let empty = dir.path().join("empty.docx");
        let unsupported = dir.path().join("notes.txt");
        write_docx(&good, &["Some real text."]);
        write_docx(&empty, &["", "12", "?!"]);
        std::fs::write(&unsupported, "plain text").unwrap();

        let backend = Arc::new(MockBackend::always_succeeds());
        let orch = orchestrator(backend, Arc::new(RecordingEncoder::default()), None);

        let report = orch
            .run_batch(
                &[unsupported.clone(), empty.clone(), good.clone()],
                Mode::Audio,
                None,
                &mut Recorder::default(),
            )
            .await;

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 2);
        assert!(report.outcomes[0].error.as_deref().unwrap().contains(".txt"));
        assert!(report.outcomes[1].error.as_deref().unwrap().contains("No speakable text"));
        assert_eq!(report.outcomes[1].status, JobStatus::Failed);
        assert!(report.outcomes[2].succeeded());
        assert!(dir.path().join("good.mp3").exists());
    }

    #[tokio::test]
    async fn test_all_paragraphs_failing_fails_audio_job() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("doomed.docx");
        write_docx(&input, &["Nothing will be heard."]);

        let backend = Arc::new(MockBackend::always_succeeds().failing_on("heard"));
        let orch = orchestrator(backend, Arc::new(RecordingEncoder::default()), None);

        let report = orch.run_batch(&[input], Mode::Audio, None, &mut Recorder::default()).await;
        assert_eq!(report.failed(), 1);
        assert!(!dir.path().join("doomed.mp3").exists());
    }

    #[test]
    fn test_report_json() {
        let report = BatchReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            outcomes: vec![FileOutcome {
                input: PathBuf::from("a.docx"),
                output: Some(PathBuf::from("a.mp3")),
                mode: Mode::Audio,
                status: JobStatus::Done,
                error: None,
                units: 2,
                silent_units: 0,
            }],
        };
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["outcomes"][0]["status"], "done");
        assert_eq!(json["outcomes"][0]["mode"], "audio");
        assert_eq!(json["outcomes"][0]["units"], 2);
    }

    #[test]
    fn test_dedup_inputs_keeps_first_occurrence() {
        let inputs = vec![
            PathBuf::from("b.pdf"),
            PathBuf::from("a.docx"),
            PathBuf::from("b.pdf"),
        ];
        assert_eq!(dedup_inputs(inputs), vec![PathBuf::from("b.pdf"), PathBuf::from("a.docx")]);
    }
}
