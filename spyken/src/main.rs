//! spyken - Narrate PDF and DOCX documents as MP3 audio or MP4 video

mod audio;
mod config;
mod document;
mod error;
mod pipeline;
mod render;
mod text;
mod tools;
mod tts;
mod video;
mod voice;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use config::SpykenConfig;
use indicatif::{ProgressBar, ProgressStyle};
use pipeline::{ConversionJob, FileOutcome, JobObserver, Mode, Orchestrator, Pipeline, Progress};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tools::ExternalTools;

#[derive(Parser, Debug)]
#[command(name = "spyken")]
#[command(about = "Narrate PDF and DOCX documents as audio or video, alternating two voices", long_about = None)]
#[command(version)]
struct Args {
    /// Documents to convert (.pdf, .docx), processed in order
    files: Vec<PathBuf>,

    /// Produce an MP4 video instead of an MP3
    #[arg(long, default_value_t = false)]
    video: bool,

    /// Write outputs here instead of next to each input
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Write a JSON report of the batch to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set the voice used for one language and gender
    SetVoice {
        #[arg(value_enum)]
        family: FamilyArg,
        #[arg(value_enum)]
        gender: GenderArg,
        /// Backend voice name, e.g. en-GB-SoniaNeural
        voice: String,
    },
    /// Set the font used for generated video frames
    SetFont {
        /// Path to a TTF/OTF file
        path: PathBuf,
    },
    /// Set the maximum characters per synthesis request
    SetChunkSize {
        value: usize,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FamilyArg {
    Greek,
    English,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum GenderArg {
    Male,
    Female,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    if let Some(Commands::Config { action }) = &args.command {
        return handle_config_command(action);
    }

    if args.files.is_empty() {
        anyhow::bail!("No input files given. Run 'spyken --help' for usage.");
    }

    let inputs = pipeline::dedup_inputs(args.files.clone());
    if inputs.len() < args.files.len() {
        log::info!("Ignoring {} duplicate input(s)", args.files.len() - inputs.len());
    }

    let mode = if args.video { Mode::Video } else { Mode::Audio };
    let config = SpykenConfig::load().context("Failed to load configuration")?;
    let orchestrator = Orchestrator::new(build_pipeline(config, mode).await?);
    let mut observer = CliObserver::default();
    let report = orchestrator
        .run_batch(&inputs, mode, args.output_dir.as_deref(), &mut observer)
        .await;

    if let Some(path) = &args.report {
        let json = report.to_json().context("Failed to serialize report")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write report to {}", path.display()))?;
        log::info!("Report written to {}", path.display());
    }

    eprintln!("\n{} succeeded, {} failed", report.succeeded(), report.failed());
    if report.failed() > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Wire the configured speech backend and external tools into a pipeline.
async fn build_pipeline(config: SpykenConfig, mode: Mode) -> Result<Pipeline> {
    let speech_config = speech_client::Config::load().context("Failed to load speech backend configuration")?;
    let backend_name = speech_config
        .resolve_backend(config.synthesis.backend.as_deref())
        .to_string();
    let backend = speech_client::get_backend(&backend_name, speech_config.get_backend_config(&backend_name))
        .with_context(|| format!("Speech backend '{}' is not usable", backend_name))?;
    log::debug!("Speech backend: {}", backend.name());

    let tools = ExternalTools::resolve(&config.tools);
    if !tools::is_runnable(&tools.ffprobe, "-version").await {
        log::warn!(
            "ffprobe not found; paragraph durations will default to {:.1}s",
            config.default_clip_secs
        );
    }

    let (painter, rasterizer) = match mode {
        Mode::Audio => (render::TextPainter::Bitmap, None),
        Mode::Video => {
            if !tools::is_runnable(&tools.ffmpeg, "-version").await {
                anyhow::bail!(
                    "ffmpeg is required for video output but was not found (looked for {})",
                    tools.ffmpeg.display()
                );
            }
            let rasterizer: Option<Arc<dyn render::PageRasterizer>> =
                if tools::is_runnable(&tools.pdftoppm, "-v").await {
                    Some(Arc::new(render::PdftoppmRasterizer::new(tools.pdftoppm.clone())))
                } else {
                    log::warn!("pdftoppm not found; PDF pages will be shown as text frames");
                    None
                };
            (render::TextPainter::load(config.video.font_path.as_deref()), rasterizer)
        }
    };

    let synthesizer = tts::SpeechSynthesizer::new(
        Arc::from(backend),
        tts::RetryPolicy::from_settings(&config.synthesis),
    );

    Ok(Pipeline {
        synthesizer,
        probe: Arc::new(audio::FfprobeProbe::new(tools.ffprobe.clone())),
        painter: Arc::new(painter),
        rasterizer,
        encoder: Arc::new(video::FfmpegEncoder::new(tools.ffmpeg.clone())),
        config,
    })
}

/// Shows one progress bar per file and a result line when it ends.
#[derive(Default)]
struct CliObserver {
    bar: Option<ProgressBar>,
}

impl JobObserver for CliObserver {
    fn job_started(&mut self, job: &ConversionJob) {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message(format!("{}", job.input.display()));
        bar.enable_steady_tick(Duration::from_millis(120));
        self.bar = Some(bar);
    }

    fn job_progress(&mut self, _job: &ConversionJob, progress: &Progress) {
        if let Some(bar) = &self.bar {
            bar.set_length(progress.total as u64);
            bar.set_position(progress.current as u64);
            bar.set_message(progress.message.clone());
        }
    }

    fn job_finished(&mut self, outcome: &FileOutcome) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }

        match (&outcome.output, &outcome.error) {
            (Some(output), _) => {
                if outcome.silent_units > 0 {
                    eprintln!(
                        "Done: {} ({} of {} paragraphs silent)",
                        output.display(),
                        outcome.silent_units,
                        outcome.units
                    );
                } else {
                    eprintln!("Done: {}", output.display());
                }
            }
            (None, error) => {
                eprintln!(
                    "Failed: {}: {}",
                    outcome.input.display(),
                    error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = SpykenConfig::load()?;
            println!("Configuration file: {:?}", SpykenConfig::config_path()?);
            println!();
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::SetVoice { family, gender, voice } => {
            let mut config = SpykenConfig::load()?;
            let slot = match (family, gender) {
                (FamilyArg::Greek, GenderArg::Male) => &mut config.voices.greek_male,
                (FamilyArg::Greek, GenderArg::Female) => &mut config.voices.greek_female,
                (FamilyArg::English, GenderArg::Male) => &mut config.voices.english_male,
                (FamilyArg::English, GenderArg::Female) => &mut config.voices.english_female,
            };
            *slot = voice.clone();
            config.save()?;
            println!("{:?} {:?} voice set to: {}", family, gender, voice);
        }
        ConfigAction::SetFont { path } => {
            if !path.exists() {
                anyhow::bail!("Font file not found: {}", path.display());
            }
            let mut config = SpykenConfig::load()?;
            config.video.font_path = Some(path.clone());
            config.save()?;
            println!("Frame font set to: {}", path.display());
        }
        ConfigAction::SetChunkSize { value } => {
            let mut config = SpykenConfig::load()?;
            config.max_chunk_chars = *value;
            config = config.sanitized();
            config.save()?;
            println!("Maximum chunk size set to: {}", config.max_chunk_chars);
        }
    }
    Ok(())
}
