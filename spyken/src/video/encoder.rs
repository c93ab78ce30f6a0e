//! Video encoding with ffmpeg: one segment per clip, then a stream-copy concat.

use super::clip::{TimedClip, timeline, total_duration};
use crate::error::{ConvertError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

const AUDIO_RATE: &str = "44100";
const AUDIO_CHANNELS: &str = "2";

/// Encodes an ordered list of clips into one video file.
#[async_trait]
pub trait VideoEncoder: Send + Sync {
    /// `progress` receives the encoded fraction in `0.0..=1.0`.
    async fn encode(
        &self,
        clips: &[TimedClip],
        fps: u32,
        output: &Path,
        progress: &mut (dyn FnMut(f32) + Send),
    ) -> Result<()>;
}

pub struct FfmpegEncoder {
    program: PathBuf,
}

impl FfmpegEncoder {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }

    /// Arguments that turn one clip into an H.264/AAC segment of exactly its duration.
    fn segment_args(clip: &TimedClip, fps: u32, segment: &Path) -> Vec<String> {
        let fps = fps.to_string();
        let duration = format!("{:.3}", clip.duration);
        let mut args: Vec<String> = vec![
            "-y".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-loop".into(),
            "1".into(),
            "-framerate".into(),
            fps.clone(),
            "-i".into(),
            clip.frame.image_path.to_string_lossy().into_owned(),
        ];

        match &clip.audio {
            Some(audio) => {
                args.extend([
                    "-i".into(),
                    audio.path.to_string_lossy().into_owned(),
                    "-af".into(),
                    format!("atrim=0:{:.3},apad", audio.play_seconds),
                ]);
            }
            None => {
                args.extend([
                    "-f".into(),
                    "lavfi".into(),
                    "-i".into(),
                    format!("anullsrc=channel_layout=stereo:sample_rate={}", AUDIO_RATE),
                ]);
            }
        }

        args.extend([
            "-map".into(),
            "0:v".into(),
            "-map".into(),
            "1:a".into(),
            "-t".into(),
            duration,
            "-r".into(),
            fps,
            "-vf".into(),
            "scale=trunc(iw/2)*2:trunc(ih/2)*2,format=yuv420p".into(),
            "-c:v".into(),
            "libx264".into(),
            "-preset".into(),
            "veryfast".into(),
            "-tune".into(),
            "stillimage".into(),
            "-c:a".into(),
            "aac".into(),
            "-b:a".into(),
            "128k".into(),
            "-ar".into(),
            AUDIO_RATE.into(),
            "-ac".into(),
            AUDIO_CHANNELS.into(),
            "-progress".into(),
            "pipe:1".into(),
            "-nostats".into(),
            segment.to_string_lossy().into_owned(),
        ]);
        args
    }

    /// Run ffmpeg, reporting seconds encoded so far through `on_time`.
    /// Both pipes are drained together. The child is killed if this future
    /// is dropped or returns early.
    async fn run(&self, args: &[String], on_time: &mut (dyn FnMut(f64) + Send)) -> Result<()> {
        let mut child = tokio::process::Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ConvertError::EncodeFailure(format!("failed to run {}: {}", self.program.display(), e)))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let read_progress = async {
            if let Some(stdout) = stdout {
                let mut lines = BufReader::new(stdout).lines();
                while let Some(line) = lines.next_line().await? {
                    if let Some(secs) = parse_progress_line(&line) {
                        on_time(secs);
                    }
                }
            }
            Ok::<_, std::io::Error>(())
        };
        let read_errors = async {
            let mut buf = Vec::new();
            if let Some(mut stderr) = stderr {
                stderr.read_to_end(&mut buf).await?;
            }
            Ok::<_, std::io::Error>(buf)
        };

        let (progress, errors) = tokio::join!(read_progress, read_errors);
        progress?;
        let errors = errors?;

        let status = child.wait().await?;
        if !status.success() {
            return Err(ConvertError::EncodeFailure(format!(
                "ffmpeg exited with {}: {}",
                status,
                String::from_utf8_lossy(&errors).trim()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl VideoEncoder for FfmpegEncoder {
    async fn encode(
        &self,
        clips: &[TimedClip],
        fps: u32,
        output: &Path,
        progress: &mut (dyn FnMut(f32) + Send),
    ) -> Result<()> {
        if clips.is_empty() {
            return Err(ConvertError::EncodeFailure("no clips to encode".to_string()));
        }

        let scratch = tempfile::Builder::new().prefix("spyken-encode-").tempdir()?;
        let total = total_duration(clips).max(f64::EPSILON);
        let mut done = 0.0;
        let mut segments = Vec::with_capacity(clips.len());

        for (i, (clip, (start, end))) in clips.iter().zip(timeline(clips)).enumerate() {
            let segment = scratch.path().join(format!("segment_{:04}.mp4", i));
            let args = Self::segment_args(clip, fps, &segment);

            log::debug!("Encoding segment {}/{} ({:.2}s - {:.2}s)", i + 1, clips.len(), start, end);
            if let Some(audio) = clip.audio.as_ref().filter(|a| a.source_seconds > a.play_seconds) {
                log::debug!(
                    "Cutting {:.2}s of audio that outlasts frame {}",
                    audio.source_seconds - audio.play_seconds,
                    clip.frame.unit_index + 1
                );
            }
            let clip_duration = clip.duration;
            self.run(&args, &mut |secs| {
                let fraction = (done + secs.min(clip_duration)) / total;
                progress(fraction.clamp(0.0, 1.0) as f32);
            })
            .await?;

            done += clip.duration;
            progress((done / total).clamp(0.0, 1.0) as f32);
            segments.push(segment);
        }

        let list = scratch.path().join("segments.txt");
        tokio::fs::write(&list, concat_list(&segments)).await?;

        let args: Vec<String> = vec![
            "-y".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            list.to_string_lossy().into_owned(),
            "-c".into(),
            "copy".into(),
            "-movflags".into(),
            "+faststart".into(),
            output.to_string_lossy().into_owned(),
        ];
        self.run(&args, &mut |_| {}).await?;

        progress(1.0);
        Ok(())
    }
}

/// Concat demuxer input listing, with single quotes escaped.
fn concat_list(segments: &[PathBuf]) -> String {
    let mut content = String::new();
    for path in segments {
        let path_str = path.to_string_lossy().replace('\'', "'\\''");
        content.push_str(&format!("file '{}'\n", path_str));
    }
    content
}

/// Seconds encoded, from an `out_time_ms=` (microseconds) or `out_time_us=` line.
fn parse_progress_line(line: &str) -> Option<f64> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        "out_time_ms" | "out_time_us" => value.parse::<i64>().ok().map(|us| us.max(0) as f64 / 1_000_000.0),
        _ => None,
    }
}

/// Encoder that records what it was asked to encode and writes a marker file.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingEncoder {
        pub encoded: Mutex<Vec<(Vec<TimedClip>, u32)>>,
    }

    #[async_trait]
    impl VideoEncoder for RecordingEncoder {
        async fn encode(
            &self,
            clips: &[TimedClip],
            fps: u32,
            output: &Path,
            progress: &mut (dyn FnMut(f32) + Send),
        ) -> Result<()> {
            for clip in clips {
                if !clip.frame.image_path.exists() {
                    return Err(ConvertError::EncodeFailure(format!(
                        "missing frame {}",
                        clip.frame.image_path.display()
                    )));
                }
            }
            progress(0.5);
            tokio::fs::write(output, b"video").await?;
            progress(1.0);
            if let Ok(mut encoded) = self.encoded.lock() {
                encoded.push((clips.to_vec(), fps));
            }
            Ok(())
        }
    }
}
