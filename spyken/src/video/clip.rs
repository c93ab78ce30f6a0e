//! Pairing frames with paragraph audio on a timeline.

use crate::audio::ParagraphAudio;
use crate::render::Frame;
use std::path::PathBuf;

/// The audio laid under one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipAudio {
    pub path: PathBuf,
    /// Measured length of the audio file
    pub source_seconds: f64,
    /// How much of it is played; never longer than the clip
    pub play_seconds: f64,
}

/// One frame held on screen for `duration` seconds, optionally with audio.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedClip {
    pub frame: Frame,
    pub audio: Option<ClipAudio>,
    pub duration: f64,
}

impl TimedClip {
    /// Build the clip for one unit.
    ///
    /// The clip lasts as long as the paragraph audio's accounted duration, or
    /// `default_secs` when the unit is silent. `measured_seconds` is the probed
    /// length of the combined file; audio longer than the clip is cut, the
    /// frame is never extended.
    pub fn pair(frame: Frame, audio: &ParagraphAudio, measured_seconds: Option<f64>, default_secs: f64) -> Self {
        let Some(path) = audio.combined.clone() else {
            return Self {
                frame,
                audio: None,
                duration: default_secs,
            };
        };

        let duration = if audio.duration_seconds > 0.0 {
            audio.duration_seconds
        } else {
            default_secs
        };
        let source_seconds = measured_seconds.unwrap_or(duration);

        Self {
            frame,
            audio: Some(ClipAudio {
                path,
                source_seconds,
                play_seconds: source_seconds.min(duration),
            }),
            duration,
        }
    }

    pub fn is_silent(&self) -> bool {
        self.audio.is_none()
    }
}

/// Sum of clip durations.
pub fn total_duration(clips: &[TimedClip]) -> f64 {
    clips.iter().map(|c| c.duration).sum()
}

/// Start and end time of every clip, back to back in order.
pub fn timeline(clips: &[TimedClip]) -> Vec<(f64, f64)> {
    let mut start = 0.0;
    clips
        .iter()
        .map(|clip| {
            let window = (start, start + clip.duration);
            start = window.1;
            window
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(i: usize) -> Frame {
        Frame {
            unit_index: i,
            image_path: PathBuf::from(format!("frame_{:04}.png", i)),
        }
    }

    fn voiced(i: usize, secs: f64) -> ParagraphAudio {
        ParagraphAudio {
            unit_index: i,
            combined: Some(PathBuf::from(format!("unit_{}.mp3", i))),
            duration_seconds: secs,
        }
    }

    #[test]
    fn test_longer_audio_is_clamped_to_clip() {
        let clip = TimedClip::pair(frame(0), &voiced(0, 4.0), Some(5.5), 3.0);
        assert_eq!(clip.duration, 4.0);
        let audio = clip.audio.unwrap();
        assert_eq!(audio.source_seconds, 5.5);
        assert_eq!(audio.play_seconds, 4.0);
    }

    #[test]
    fn test_shorter_audio_plays_in_full() {
        let clip = TimedClip::pair(frame(0), &voiced(0, 4.0), Some(3.9), 3.0);
        assert_eq!(clip.audio.unwrap().play_seconds, 3.9);
        assert_eq!(clip.duration, 4.0);
    }

    #[test]
    fn test_silent_unit_uses_default() {
        let clip = TimedClip::pair(frame(1), &ParagraphAudio::silent(1, 3.0), None, 3.0);
        assert!(clip.is_silent());
        assert_eq!(clip.duration, 3.0);
    }

    #[test]
    fn test_unmeasured_audio_plays_for_clip_duration() {
        let clip = TimedClip::pair(frame(0), &voiced(0, 2.5), None, 3.0);
        assert_eq!(clip.audio.unwrap().play_seconds, 2.5);
    }

    #[test]
    fn test_timeline_is_contiguous() {
        let clips = vec![
            TimedClip::pair(frame(0), &voiced(0, 2.0), None, 3.0),
            TimedClip::pair(frame(1), &ParagraphAudio::silent(1, 3.0), None, 3.0),
            TimedClip::pair(frame(2), &voiced(2, 1.5), None, 3.0),
        ];
        assert_eq!(timeline(&clips), vec![(0.0, 2.0), (2.0, 5.0), (5.0, 6.5)]);
        assert_eq!(total_duration(&clips), 6.5);
    }
}
