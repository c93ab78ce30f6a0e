//! Narrating units one at a time: voice, chunks, synthesis, combined audio.

use crate::audio::{AudioAssembler, ParagraphAudio};
use crate::error::Result;
use crate::text::{TextUnit, chunker};
use crate::tts::SpeechSynthesizer;
use crate::voice::{SpokenUnitCounter, VoiceAssigner, VoiceAssignment};
use std::path::Path;

/// A unit after synthesis.
#[derive(Debug, Clone)]
pub struct NarratedUnit {
    pub audio: ParagraphAudio,
    pub voice: VoiceAssignment,
    pub chunks: usize,
    pub failed_chunks: usize,
}

/// Holds the per-file voice alternation state.
pub struct Narrator<'a> {
    synthesizer: &'a SpeechSynthesizer,
    assembler: AudioAssembler,
    assigner: VoiceAssigner,
    counter: SpokenUnitCounter,
    max_chunk_chars: usize,
    workdir: &'a Path,
}

impl<'a> Narrator<'a> {
    pub fn new(
        synthesizer: &'a SpeechSynthesizer,
        assembler: AudioAssembler,
        assigner: VoiceAssigner,
        max_chunk_chars: usize,
        workdir: &'a Path,
    ) -> Self {
        Self {
            synthesizer,
            assembler,
            assigner,
            counter: SpokenUnitCounter::default(),
            max_chunk_chars,
            workdir,
        }
    }

    pub fn assembler(&self) -> &AudioAssembler {
        &self.assembler
    }

    /// Synthesize every chunk of one unit in order and combine the results.
    ///
    /// Chunk failures are absorbed; a unit where every chunk failed comes back
    /// silent and does not advance the voice alternation.
    pub async fn narrate(&mut self, unit_index: usize, unit: &TextUnit) -> Result<NarratedUnit> {
        let voice = self.assigner.assign(self.counter.value(), unit.language_family());
        let chunks = chunker::chunk_unit(unit_index, unit, self.max_chunk_chars);

        let mut results = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let path = self
                .workdir
                .join(format!("unit_{:04}_chunk_{:03}.mp3", unit_index, chunk.chunk_index));
            results.push(self.synthesizer.synthesize(chunk, &voice.voice_id, &path).await);
        }
        let failed_chunks = results.iter().filter(|r| !r.succeeded).count();

        let combined_path = self.workdir.join(format!("unit_{:04}.mp3", unit_index));
        let audio = self
            .assembler
            .combine_chunks(unit_index, &results, &combined_path)
            .await?;
        self.counter.record(audio.has_audio());

        if audio.has_audio() {
            log::debug!(
                "Paragraph {}: {} chunk(s), {:?} voice {}, {:.2}s",
                unit_index + 1,
                chunks.len(),
                voice.language_family,
                voice.voice_id,
                audio.duration_seconds
            );
        } else {
            log::warn!("Paragraph {} could not be synthesized, leaving it silent", unit_index + 1);
        }

        Ok(NarratedUnit {
            audio,
            voice,
            chunks: chunks.len(),
            failed_chunks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::probe::FixedProbe;
    use crate::config::VoiceTable;
    use crate::tts::RetryPolicy;
    use crate::voice::Gender;
    use speech_client::MockBackend;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn synthesizer(backend: Arc<MockBackend>) -> SpeechSynthesizer {
        SpeechSynthesizer::new(
            backend,
            RetryPolicy {
                max_attempts: 3,
                backoff: Duration::ZERO,
            },
        )
    }

    fn unit(text: &str) -> TextUnit {
        TextUnit::new(text.to_string(), None)
    }

    #[tokio::test]
    async fn test_long_unit_is_chunked_with_one_voice() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(MockBackend::always_succeeds());
        let synth = synthesizer(backend.clone());
        let assembler = AudioAssembler::new(Arc::new(FixedProbe(Some(1.0))), 3.0);
        let mut narrator = Narrator::new(&synth, assembler, VoiceAssigner::new(VoiceTable::default()), 20, dir.path());

        let narrated = narrator
            .narrate(0, &unit("First sentence here. Second sentence here. Third one."))
            .await
            .unwrap();

        assert!(narrated.chunks > 1);
        assert_eq!(narrated.failed_chunks, 0);
        assert_eq!(narrated.audio.duration_seconds, narrated.chunks as f64);
        let calls = backend.calls();
        assert_eq!(calls.len(), narrated.chunks);
        assert!(calls.iter().all(|c| c.voice == "en-GB-RyanNeural"));
    }

    #[tokio::test]
    async fn test_silent_unit_keeps_alternation() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(MockBackend::always_succeeds().failing_on("BROKEN"));
        let synth = synthesizer(backend.clone());
        let assembler = AudioAssembler::new(Arc::new(FixedProbe(None)), 3.0);
        let mut narrator = Narrator::new(&synth, assembler, VoiceAssigner::new(VoiceTable::default()), 800, dir.path());

        let a = narrator.narrate(0, &unit("Good morning")).await.unwrap();
        let b = narrator.narrate(1, &unit("BROKEN paragraph")).await.unwrap();
        let c = narrator.narrate(2, &unit("Good evening")).await.unwrap();

        assert_eq!(a.voice.gender, Gender::Male);
        assert!(!b.audio.has_audio());
        assert_eq!(b.failed_chunks, 1);
        assert_eq!(c.voice.gender, Gender::Female);
        // every attempt for the broken unit was made
        assert_eq!(backend.call_count(), 1 + 3 + 1);
    }
}
