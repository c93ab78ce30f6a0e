//! Voice alternation policy.

use crate::config::VoiceTable;
use crate::text::LanguageFamily;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

/// The voice chosen for one text unit. All chunks of the unit share it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceAssignment {
    pub language_family: LanguageFamily,
    pub gender: Gender,
    pub voice_id: String,
}

/// Maps a spoken-unit counter and language family to a voice.
#[derive(Debug, Clone)]
pub struct VoiceAssigner {
    table: VoiceTable,
}

impl VoiceAssigner {
    pub fn new(table: VoiceTable) -> Self {
        Self { table }
    }

    /// Even counters get a male voice, odd counters a female one.
    pub fn assign(&self, unit_counter: usize, language_family: LanguageFamily) -> VoiceAssignment {
        let gender = if unit_counter % 2 == 0 {
            Gender::Male
        } else {
            Gender::Female
        };

        let voice_id = match (language_family, gender) {
            (LanguageFamily::Greek, Gender::Male) => &self.table.greek_male,
            (LanguageFamily::Greek, Gender::Female) => &self.table.greek_female,
            (LanguageFamily::English, Gender::Male) => &self.table.english_male,
            (LanguageFamily::English, Gender::Female) => &self.table.english_female,
        };

        VoiceAssignment {
            language_family,
            gender,
            voice_id: voice_id.clone(),
        }
    }
}

/// Per-file alternation state.
///
/// Advances only when a unit produced audio, so a fully failed paragraph does
/// not break the male/female alternation of the paragraphs that are heard.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SpokenUnitCounter(usize);

impl SpokenUnitCounter {
    pub fn value(&self) -> usize {
        self.0
    }

    /// Record the outcome of one unit.
    pub fn record(&mut self, produced_audio: bool) {
        if produced_audio {
            self.0 += 1;
        }
    }
}
