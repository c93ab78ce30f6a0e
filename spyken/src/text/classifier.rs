//! Speakability and language-family checks for text units.

use serde::{Deserialize, Serialize};

/// Minimum trimmed length (in characters) of a speakable unit.
pub const MIN_UNIT_CHARS: usize = 3;

/// Script family used to pick a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageFamily {
    Greek,
    English,
}

/// Whether `text` is worth sending to the speech backend.
///
/// Rejects whitespace, punctuation or digit runs and stray one or two
/// character blocks, which PDF extraction produces for page numbers and bullets.
pub fn is_valid(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.chars().count() >= MIN_UNIT_CHARS && trimmed.chars().any(char::is_alphabetic)
}

/// Guess the script family by majority letter count. Ties (including empty
/// input) resolve to Greek.
pub fn detect_language_family(text: &str) -> LanguageFamily {
    let mut latin = 0usize;
    let mut greek = 0usize;

    for c in text.chars() {
        if is_greek_letter(c) {
            greek += 1;
        } else if is_latin_letter(c) {
            latin += 1;
        }
    }

    if latin > greek {
        LanguageFamily::English
    } else {
        LanguageFamily::Greek
    }
}

fn is_greek_letter(c: char) -> bool {
    c.is_alphabetic() && matches!(c, '\u{0370}'..='\u{03FF}' | '\u{1F00}'..='\u{1FFF}')
}

fn is_latin_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || (c.is_alphabetic() && matches!(c, '\u{00C0}'..='\u{024F}'))
}
