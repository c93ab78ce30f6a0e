//! Splitting of over-long units into speech-backend-sized pieces.

use super::{Chunk, TextUnit};

/// Default per-call limit of the speech backend, in characters.
pub const DEFAULT_MAX_CHARS: usize = 800;

/// Natural cut points, highest priority first. A cut keeps the separator.
const BOUNDARIES: &[&str] = &[". ", "! ", "? ", ", "];

/// Split text into pieces of at most `max_chars` characters.
///
/// Text that already fits is returned unchanged as a single piece. Otherwise
/// each piece ends at the last sentence boundary inside the limit, falling
/// back to lesser boundaries and finally to a hard cut at `max_chars`, which
/// may split a word. Pieces are trimmed; joining them gives back the input
/// up to whitespace at the cut points.
pub fn split(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut pieces = Vec::new();
    let mut remaining = text.trim();

    while remaining.chars().count() > max_chars {
        let cut = cut_position(remaining, max_chars);
        let piece = remaining[..cut].trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }
        remaining = remaining[cut..].trim();
    }

    if !remaining.is_empty() {
        pieces.push(remaining.to_string());
    }

    pieces
}

/// Byte offset at which to cut `text`, which is longer than `max_chars`.
fn cut_position(text: &str, max_chars: usize) -> usize {
    let limit = byte_offset_of_char(text, max_chars);
    let window = &text[..limit];

    for boundary in BOUNDARIES {
        if let Some(pos) = window.rfind(boundary) {
            return pos + boundary.len();
        }
    }

    limit
}

/// Byte offset of the `n`th character, or the text length if shorter.
fn byte_offset_of_char(text: &str, n: usize) -> usize {
    text.char_indices()
        .nth(n)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}

/// Split one unit into ordered chunks sharing the unit's index.
pub fn chunk_unit(unit_index: usize, unit: &TextUnit, max_chars: usize) -> Vec<Chunk> {
    split(&unit.content, max_chars)
        .into_iter()
        .enumerate()
        .map(|(chunk_index, text)| Chunk::new(unit_index, chunk_index, text))
        .collect()
}
