//! Text processing for narration: cleaning, validity filtering, chunking.

pub mod chunker;
pub mod classifier;
mod cleaner;

pub use classifier::{LanguageFamily, detect_language_family, is_valid};

use crate::document::{SourceLocation, TextBlock};

/// One paragraph or block of document text, narrated as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct TextUnit {
    /// Cleaned, single-line text
    pub content: String,
    /// Where the block sits on its page, for paginated formats
    pub source: Option<SourceLocation>,
}

impl TextUnit {
    pub fn new(content: String, source: Option<SourceLocation>) -> Self {
        Self { content, source }
    }

    pub fn language_family(&self) -> LanguageFamily {
        detect_language_family(&self.content)
    }
}

/// A piece of a unit small enough for one speech backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Index of the unit this chunk was cut from
    pub parent_unit_index: usize,
    /// Position within the unit
    pub chunk_index: usize,
    pub text: String,
}

impl Chunk {
    pub fn new(parent_unit_index: usize, chunk_index: usize, text: String) -> Self {
        Self {
            parent_unit_index,
            chunk_index,
            text,
        }
    }
}

/// Turn raw extracted blocks into speakable units, in reading order.
pub fn units_from_blocks(blocks: Vec<TextBlock>) -> Vec<TextUnit> {
    blocks
        .into_iter()
        .filter_map(|block| {
            let content = cleaner::clean_text(&block.text);
            is_valid(&content).then(|| TextUnit::new(content, block.location))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Region;

    #[test]
    fn test_units_from_blocks_filters_and_cleans() {
        let location = SourceLocation {
            page_index: 0,
            region: Region::new(10.0, 20.0, 200.0, 60.0),
        };
        let blocks = vec![
            TextBlock::new("  First\nparagraph  ".to_string(), Some(location)),
            TextBlock::new("7".to_string(), None),
            TextBlock::new("   ".to_string(), None),
            TextBlock::new("Δεύτερη παράγραφος".to_string(), None),
        ];

        let units = units_from_blocks(blocks);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].content, "First paragraph");
        assert_eq!(units[0].source, Some(location));
        assert_eq!(units[1].language_family(), LanguageFamily::Greek);
    }

    #[test]
    fn test_chunk_creation() {
        let chunk = Chunk::new(0, 1, "Hello world".to_string());
        assert_eq!(chunk.parent_unit_index, 0);
        assert_eq!(chunk.chunk_index, 1);
        assert_eq!(chunk.text, "Hello world");
    }
}
