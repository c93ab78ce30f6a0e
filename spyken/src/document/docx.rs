// DOCX paragraph extraction

use super::TextBlock;
use crate::error::{ConvertError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Read;
use std::path::Path;

/// Main document part inside the OOXML package
const DOCUMENT_PART: &str = "word/document.xml";

/// Legacy copy of alternate content (VML text boxes); the `mc:Choice` copy is read
static FALLBACK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<mc:Fallback\b.*?</mc:Fallback>").expect("valid regex"));

/// Paragraph open/close tags, text runs, tabs and breaks
static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)<w:p(?:\s[^>]*)?/>|<w:p(?:\s[^>]*)?>|</w:p>|<w:t(?:\s[^>]*)?>(.*?)</w:t>|<w:tab/>|<w:br\b[^>]*/>|<w:cr/>",
    )
    .expect("valid regex")
});

static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|[a-z]+);").expect("valid regex"));

/// Extract non-empty paragraphs from a .docx file, in document order
pub fn extract_paragraphs(path: &Path) -> Result<Vec<TextBlock>> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ConvertError::Document(format!("DOCX: missing {}: {}", DOCUMENT_PART, e)))?
        .read_to_string(&mut xml)?;

    Ok(paragraphs_from_xml(&xml)
        .into_iter()
        .map(|text| TextBlock::new(text, None))
        .collect())
}

/// Collect the trimmed text of every non-empty `<w:p>`, ordered by where
/// each paragraph opens. Paragraphs nested in text boxes are separate units
/// and do not cut their host paragraph short.
fn paragraphs_from_xml(xml: &str) -> Vec<String> {
    let xml = FALLBACK.replace_all(xml, "");

    let mut slots: Vec<String> = Vec::new();
    let mut open: Vec<usize> = Vec::new();

    for token in TOKEN.captures_iter(&xml) {
        let tag = &token[0];
        if let Some(run) = token.get(1) {
            if let Some(&slot) = open.last() {
                slots[slot].push_str(&decode_entities(run.as_str()));
            }
        } else if tag == "</w:p>" {
            open.pop();
        } else if tag.starts_with("<w:p") {
            if !tag.ends_with("/>") {
                slots.push(String::new());
                open.push(slots.len() - 1);
            }
        } else if let Some(&slot) = open.last() {
            slots[slot].push(' ');
        }
    }

    slots
        .into_iter()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect()
}

/// Decode the predefined XML entities and numeric character references
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let name = &caps[1];
            let decoded = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ if name.starts_with("#x") => {
                    u32::from_str_radix(&name[2..], 16).ok().and_then(char::from_u32)
                }
                _ if name.starts_with('#') => name[1..].parse().ok().and_then(char::from_u32),
                _ => None,
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
