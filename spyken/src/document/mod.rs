//! Document readers: ordered raw text blocks, with page geometry for PDFs.

mod docx;
mod pdf;

use crate::error::{ConvertError, Result};
use std::path::{Path, PathBuf};

/// Recognised input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Pick the reader from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            _ => Err(ConvertError::UnsupportedFormat(if ext.is_empty() {
                "(no extension)".to_string()
            } else {
                format!(".{}", ext)
            })),
        }
    }
}

/// Rectangle on a page in points, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Region {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// Where a block came from in a paginated document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceLocation {
    /// Zero-based page index
    pub page_index: usize,
    pub region: Region,
}

/// Page dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl Default for PageSize {
    fn default() -> Self {
        // US Letter
        Self {
            width: 612.0,
            height: 792.0,
        }
    }
}

/// One raw block as produced by a reader.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub text: String,
    pub location: Option<SourceLocation>,
}

impl TextBlock {
    pub fn new(text: String, location: Option<SourceLocation>) -> Self {
        Self { text, location }
    }
}

/// An extracted document.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub kind: DocumentKind,
    /// Blocks in reading order
    pub blocks: Vec<TextBlock>,
    /// Page sizes, indexed by page; empty for formats without pages
    pub pages: Vec<PageSize>,
}

impl Document {
    pub fn page_size(&self, page_index: usize) -> Option<PageSize> {
        self.pages.get(page_index).copied()
    }
}

/// Read a document and return its blocks in reading order.
pub fn extract(path: &Path) -> Result<Document> {
    let kind = DocumentKind::from_path(path)?;

    let (blocks, pages) = match kind {
        DocumentKind::Docx => (docx::extract_paragraphs(path)?, Vec::new()),
        DocumentKind::Pdf => pdf::extract_blocks(path)?,
    };

    log::debug!(
        "Extracted {} blocks from {} ({} pages)",
        blocks.len(),
        path.display(),
        pages.len()
    );

    Ok(Document {
        path: path.to_path_buf(),
        kind,
        blocks,
        pages,
    })
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(DocumentKind::from_path(Path::new("a/b.pdf")).unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_path(Path::new("Report.DOCX")).unwrap(), DocumentKind::Docx);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = DocumentKind::from_path(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedFormat(ref e) if e == ".txt"));

        let err = DocumentKind::from_path(Path::new("README")).unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_region_normalises_corners() {
        let region = Region::new(100.0, 80.0, 20.0, 10.0);
        assert_eq!(region, Region::new(20.0, 10.0, 100.0, 80.0));
        assert_eq!(region.width(), 80.0);
        assert_eq!(region.height(), 70.0);
    }

    #[test]
    fn test_extract_docx() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("story.docx");
        fixtures::write_docx(&path, &["First paragraph.", "", "Second & last."]);

        let doc = extract(&path).unwrap();
        assert_eq!(doc.kind, DocumentKind::Docx);
        assert!(doc.pages.is_empty());
        let texts: Vec<&str> = doc.blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["First paragraph.", "Second & last."]);
        assert!(doc.blocks.iter().all(|b| b.location.is_none()));
    }

    #[test]
    fn test_extract_pdf_has_geometry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("paper.pdf");
        fixtures::write_pdf(&path, &[vec![(72.0, 700.0, 12.0, "A paragraph of text")]]);

        let doc = extract(&path).unwrap();
        assert_eq!(doc.kind, DocumentKind::Pdf);
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.page_size(0), Some(PageSize::default()));
        let location = doc.blocks[0].location.unwrap();
        assert_eq!(location.page_index, 0);
    }
}
