//! Per-file conversion errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Unsupported file format: {0} (expected .pdf or .docx)")]
    UnsupportedFormat(String),

    #[error("No speakable text found in {0}")]
    ExtractionEmpty(String),

    #[error("Failed to read document: {0}")]
    Document(String),

    #[error("Speech synthesis failed after {attempts} attempts: {message}")]
    SynthesisFailure { attempts: u32, message: String },

    #[error("None of the {0} paragraphs could be synthesized")]
    NothingSynthesized(usize),

    #[error("Encoding failed: {0}")]
    EncodeFailure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;

impl From<lopdf::Error> for ConvertError {
    fn from(err: lopdf::Error) -> Self {
        ConvertError::Document(format!("PDF: {}", err))
    }
}

impl From<zip::result::ZipError> for ConvertError {
    fn from(err: zip::result::ZipError) -> Self {
        ConvertError::Document(format!("DOCX: {}", err))
    }
}

impl From<image::ImageError> for ConvertError {
    fn from(err: image::ImageError) -> Self {
        ConvertError::EncodeFailure(format!("image: {}", err))
    }
}
