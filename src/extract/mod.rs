//! Multi-format text extraction.
//!
//! Each supported format has an [`Extractor`] that turns a raw byte buffer
//! into a cleaned [`DocumentContent`]. Extractors only implement the
//! format-specific decode step; the shared [`clean`] helpers handle encoding
//! detection and text normalization.
//!
//! | Extractor | Keys |
//! |-----------|------|
//! | [`text::TextExtractor`] | `txt`, `md`, `markdown` |
//! | [`html::HtmlExtractor`] | `html`, `htm` |
//! | [`csv::CsvExtractor`] | `csv` |
//! | [`pdf::PdfExtractor`] | `pdf` |
//! | [`docx::DocxExtractor`] | `docx` |
//! | [`image::ImageExtractor`] | `png`, `jpg`, `jpeg`, `gif`, `bmp`, `webp`, `tiff`, `tif`, `svg` |
//!
//! Failures surface as [`ExtractError::Failed`], rendered
//! `"<Format> extraction failed: <cause>"`. The ingestion pipeline catches
//! them per file; an extractor never panics the batch.

pub mod clean;
pub mod csv;
pub mod docx;
pub mod html;
pub mod image;
pub mod pdf;
pub mod text;

use async_trait::async_trait;
use docseek_core::{DocumentContent, FileMetadata};
use thiserror::Error;

pub use clean::{decode_text, detect_encoding, normalize_text};

/// Extraction error. Never a panic; the pipeline skips the file.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    /// No extractor is registered for this extension key.
    #[error("no extractor for type: {0}")]
    Unsupported(String),

    /// The format-specific decode step failed.
    #[error("{format} extraction failed: {cause}")]
    Failed { format: &'static str, cause: String },
}

impl ExtractError {
    pub fn failed(format: &'static str, cause: impl ToString) -> Self {
        ExtractError::Failed {
            format,
            cause: cause.to_string(),
        }
    }
}

/// Converts one format's raw bytes into a document.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Display name of the format, used in error messages (`"PDF"`, `"CSV"`, …).
    fn format(&self) -> &'static str;

    /// Whether this extractor handles the lowercase extension `key`.
    fn supports(&self, key: &str) -> bool;

    /// Extract and clean the text of `bytes`, owned by the file `metadata`.
    async fn extract(
        &self,
        bytes: Vec<u8>,
        metadata: &FileMetadata,
    ) -> Result<DocumentContent, ExtractError>;
}

/// Normalize raw extracted text and wrap it in a new document for `metadata`.
pub fn into_document(raw: &str, metadata: &FileMetadata) -> DocumentContent {
    DocumentContent::new(&metadata.id, normalize_text(raw))
}

/// Run a CPU-bound decode step on the blocking pool.
///
/// A panic inside `f` becomes an extraction failure for this file only.
pub(crate) async fn run_blocking<T, F>(format: &'static str, f: F) -> Result<T, ExtractError>
where
    F: FnOnce() -> Result<T, ExtractError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ExtractError::failed(format, format!("decoder task aborted: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_message_names_the_format() {
        let err = ExtractError::failed("PDF", "bad xref");
        assert_eq!(err.to_string(), "PDF extraction failed: bad xref");
    }

    #[test]
    fn unsupported_message_names_the_key() {
        let err = ExtractError::Unsupported("xyz".to_string());
        assert_eq!(err.to_string(), "no extractor for type: xyz");
    }

    #[tokio::test]
    async fn panics_in_blocking_decode_are_contained() {
        let result: Result<(), ExtractError> =
            run_blocking("CSV", || panic!("decoder exploded")).await;
        let err = result.unwrap_err();
        assert!(err.to_string().starts_with("CSV extraction failed: decoder task aborted"));
    }
}
