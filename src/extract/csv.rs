//! CSV: one line per row, cells joined by spaces.
//!
//! Quoted separators and embedded newlines are understood. The check that
//! is enforced is the field count: a row with a different number of cells
//! than the first row fails the whole file, with no partial result.
//! Quoting itself is read leniently. A stray quote inside a field is kept
//! as a literal character, and an unterminated quote runs to the end of the
//! input, which usually surfaces as a field count failure.

use async_trait::async_trait;
use docseek_core::{DocumentContent, FileMetadata};

use super::{decode_text, into_document, run_blocking, ExtractError, Extractor};

pub struct CsvExtractor;

impl CsvExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten decoded CSV text into space-joined rows. The header row is kept.
pub fn csv_to_text(input: &str) -> Result<String, ExtractError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(false)
        .from_reader(input.as_bytes());

    let mut lines = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ExtractError::failed("CSV", e))?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        lines.push(record.iter().collect::<Vec<_>>().join(" "));
    }
    Ok(lines.join("\n"))
}

#[async_trait]
impl Extractor for CsvExtractor {
    fn format(&self) -> &'static str {
        "CSV"
    }

    fn supports(&self, key: &str) -> bool {
        key == "csv"
    }

    async fn extract(
        &self,
        bytes: Vec<u8>,
        metadata: &FileMetadata,
    ) -> Result<DocumentContent, ExtractError> {
        let text = run_blocking("CSV", move || csv_to_text(&decode_text(&bytes))).await?;
        Ok(into_document(&text, metadata))
    }
}
