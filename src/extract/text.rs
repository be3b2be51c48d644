//! Plain text and Markdown.

use async_trait::async_trait;
use docseek_core::{DocumentContent, FileMetadata};

use super::{decode_text, into_document, ExtractError, Extractor};

/// Extractor for `.txt` and Markdown files. Markdown is indexed as-is.
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for TextExtractor {
    fn format(&self) -> &'static str {
        "Text"
    }

    fn supports(&self, key: &str) -> bool {
        matches!(key, "txt" | "md" | "markdown")
    }

    async fn extract(
        &self,
        bytes: Vec<u8>,
        metadata: &FileMetadata,
    ) -> Result<DocumentContent, ExtractError> {
        Ok(into_document(&decode_text(&bytes), metadata))
    }
}
