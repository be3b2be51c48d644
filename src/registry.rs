//! Extractor registry.
//!
//! Maps a lowercase extension key to the [`Extractor`] that handles it. The
//! registry is built once, then shared read-only (behind an `Arc`) by every
//! ingestion call; lookups never mutate it.

use std::collections::HashMap;
use std::sync::Arc;

use docseek_core::{DocumentContent, FileMetadata};

use crate::extract::csv::CsvExtractor;
use crate::extract::docx::DocxExtractor;
use crate::extract::html::HtmlExtractor;
use crate::extract::image::{ImageExtractor, ImageLimits, OcrEngine};
use crate::extract::pdf::PdfExtractor;
use crate::extract::text::TextExtractor;
use crate::extract::{ExtractError, Extractor};

pub const IMAGE_KEYS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "tiff", "tif", "svg",
];

/// Registry of extractors keyed by extension.
pub struct ExtractorRegistry {
    extractors: HashMap<String, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Register `extractor` under each of `keys`. A later registration for
    /// the same key replaces the earlier one.
    pub fn register<E: Extractor + 'static>(&mut self, keys: &[&str], extractor: E) {
        let extractor: Arc<dyn Extractor> = Arc::new(extractor);
        for key in keys {
            self.extractors
                .insert(key.to_lowercase(), Arc::clone(&extractor));
        }
    }

    /// Extractor for a normalized extension key, if any.
    pub fn get(&self, key: &str) -> Option<Arc<dyn Extractor>> {
        self.extractors.get(key).cloned()
    }

    pub fn supports(&self, key: &str) -> bool {
        self.extractors.contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.extractors.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Dispatch on `metadata.extension`.
    pub async fn extract(
        &self,
        bytes: Vec<u8>,
        metadata: &FileMetadata,
    ) -> Result<DocumentContent, ExtractError> {
        let extractor = self
            .get(&metadata.extension)
            .ok_or_else(|| ExtractError::Unsupported(metadata.extension.clone()))?;
        extractor.extract(bytes, metadata).await
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry with every built-in extractor.
pub fn default_registry(ocr: Arc<dyn OcrEngine>, limits: ImageLimits) -> ExtractorRegistry {
    let mut registry = ExtractorRegistry::new();
    registry.register(&["pdf"], PdfExtractor::new());
    registry.register(&["docx"], DocxExtractor::new());
    registry.register(&["txt", "md", "markdown"], TextExtractor::new());
    registry.register(&["html", "htm"], HtmlExtractor::new());
    registry.register(&["csv"], CsvExtractor::new());
    registry.register(IMAGE_KEYS, ImageExtractor::new(ocr, limits));
    registry
}
