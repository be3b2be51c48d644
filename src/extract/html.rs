//! HTML: visible body text only.
//!
//! The markup is parsed with `html2text`, which skips scripts, styles and
//! other non-rendered elements. [`VisibleText`] then renders what remains
//! without any decoration, so link targets, list bullets, image alt text
//! and table borders never reach the index.

use async_trait::async_trait;
use docseek_core::{DocumentContent, FileMetadata};
use html2text::render::{TaggedLine, TextDecorator};

use super::{decode_text, into_document, run_blocking, ExtractError, Extractor};

/// Wide enough that ordinary paragraphs are not re-wrapped.
const RENDER_WIDTH: usize = 10_000;

/// Emits the literal text of the page and nothing else.
#[derive(Clone, Debug, Default)]
pub struct VisibleText;

impl TextDecorator for VisibleText {
    type Annotation = ();

    fn decorate_link_start(&mut self, _url: &str) -> (String, ()) {
        (String::new(), ())
    }

    fn decorate_link_end(&mut self) -> String {
        String::new()
    }

    fn decorate_em_start(&self) -> (String, ()) {
        (String::new(), ())
    }

    fn decorate_em_end(&self) -> String {
        String::new()
    }

    fn decorate_strong_start(&self) -> (String, ()) {
        (String::new(), ())
    }

    fn decorate_strong_end(&self) -> String {
        String::new()
    }

    fn decorate_strikeout_start(&self) -> (String, ()) {
        (String::new(), ())
    }

    fn decorate_strikeout_end(&self) -> String {
        String::new()
    }

    fn decorate_code_start(&self) -> (String, ()) {
        (String::new(), ())
    }

    fn decorate_code_end(&self) -> String {
        String::new()
    }

    fn decorate_preformat_first(&self) {}

    fn decorate_preformat_cont(&self) {}

    // Alt text is not rendered on the page.
    fn decorate_image(&mut self, _src: &str, _title: &str) -> (String, ()) {
        (String::new(), ())
    }

    fn header_prefix(&self, _level: usize) -> String {
        String::new()
    }

    fn quote_prefix(&self) -> String {
        String::new()
    }

    fn unordered_item_prefix(&self) -> String {
        String::new()
    }

    fn ordered_item_prefix(&self, _i: i64) -> String {
        String::new()
    }

    fn make_subblock_decorator(&self) -> Self {
        VisibleText
    }

    fn finalise(&mut self, _urls: Vec<String>) -> Vec<TaggedLine<()>> {
        Vec::new()
    }
}

pub struct HtmlExtractor;

impl HtmlExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Render decoded HTML to plain text.
pub fn html_to_text(html: &str) -> Result<String, ExtractError> {
    html2text::config::with_decorator(VisibleText)
        .link_footnotes(false)
        .no_table_borders()
        .string_from_read(html.as_bytes(), RENDER_WIDTH)
        .map_err(|e| ExtractError::failed("HTML", e))
}

#[async_trait]
impl Extractor for HtmlExtractor {
    fn format(&self) -> &'static str {
        "HTML"
    }

    fn supports(&self, key: &str) -> bool {
        matches!(key, "html" | "htm")
    }

    async fn extract(
        &self,
        bytes: Vec<u8>,
        metadata: &FileMetadata,
    ) -> Result<DocumentContent, ExtractError> {
        let rendered = run_blocking("HTML", move || html_to_text(&decode_text(&bytes))).await?;
        Ok(into_document(&rendered, metadata))
    }
}
