//! PDF: page-ordered text, blank pages dropped.
//!
//! `pdf-extract` yields one string per page with its text items already
//! concatenated. Pages are joined with a blank line; a page whose text is
//! empty after trimming contributes nothing.

use async_trait::async_trait;
use docseek_core::{DocumentContent, FileMetadata};

use super::{into_document, run_blocking, ExtractError, Extractor};

pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Join per-page text in page order, skipping blank pages.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    pages
        .iter()
        .map(|p| p.as_ref().trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::failed("PDF", e))?;
    tracing::debug!(pages = pages.len(), "parsed pdf");
    Ok(join_pages(&pages))
}

#[async_trait]
impl Extractor for PdfExtractor {
    fn format(&self) -> &'static str {
        "PDF"
    }

    fn supports(&self, key: &str) -> bool {
        key == "pdf"
    }

    async fn extract(
        &self,
        bytes: Vec<u8>,
        metadata: &FileMetadata,
    ) -> Result<DocumentContent, ExtractError> {
        let text = run_blocking("PDF", move || extract_pdf(&bytes)).await?;
        Ok(into_document(&text, metadata))
    }
}

/// Minimal single-page PDF drawing `phrase` in Helvetica. Test fixture.
#[cfg(test)]
pub(crate) fn minimal_pdf(phrase: &str) -> Vec<u8> {
    let content = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", phrase);
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(
        format!(
            "4 0 obj << /Length {} >> stream\n{}\nendstream endobj\n",
            content.len(),
            content
        )
        .as_bytes(),
    );
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in [o1, o2, o3, o4, o5] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}
