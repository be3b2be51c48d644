//! DOCX: body text of `word/document.xml`.
//!
//! Text runs (`w:t`) are concatenated, each paragraph (`w:p`) ends with a
//! blank line, and tabs and breaks become whitespace. Styling is ignored.
//! Problems inside the XML text (bad entities and the like) are logged and
//! skipped; an archive that does not open, or has no document part, fails
//! the file.

use std::io::{Cursor, Read};

use async_trait::async_trait;
use docseek_core::{DocumentContent, FileMetadata};
use quick_xml::events::Event;

use super::{into_document, run_blocking, ExtractError, Extractor};

const DOCUMENT_PART: &str = "word/document.xml";

/// Maximum decompressed bytes read from a single ZIP entry.
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn docx_error(cause: impl ToString) -> ExtractError {
    ExtractError::failed("DOCX", cause)
}

fn read_entry_bounded(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Vec<u8>, ExtractError> {
    let entry = archive.by_name(name).map_err(|e| match e {
        zip::result::ZipError::FileNotFound => docx_error(format!("{} not found", name)),
        other => docx_error(other),
    })?;
    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(docx_error)?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(docx_error(format!("{} exceeds size limit", name)));
    }
    Ok(out)
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(docx_error)?;
    let xml = read_entry_bounded(&mut archive, DOCUMENT_PART)?;
    body_text(&xml)
}

/// Walk WordprocessingML and collect run text.
pub fn body_text(xml: &[u8]) -> Result<String, ExtractError> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut in_text = false;
    let mut warnings = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = true;
                }
            }
            Ok(Event::Text(te)) if in_text => match te.unescape() {
                Ok(text) => out.push_str(&text),
                Err(e) => {
                    warnings += 1;
                    tracing::warn!(error = %e, "skipping undecodable docx text run");
                    out.push_str(&String::from_utf8_lossy(&te));
                }
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(docx_error(e)),
            _ => {}
        }
        buf.clear();
    }

    if warnings > 0 {
        tracing::debug!(warnings, "docx extracted with warnings");
    }
    Ok(out)
}

#[async_trait]
impl Extractor for DocxExtractor {
    fn format(&self) -> &'static str {
        "DOCX"
    }

    fn supports(&self, key: &str) -> bool {
        key == "docx"
    }

    async fn extract(
        &self,
        bytes: Vec<u8>,
        metadata: &FileMetadata,
    ) -> Result<DocumentContent, ExtractError> {
        let text = run_blocking("DOCX", move || extract_docx(&bytes)).await?;
        Ok(into_document(&text, metadata))
    }
}

/// Build a DOCX archive whose body has one paragraph per entry. Test fixture.
#[cfg(test)]
pub(crate) fn minimal_docx(paragraphs: &[&str]) -> Vec<u8> {
    use std::io::Write;

    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut cursor);
        let opts = zip::write::SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", opts).unwrap();
        zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)
            .unwrap();
        zip.start_file(DOCUMENT_PART, opts).unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    cursor.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::io::Write;

    fn meta() -> FileMetadata {
        FileMetadata::new("report.docx", None, 0, Utc::now())
    }

    #[tokio::test]
    async fn paragraphs_are_separated() {
        let bytes = minimal_docx(&["Annual report", "Revenue grew &amp; costs fell"]);
        let doc = DocxExtractor::new().extract(bytes, &meta()).await.unwrap();
        assert_eq!(doc.text, "Annual report\n\nRevenue grew & costs fell");
    }

    #[test]
    fn runs_join_and_tabs_break() {
        let xml = br#"<w:document xmlns:w="x"><w:body><w:p><w:r><w:t>Hel</w:t></w:r><w:r><w:t>lo</w:t><w:tab/><w:t>world</w:t><w:br/><w:t>next</w:t></w:r></w:p></w:body></w:document>"#;
        assert_eq!(body_text(xml).unwrap(), "Hello\tworld\nnext\n\n");
    }

    #[test]
    fn text_outside_runs_is_ignored() {
        let xml = br#"<w:document xmlns:w="x"><w:body><w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr>stray<w:r><w:t>kept</w:t></w:r></w:p></w:body></w:document>"#;
        assert_eq!(body_text(xml).unwrap(), "kept\n\n");
    }

    #[tokio::test]
    async fn invalid_zip_is_a_docx_failure() {
        let err = DocxExtractor::new()
            .extract(b"not a zip".to_vec(), &meta())
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("DOCX extraction failed:"));
    }

    #[tokio::test]
    async fn archive_without_document_part_fails() {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut cursor);
            zip.start_file("other.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"<x/>").unwrap();
            zip.finish().unwrap();
        }
        let err = DocxExtractor::new()
            .extract(cursor.into_inner(), &meta())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "DOCX extraction failed: word/document.xml not found"
        );
    }
}
