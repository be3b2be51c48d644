//! Images: OCR behind guards, SVG text nodes.
//!
//! Raster images are checked before any pixel work: empty input, unknown
//! formats, byte size over [`ImageLimits::max_bytes`] and dimensions over
//! [`ImageLimits::max_dimension`] all produce a descriptive placeholder
//! instead of an error, so an image file always indexes (its name and shape
//! stay searchable). Recognition itself is delegated to an [`OcrEngine`] on
//! the blocking pool and bounded by [`ImageLimits::ocr_timeout`].
//!
//! SVG is text already: only `<text>`, `<tspan>`, `<title>` and `<desc>`
//! contents are kept.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docseek_core::{DocumentContent, FileMetadata};
use image::DynamicImage;
use quick_xml::events::Event;
use tracing::{debug, warn};

use super::{into_document, ExtractError, Extractor};

/// Recognizes text in a decoded image. Runs on a blocking thread.
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    fn recognize(&self, image: &DynamicImage) -> Result<String, String>;
}

/// Engine that recognizes nothing. Images index as placeholders.
pub struct NoOcr;

impl OcrEngine for NoOcr {
    fn name(&self) -> &str {
        "none"
    }

    fn recognize(&self, _image: &DynamicImage) -> Result<String, String> {
        Ok(String::new())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageLimits {
    pub max_bytes: u64,
    pub max_dimension: u32,
    pub ocr_timeout: Duration,
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self {
            max_bytes: 50 * 1024 * 1024,
            max_dimension: 10_000,
            ocr_timeout: Duration::from_secs(30),
        }
    }
}

pub struct ImageExtractor {
    engine: Arc<dyn OcrEngine>,
    limits: ImageLimits,
}

impl ImageExtractor {
    pub fn new(engine: Arc<dyn OcrEngine>, limits: ImageLimits) -> Self {
        Self { engine, limits }
    }

    async fn raster_text(&self, bytes: Vec<u8>, name: &str) -> String {
        if bytes.is_empty() {
            return placeholder(name, "empty file");
        }
        if bytes.len() as u64 > self.limits.max_bytes {
            return placeholder(
                name,
                &format!(
                    "too large for OCR ({} bytes, limit {})",
                    bytes.len(),
                    self.limits.max_bytes
                ),
            );
        }
        let format = match image::guess_format(&bytes) {
            Ok(f) => format!("{:?}", f).to_lowercase(),
            Err(_) => return placeholder(name, "not a recognized image format"),
        };
        let (width, height) = match image_dimensions(&bytes) {
            Ok(dims) => dims,
            Err(e) => return placeholder(name, &format!("unreadable {} image: {}", format, e)),
        };
        let shape = format!("{}x{} {}", width, height, format);
        let max = self.limits.max_dimension;
        if width > max || height > max {
            return placeholder(
                name,
                &format!("{} exceeds the {}x{} OCR limit", shape, max, max),
            );
        }

        let engine = Arc::clone(&self.engine);
        let task = tokio::task::spawn_blocking(move || {
            let img = image::load_from_memory(&bytes).map_err(|e| e.to_string())?;
            engine.recognize(&img)
        });
        // On timeout the blocking task is detached and finishes on its own.
        match tokio::time::timeout(self.limits.ocr_timeout, task).await {
            Err(_) => placeholder(
                name,
                &format!(
                    "{}, OCR timed out after {}s",
                    shape,
                    self.limits.ocr_timeout.as_secs_f32()
                ),
            ),
            Ok(Err(join)) => placeholder(name, &format!("{}, OCR aborted: {}", shape, join)),
            Ok(Ok(Err(e))) => {
                warn!(engine = self.engine.name(), error = %e, "ocr failed");
                placeholder(name, &format!("{}, OCR failed: {}", shape, e))
            }
            Ok(Ok(Ok(text))) if text.trim().is_empty() => {
                placeholder(name, &format!("{}, no text recognized", shape))
            }
            Ok(Ok(Ok(text))) => text,
        }
    }
}

impl Default for ImageExtractor {
    fn default() -> Self {
        Self::new(Arc::new(NoOcr), ImageLimits::default())
    }
}

fn placeholder(name: &str, reason: &str) -> String {
    format!("[Image: {}] {}", name, reason)
}

fn image_dimensions(bytes: &[u8]) -> image::ImageResult<(u32, u32)> {
    image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()
}

/// Collect the text of `<text>`, `<tspan>`, `<title>` and `<desc>` nodes,
/// one per line. Malformed markup keeps whatever was read before the error.
pub fn svg_text(bytes: &[u8]) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if is_text_node(e.local_name().as_ref()) {
                    depth += 1;
                }
            }
            Ok(Event::End(e)) => {
                if is_text_node(e.local_name().as_ref()) {
                    depth = depth.saturating_sub(1);
                }
            }
            Ok(Event::Text(te)) if depth > 0 => {
                let text = match te.unescape() {
                    Ok(t) => t.into_owned(),
                    Err(_) => String::from_utf8_lossy(&te).into_owned(),
                };
                let text = text.trim();
                if !text.is_empty() {
                    lines.push(text.to_string());
                }
            }
            Ok(Event::CData(cd)) if depth > 0 => {
                let text = String::from_utf8_lossy(&cd).trim().to_string();
                if !text.is_empty() {
                    lines.push(text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!(error = %e, "malformed svg, keeping partial text");
                break;
            }
            _ => {}
        }
        buf.clear();
    }
    lines.join("\n")
}

fn is_text_node(name: &[u8]) -> bool {
    matches!(name, b"text" | b"tspan" | b"title" | b"desc")
}

#[async_trait]
impl Extractor for ImageExtractor {
    fn format(&self) -> &'static str {
        "Image"
    }

    fn supports(&self, key: &str) -> bool {
        matches!(
            key,
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "webp" | "tiff" | "tif" | "svg"
        )
    }

    async fn extract(
        &self,
        bytes: Vec<u8>,
        metadata: &FileMetadata,
    ) -> Result<DocumentContent, ExtractError> {
        let text = if metadata.extension == "svg" {
            let text = svg_text(&bytes);
            if text.is_empty() {
                placeholder(&metadata.name, "svg without text")
            } else {
                text
            }
        } else {
            self.raster_text(bytes, &metadata.name).await
        };
        debug!(file = %metadata.name, chars = text.len(), "image extracted");
        Ok(into_document(&text, metadata))
    }
}

#[cfg(test)]
pub(crate) fn test_png(width: u32, height: u32) -> Vec<u8> {
    use image::{ImageBuffer, Rgba};

    let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 255, 0, 255])
            }
        });
    let mut bytes: Vec<u8> = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}
