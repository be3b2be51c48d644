//! Shared text cleaning and encoding detection.
//!
//! Every extractor runs its raw output through [`normalize_text`] before it
//! becomes a document, and the text-based formats decode their bytes with
//! [`decode_text`].

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

/// Normalize extracted text.
///
/// - CRLF and lone CR become LF.
/// - Each line is trimmed.
/// - Runs of blank lines collapse to one blank line (never 3+ newlines).
/// - Leading and trailing blank lines are dropped.
///
/// Idempotent: `normalize_text(&normalize_text(s)) == normalize_text(s)`.
pub fn normalize_text(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut out = String::with_capacity(unified.len());
    let mut pending_blank = false;
    for line in unified.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if pending_blank {
                out.push('\n');
            }
        }
        pending_blank = false;
        out.push_str(line);
    }
    out
}

/// Pick the encoding of a byte buffer.
///
/// A byte-order mark wins. Otherwise bytes that are valid UTF-8 are UTF-8,
/// and anything else is treated as Latin-1 (windows-1252).
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }
    if std::str::from_utf8(bytes).is_ok() {
        UTF_8
    } else {
        WINDOWS_1252
    }
}

/// Decode bytes with the detected encoding. Never fails: the Latin-1
/// fallback maps every byte to a char.
pub fn decode_text(bytes: &[u8]) -> String {
    let encoding = detect_encoding(bytes);
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(encoding = encoding.name(), "decoded with replacement characters");
    }
    text.into_owned()
}
