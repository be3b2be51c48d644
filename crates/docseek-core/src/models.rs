//! Core data models used throughout docseek.
//!
//! These types describe the files that enter the ingestion pipeline, the
//! documents extracted from them, and the queries and results that flow
//! out of the search engine. Serialized field names are camelCase so a
//! snapshot bundle reads the same from any consumer.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Classification of a file, derived from its extension.
///
/// Closed set: anything that is not one of the known document formats is
/// [`FileType::Unknown`] (image files included; they are dispatched to an
/// extractor by extension, not by type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
    Txt,
    Md,
    Csv,
    Html,
    Unknown,
}

impl FileType {
    /// Classify a lowercase or mixed-case extension (without the dot).
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => FileType::Pdf,
            "docx" => FileType::Docx,
            "txt" => FileType::Txt,
            "md" | "markdown" => FileType::Md,
            "csv" => FileType::Csv,
            "html" | "htm" => FileType::Html,
            _ => FileType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Docx => "docx",
            FileType::Txt => "txt",
            FileType::Md => "md",
            FileType::Csv => "csv",
            FileType::Html => "html",
            FileType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercased suffix after the last `.` of a file name, or `""` if there is none.
///
/// ```
/// use docseek_core::extension_of;
///
/// assert_eq!(extension_of("Report.PDF"), "pdf");
/// assert_eq!(extension_of("archive.tar.gz"), "gz");
/// assert_eq!(extension_of("README"), "");
/// ```
pub fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

/// SHA-256 of the raw bytes, hex encoded.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Canonical descriptor of one ingested file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// Generated at ingestion time, never reused within a session.
    pub id: String,
    /// Display path: the relative folder path when the source has one,
    /// otherwise the bare file name.
    pub path: String,
    pub name: String,
    /// Lowercase extension used for extractor dispatch, `""` if none.
    pub extension: String,
    /// Byte length of the original file.
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    #[serde(rename = "type")]
    pub file_type: FileType,
    /// Hex SHA-256 of the raw bytes. Empty until computed.
    #[serde(default)]
    pub hash: String,
}

impl FileMetadata {
    /// Describe a new file with a fresh id. The hash is left empty.
    pub fn new(
        name: &str,
        relative_path: Option<&str>,
        size: u64,
        last_modified: DateTime<Utc>,
    ) -> Self {
        let extension = extension_of(name);
        let path = match relative_path {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => name.to_string(),
        };
        Self {
            id: Uuid::new_v4().to_string(),
            path,
            name: name.to_string(),
            file_type: FileType::from_extension(&extension),
            extension,
            size,
            last_modified,
            hash: String::new(),
        }
    }

    /// Fill in the content hash from the raw bytes.
    pub fn with_hash(mut self, bytes: &[u8]) -> Self {
        self.hash = content_hash(bytes);
        self
    }

    pub fn has_hash(&self) -> bool {
        !self.hash.is_empty()
    }
}

/// One indexed unit of extracted text. Today every file yields exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentContent {
    pub id: String,
    pub file_id: String,
    /// Cleaned plain text.
    pub text: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl DocumentContent {
    /// Wrap already-cleaned text in a document with a fresh id.
    pub fn new(file_id: &str, text: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            file_id: file_id.to_string(),
            text,
            metadata: serde_json::Map::new(),
        }
    }
}

/// A bounded excerpt around one query match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSnippet {
    pub text: String,
    /// Character offsets of the match within the full document text.
    pub positions: Vec<usize>,
    /// `[start, end)` character ranges relative to `text`.
    pub highlights: Vec<(usize, usize)>,
}

/// A ranked, hydrated search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub file_id: String,
    /// Engine relevance, higher is better. Not normalized.
    pub score: f64,
    pub snippets: Vec<SearchSnippet>,
    pub metadata: FileMetadata,
}

/// Inclusive bounds on `FileMetadata::last_modified`. Open ends are unbounded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| *ts >= s) && self.end.map_or(true, |e| *ts <= e)
    }
}

/// Optional result filters. Every populated field must match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default)]
    pub file_types: Option<Vec<FileType>>,
    /// Glob patterns over `FileMetadata::path`; plain strings match as prefixes.
    #[serde(default)]
    pub paths: Option<Vec<String>>,
    /// Accepted for shape compatibility; not enforced.
    #[serde(default)]
    pub languages: Option<Vec<String>>,
    #[serde(default)]
    pub date_range: Option<DateRange>,
}

/// A search request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    /// Maximum results. Falls back to the engine default when absent.
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub filters: Option<SearchFilters>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: None,
            filters: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = Some(filters);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased_suffix() {
        assert_eq!(extension_of("notes.TXT"), "txt");
        assert_eq!(extension_of("a.b.c.Md"), "md");
        assert_eq!(extension_of("Makefile"), "");
        assert_eq!(extension_of("trailing."), "");
    }

    #[test]
    fn file_type_classification() {
        assert_eq!(FileType::from_extension("PDF"), FileType::Pdf);
        assert_eq!(FileType::from_extension("htm"), FileType::Html);
        assert_eq!(FileType::from_extension("markdown"), FileType::Md);
        assert_eq!(FileType::from_extension("png"), FileType::Unknown);
        assert_eq!(FileType::from_extension(""), FileType::Unknown);
    }

    #[test]
    fn metadata_prefers_relative_path() {
        let now = Utc::now();
        let with_path = FileMetadata::new("a.md", Some("docs/a.md"), 3, now);
        assert_eq!(with_path.path, "docs/a.md");
        assert_eq!(with_path.file_type, FileType::Md);

        let bare = FileMetadata::new("a.md", None, 3, now);
        assert_eq!(bare.path, "a.md");
        assert!(!bare.has_hash());
        assert_ne!(bare.id, with_path.id);
    }

    #[test]
    fn hash_is_deterministic() {
        let now = Utc::now();
        let a = FileMetadata::new("x.txt", None, 5, now).with_hash(b"hello");
        let b = FileMetadata::new("y.txt", None, 5, now).with_hash(b"hello");
        assert_eq!(a.hash, b.hash);
        assert_eq!(
            a.hash,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn metadata_serializes_type_and_camel_case() {
        let meta = FileMetadata::new("r.csv", None, 1, Utc::now());
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["type"], "csv");
        assert!(json.get("lastModified").is_some());
    }

    #[test]
    fn date_range_is_inclusive() {
        let t = Utc::now();
        let range = DateRange {
            start: Some(t),
            end: Some(t),
        };
        assert!(range.contains(&t));
        assert!(DateRange::default().contains(&t));
        assert!(!range.contains(&(t + chrono::Duration::seconds(1))));
    }
}
