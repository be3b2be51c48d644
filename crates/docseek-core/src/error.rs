//! Error types for index, search and snapshot operations.

use thiserror::Error;

/// Errors raised by the search index and query execution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    /// A document with this id is already indexed.
    #[error("duplicate document id: {0}")]
    DuplicateDocument(String),

    /// An index hit whose file has no metadata in the store. This is an
    /// ingestion bug (a document was indexed before its metadata was set).
    #[error("document {document_id} is indexed but file {file_id} has no metadata")]
    MissingMetadata {
        document_id: String,
        file_id: String,
    },

    /// A path filter could not be compiled into a glob.
    #[error("invalid path filter '{pattern}': {cause}")]
    InvalidFilter { pattern: String, cause: String },
}

/// Errors raised while restoring an [`IndexSnapshot`](crate::snapshot::IndexSnapshot).
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("snapshot declares {declared} files but carries metadata for {actual}")]
    FileCountMismatch { declared: usize, actual: usize },

    #[error("snapshot carries file {0} more than once")]
    DuplicateFile(String),

    #[error("snapshot carries document {0} more than once")]
    DuplicateDocument(String),

    #[error("document {document_id} references unknown file {file_id}")]
    OrphanDocument {
        document_id: String,
        file_id: String,
    },

    #[error(transparent)]
    Index(#[from] IndexError),
}
