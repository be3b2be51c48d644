//! Document store abstraction for docseek.
//!
//! The [`Store`] trait is the source of truth for extracted text and file
//! metadata during a session. The search index holds only a projection of
//! each document; result hydration (metadata and snippets) goes through
//! this trait.
//!
//! Implementations must be `Send + Sync`: the ingestion pipeline writes
//! while queries may read concurrently. Writers keep one ordering rule: a
//! document is only ever stored while its file's metadata is present, so a
//! single consistent read ([`Store::lookup`]) can tell a document that was
//! removed under a reader from one that was indexed without metadata.

pub mod memory;

use crate::models::{DocumentContent, FileMetadata, SearchSnippet};

/// Outcome of resolving an index hit against the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(FileMetadata),
    /// The document is no longer stored: a writer removed it after the
    /// index was read.
    Gone,
    /// The document is stored but its file has no metadata.
    MissingMetadata,
}

/// Abstract document/metadata store.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`add_documents`](Store::add_documents) | Upsert documents by id |
/// | [`set_metadata`](Store::set_metadata) | Upsert file metadata by file id |
/// | [`get_snippets`](Store::get_snippets) | Snippets for a query over a stored document |
/// | [`get_metadata`](Store::get_metadata) | Metadata for a file id |
/// | [`lookup`](Store::lookup) | Resolve an index hit in one consistent read |
/// | [`remove_document`](Store::remove_document) | Drop one document |
/// | [`replace_all`](Store::replace_all) | Swap in a whole new session |
/// | [`contents`](Store::contents) | Consistent copy of everything |
/// | [`clear`](Store::clear) | Drop everything |
pub trait Store: Send + Sync {
    /// Insert documents, replacing any with the same id.
    fn add_documents(&self, docs: Vec<DocumentContent>);

    /// Insert or replace the metadata for `metadata.id`.
    fn set_metadata(&self, metadata: FileMetadata);

    /// Snippets for `query` over the stored text of `document_id`.
    /// Empty when the document is unknown or nothing matches.
    fn get_snippets(&self, document_id: &str, query: &str) -> Vec<SearchSnippet>;

    fn get_metadata(&self, file_id: &str) -> Option<FileMetadata>;

    fn get_document(&self, document_id: &str) -> Option<DocumentContent>;

    /// Check `document_id` is stored and fetch the metadata of `file_id`,
    /// both under one read.
    fn lookup(&self, document_id: &str, file_id: &str) -> Lookup;

    /// Every document owned by `file_id`.
    fn documents_for_file(&self, file_id: &str) -> Vec<DocumentContent>;

    fn remove_document(&self, document_id: &str) -> Option<DocumentContent>;

    fn remove_metadata(&self, file_id: &str) -> Option<FileMetadata>;

    /// All metadata, ordered by path then id.
    fn all_metadata(&self) -> Vec<FileMetadata>;

    /// All documents, ordered by file id then id.
    fn all_documents(&self) -> Vec<DocumentContent>;

    /// `all_metadata` and `all_documents` taken under one read.
    fn contents(&self) -> (Vec<FileMetadata>, Vec<DocumentContent>);

    /// Replace everything with `metadata` and `docs` in one write.
    fn replace_all(&self, metadata: Vec<FileMetadata>, docs: Vec<DocumentContent>);

    fn file_count(&self) -> usize;

    fn document_count(&self) -> usize;

    fn clear(&self);
}
