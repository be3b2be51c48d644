//! # docseek core
//!
//! Shared logic for docseek: data models, the document store,
//! the inverted full-text index, fuzzy matching, snippet generation and
//! the snapshot bundle used to persist an index between sessions.
//!
//! This crate contains no tokio, filesystem I/O, or format parsers. Text
//! extraction lives in the `docseek` application crate, which feeds the
//! cleaned text into the types defined here.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | File metadata, documents, queries and results |
//! | [`store`] | Document store trait and in-memory implementation |
//! | [`index`] | Inverted index with BM25+ ranking, prefix and fuzzy expansion |
//! | [`search`] | Query execution and result hydration |
//! | [`snippet`] | Snippet windows with highlight ranges |
//! | [`snapshot`] | Export/import bundle |

pub mod error;
pub mod fuzzy;
pub mod index;
pub mod models;
pub mod search;
pub mod snapshot;
pub mod snippet;
pub mod store;

pub use error::{IndexError, SnapshotError};
pub use index::{IndexHit, IndexOptions, SearchIndex};
pub use models::{
    content_hash, extension_of, DateRange, DocumentContent, FileMetadata, FileType, SearchFilters,
    SearchQuery, SearchResult, SearchSnippet,
};
pub use search::{search, SearchOptions};
pub use snapshot::{IndexSnapshot, SearchData};
pub use snippet::SnippetOptions;
pub use store::{memory::InMemoryStore, Lookup, Store};
