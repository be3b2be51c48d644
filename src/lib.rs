//! # docseek
//!
//! A local-first document search engine. Files never leave the machine:
//! text is extracted from PDF, DOCX, CSV, HTML, plain text, Markdown and
//! images, indexed in memory, and served as ranked results with
//! highlighted snippets.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────────┐
//! │ SourceFiles │──▶│  Extractor  │──▶│  Store + Index   │
//! │ bytes+names │   │  Registry   │   │  (docseek-core)  │
//! └─────────────┘   └─────────────┘   └────────┬─────────┘
//!                                              │
//!                                     ┌────────▼─────────┐
//!                                     │   SearchEngine   │
//!                                     │ search / export  │
//!                                     └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docseek index ./docs --query "quarterly revenue"
//! docseek index ./docs --export session.json
//! docseek query --snapshot session.json "revenue"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`extract`] | Per-format text extractors and cleaning helpers |
//! | [`registry`] | Extension → extractor table |
//! | [`ingest`] | Per-file ingestion pipeline and processing status |
//! | [`engine`] | The search engine facade |
//! | [`progress`] | Progress and error reporting |
//! | [`logging`] | Log sinks and tracing setup |
//! | [`export`] | Snapshot files |
//! | [`scan`] | Collecting files from disk |

pub mod config;
pub mod engine;
pub mod export;
pub mod extract;
pub mod ingest;
pub mod logging;
pub mod progress;
pub mod registry;
pub mod scan;

pub use docseek_core::{
    DateRange, FileMetadata, FileType, IndexSnapshot, SearchFilters, SearchQuery, SearchResult,
    SearchSnippet,
};
pub use engine::SearchEngine;
pub use ingest::{IngestFailure, IngestReport, ProcessingStatus, SourceFile};
