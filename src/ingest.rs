//! Ingestion pipeline.
//!
//! Turns a batch of [`SourceFile`]s into stored, indexed documents. Each
//! file goes through the same steps:
//!
//! 1. derive the extension key from the name (`unknown` when there is none),
//! 2. look up an extractor (a miss skips the file),
//! 3. read the bytes and hash them,
//! 4. build [`FileMetadata`],
//! 5. extract cleaned text,
//! 6. commit metadata and the document to the store and the index.
//!
//! Steps 1 to 5 may run for several files at once (bounded by the
//! configured concurrency). Step 6 always runs on the single consumer of the
//! batch stream, so each file's commit is atomic with respect to every other
//! file and progress counts only ever go up. A failure in any step is
//! recorded against that file and the batch moves on.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use docseek_core::{DocumentContent, FileMetadata, IndexError, SearchIndex, Store};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use thiserror::Error;

use crate::extract::ExtractError;
use crate::logging::{LogLevel, LogSink};
use crate::progress::{IngestEvent, ProgressReporter};
use crate::registry::ExtractorRegistry;

/// Extension key used when a file name has none.
pub const UNKNOWN_KEY: &str = "unknown";

/// Where a file's bytes come from.
#[derive(Debug, Clone)]
pub enum FileSource {
    Memory(Vec<u8>),
    /// Read lazily when the file's turn comes.
    Path(PathBuf),
}

/// One input file: content plus the descriptors a browser `File` carries.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub relative_path: Option<String>,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub source: FileSource,
}

impl SourceFile {
    /// In-memory file, modified now.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            relative_path: None,
            size: bytes.len() as u64,
            last_modified: Utc::now(),
            source: FileSource::Memory(bytes),
        }
    }

    pub fn with_relative_path(mut self, path: impl Into<String>) -> Self {
        self.relative_path = Some(path.into());
        self
    }

    pub fn with_last_modified(mut self, ts: DateTime<Utc>) -> Self {
        self.last_modified = ts;
        self
    }

    /// File on disk. Size and modification time are read now, bytes later.
    pub async fn from_path(path: &Path, relative_path: Option<String>) -> std::io::Result<Self> {
        let meta = tokio::fs::metadata(path).await?;
        let modified = meta.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self {
            name,
            relative_path,
            size: meta.len(),
            last_modified: DateTime::<Utc>::from(modified),
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    /// Lowercase extension key for registry lookup.
    pub fn key(&self) -> String {
        let ext = docseek_core::extension_of(&self.name);
        if ext.is_empty() {
            UNKNOWN_KEY.to_string()
        } else {
            ext
        }
    }

    async fn read(self) -> std::io::Result<Vec<u8>> {
        match self.source {
            FileSource::Memory(bytes) => Ok(bytes),
            FileSource::Path(path) => tokio::fs::read(&path).await,
        }
    }
}

/// Batch-level stage, for progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Idle,
    Uploading,
    Processing,
    Indexing,
    Complete,
    Error,
}

impl ProcessingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessingStatus::Complete | ProcessingStatus::Error)
    }

    /// Allowed moves: forward one stage at a time, `error` from any
    /// non-terminal stage, and a restart from a terminal stage.
    pub fn can_transition(self, next: ProcessingStatus) -> bool {
        use ProcessingStatus::*;
        match (self, next) {
            (Idle, Uploading) | (Uploading, Processing) | (Processing, Indexing) => true,
            (Indexing, Complete) => true,
            (from, Error) => !from.is_terminal(),
            (Complete | Error, Uploading) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessingStatus::Idle => "idle",
            ProcessingStatus::Uploading => "uploading",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Indexing => "indexing",
            ProcessingStatus::Complete => "complete",
            ProcessingStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Failures that stop a whole batch. Per-file problems never do.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestError {
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: ProcessingStatus,
        to: ProcessingStatus,
    },

    #[error("commit of {file} failed: {source}")]
    Commit {
        file: String,
        #[source]
        source: IndexError,
    },

    #[error("store and index disagree: {stored} stored documents, {indexed} indexed")]
    Inconsistent { stored: usize, indexed: usize },
}

/// One file that did not make it into the index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestFailure {
    pub name: String,
    pub message: String,
    /// No extractor for the file's type, as opposed to a failed extraction.
    pub skipped: bool,
}

impl fmt::Display for IngestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// Outcome of one `index_files` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub total: usize,
    pub indexed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// File ids of the indexed files, in commit order.
    pub file_ids: Vec<String>,
    pub failures: Vec<IngestFailure>,
}

/// A file that made it through steps 1 to 5.
struct Prepared {
    metadata: FileMetadata,
    document: DocumentContent,
}

/// Steps 1 to 5 for one file.
async fn prepare(registry: &ExtractorRegistry, file: SourceFile) -> Result<Prepared, ExtractError> {
    let key = file.key();
    let extractor = registry
        .get(&key)
        .ok_or_else(|| ExtractError::Unsupported(key.clone()))?;

    let name = file.name.clone();
    let relative_path = file.relative_path.clone();
    let size = file.size;
    let last_modified = file.last_modified;
    let bytes = file
        .read()
        .await
        .map_err(|e| ExtractError::failed(extractor.format(), format!("read failed: {}", e)))?;

    let metadata =
        FileMetadata::new(&name, relative_path.as_deref(), size, last_modified).with_hash(&bytes);
    let document = extractor.extract(bytes, &metadata).await?;
    Ok(Prepared { metadata, document })
}

/// Step 6. Either everything lands or nothing does.
fn commit(store: &dyn Store, index: &SearchIndex, prepared: Prepared) -> Result<String, IndexError> {
    let Prepared { metadata, document } = prepared;
    let file_id = metadata.id.clone();
    let document_id = document.id.clone();

    store.set_metadata(metadata);
    store.add_documents(vec![document.clone()]);
    if let Err(e) = index.add_documents(&[document]) {
        store.remove_document(&document_id);
        store.remove_metadata(&file_id);
        return Err(e);
    }
    Ok(file_id)
}

/// Everything a batch run writes to.
pub(crate) struct Pipeline<'a> {
    pub registry: &'a ExtractorRegistry,
    pub store: &'a dyn Store,
    pub index: &'a SearchIndex,
    pub log: &'a dyn LogSink,
    pub reporter: &'a dyn ProgressReporter,
    pub concurrency: usize,
}

impl Pipeline<'_> {
    /// Run every file through the pipeline. `on_failure` sees each per-file
    /// failure as it happens.
    pub(crate) async fn run(
        &self,
        files: Vec<SourceFile>,
        mut on_failure: impl FnMut(&IngestFailure),
    ) -> Result<IngestReport, IngestError> {
        let total = files.len();
        let mut report = IngestReport {
            total,
            ..IngestReport::default()
        };
        self.log.log(
            LogLevel::Info,
            "ingest",
            "batch started",
            Some(serde_json::json!({ "files": total, "concurrency": self.concurrency })),
        );

        let registry = self.registry;
        let mut results = stream::iter(files)
            .map(|file| async move {
                let name = file.name.clone();
                (name, prepare(registry, file).await)
            })
            .buffer_unordered(self.concurrency.max(1));

        let mut current = 0usize;
        while let Some((name, prepared)) = results.next().await {
            current += 1;
            match prepared {
                Ok(prepared) => match commit(self.store, self.index, prepared) {
                    Ok(file_id) => {
                        report.indexed += 1;
                        self.log.log(
                            LogLevel::Debug,
                            "ingest",
                            &format!("indexed {}", name),
                            Some(serde_json::json!({ "fileId": file_id })),
                        );
                        report.file_ids.push(file_id);
                    }
                    Err(source) => {
                        self.log.log(
                            LogLevel::Error,
                            "ingest",
                            &format!("commit of {} failed: {}", name, source),
                            None,
                        );
                        return Err(IngestError::Commit { file: name, source });
                    }
                },
                Err(e) => {
                    let skipped = matches!(e, ExtractError::Unsupported(_));
                    let failure = IngestFailure {
                        name: name.clone(),
                        message: e.to_string(),
                        skipped,
                    };
                    if skipped {
                        report.skipped += 1;
                    } else {
                        report.failed += 1;
                    }
                    self.log.log(
                        if skipped { LogLevel::Warn } else { LogLevel::Error },
                        "extract",
                        &failure.to_string(),
                        None,
                    );
                    self.reporter.report(IngestEvent::Failed {
                        name: failure.name.clone(),
                        message: failure.message.clone(),
                    });
                    on_failure(&failure);
                    report.failures.push(failure);
                }
            }
            self.reporter.report(IngestEvent::File {
                current,
                total,
                name,
            });
        }

        self.log.log(
            LogLevel::Info,
            "ingest",
            "batch finished",
            Some(serde_json::json!({
                "indexed": report.indexed,
                "failed": report.failed,
                "skipped": report.skipped,
            })),
        );
        Ok(report)
    }
}
