//! The search engine facade.
//!
//! [`SearchEngine`] owns one session: the extractor registry, the document
//! store, the search index and the ingestion state. Callers need two calls,
//! [`index_files`](SearchEngine::index_files) then
//! [`search`](SearchEngine::search); everything else (status, error list,
//! counts, removal, snapshots) is for UIs and tooling.
//!
//! Writers (ingestion, removal, import, clear) are serialized through one
//! async mutex. Queries take no writer lock and may run at any time; a query
//! that overlaps a batch sees each file either fully committed or absent.

use std::sync::Arc;

use docseek_core::{
    IndexError, IndexSnapshot, InMemoryStore, SearchIndex, SearchOptions, SearchQuery,
    SearchResult, SnapshotError, Store,
};
use parking_lot::Mutex;

use crate::config::Config;
use crate::extract::image::{NoOcr, OcrEngine};
use crate::ingest::{
    IngestError, IngestFailure, IngestReport, Pipeline, ProcessingStatus, SourceFile,
};
use crate::logging::{LogLevel, LogSink, TracingSink};
use crate::progress::{IngestEvent, ProgressReporter};
use crate::registry::{default_registry, ExtractorRegistry};

pub struct SearchEngine {
    registry: Arc<ExtractorRegistry>,
    store: Arc<dyn Store>,
    index: SearchIndex,
    search_options: SearchOptions,
    concurrency: usize,
    log: Arc<dyn LogSink>,
    status: Mutex<ProcessingStatus>,
    errors: Mutex<Vec<IngestFailure>>,
    writer: tokio::sync::Mutex<()>,
}

impl SearchEngine {
    /// Engine with the built-in extractors, no OCR and tracing logs.
    pub fn new(config: &Config) -> Self {
        Self::with_ocr(config, Arc::new(NoOcr))
    }

    pub fn with_ocr(config: &Config, ocr: Arc<dyn OcrEngine>) -> Self {
        Self {
            registry: Arc::new(default_registry(ocr, config.image_limits())),
            store: Arc::new(InMemoryStore::with_snippet_options(config.snippet_options())),
            index: SearchIndex::new(config.index_options()),
            search_options: config.search_options(),
            concurrency: config.ingest.concurrency.max(1),
            log: Arc::new(TracingSink),
            status: Mutex::new(ProcessingStatus::Idle),
            errors: Mutex::new(Vec::new()),
            writer: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    pub fn with_registry(mut self, registry: ExtractorRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Ingest a batch. Per-file failures are reported and collected but
    /// never abort the batch; only a commit-level failure does, and it
    /// leaves the engine in [`ProcessingStatus::Error`].
    pub async fn index_files(
        &self,
        files: Vec<SourceFile>,
        reporter: &dyn ProgressReporter,
    ) -> Result<IngestReport, IngestError> {
        let _writer = self.writer.lock().await;

        {
            // A dropped index_files future leaves its stage behind.
            let mut status = self.status.lock();
            if !status.is_terminal() && *status != ProcessingStatus::Idle {
                *status = ProcessingStatus::Error;
            }
        }
        self.advance(ProcessingStatus::Uploading, reporter)?;
        self.errors.lock().clear();
        self.advance(ProcessingStatus::Processing, reporter)?;

        let pipeline = Pipeline {
            registry: &self.registry,
            store: self.store.as_ref(),
            index: &self.index,
            log: self.log.as_ref(),
            reporter,
            concurrency: self.concurrency,
        };
        let result = pipeline
            .run(files, |failure| self.errors.lock().push(failure.clone()))
            .await;
        let report = match result {
            Ok(report) => report,
            Err(e) => return Err(self.fail(e, reporter)),
        };

        self.advance(ProcessingStatus::Indexing, reporter)?;
        let stored = self.store.document_count();
        let indexed = self.index.document_count();
        if stored != indexed {
            return Err(self.fail(IngestError::Inconsistent { stored, indexed }, reporter));
        }
        self.log.log(
            LogLevel::Debug,
            "ingest",
            "index ready",
            Some(serde_json::json!({ "documents": indexed, "terms": self.index.term_count() })),
        );
        self.advance(ProcessingStatus::Complete, reporter)?;
        Ok(report)
    }

    fn advance(
        &self,
        next: ProcessingStatus,
        reporter: &dyn ProgressReporter,
    ) -> Result<(), IngestError> {
        {
            let mut status = self.status.lock();
            if !status.can_transition(next) {
                return Err(IngestError::InvalidTransition {
                    from: *status,
                    to: next,
                });
            }
            *status = next;
        }
        reporter.report(IngestEvent::Status(next));
        Ok(())
    }

    fn fail(&self, error: IngestError, reporter: &dyn ProgressReporter) -> IngestError {
        self.log
            .log(LogLevel::Error, "ingest", &error.to_string(), None);
        *self.status.lock() = ProcessingStatus::Error;
        reporter.report(IngestEvent::Status(ProcessingStatus::Error));
        error
    }

    /// Ranked, hydrated results. Empty or whitespace text gives `[]`.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, IndexError> {
        let results = docseek_core::search(
            &self.index,
            self.store.as_ref(),
            query,
            &self.search_options,
        )?;
        self.log.log(
            LogLevel::Debug,
            "search",
            "query",
            Some(serde_json::json!({ "text": query.text, "results": results.len() })),
        );
        Ok(results)
    }

    /// `search` with just text and an optional limit.
    pub fn search_text(
        &self,
        text: &str,
        limit: Option<usize>,
    ) -> Result<Vec<SearchResult>, IndexError> {
        let mut query = SearchQuery::new(text);
        query.limit = limit;
        self.search(&query)
    }

    pub fn status(&self) -> ProcessingStatus {
        *self.status.lock()
    }

    /// Per-file failures of the most recent batch.
    pub fn errors(&self) -> Vec<IngestFailure> {
        self.errors.lock().clone()
    }

    /// Number of indexed files.
    pub fn file_count(&self) -> usize {
        self.store.file_count()
    }

    pub fn document_count(&self) -> usize {
        self.index.document_count()
    }

    pub fn term_count(&self) -> usize {
        self.index.term_count()
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Drop a file's documents from index and store, then its metadata.
    /// Returns false if the file is unknown.
    pub async fn remove_file(&self, file_id: &str) -> bool {
        let _writer = self.writer.lock().await;
        let Some(meta) = self.store.get_metadata(file_id) else {
            return false;
        };
        for doc in self.store.documents_for_file(file_id) {
            self.index.remove_document(&doc.id);
            self.store.remove_document(&doc.id);
        }
        self.store.remove_metadata(file_id);
        self.log.log(
            LogLevel::Info,
            "ingest",
            &format!("removed {}", meta.path),
            Some(serde_json::json!({ "fileId": file_id })),
        );
        true
    }

    /// Empty the session.
    pub async fn clear(&self) {
        let _writer = self.writer.lock().await;
        self.index.clear();
        self.store.clear();
        self.errors.lock().clear();
        *self.status.lock() = ProcessingStatus::Idle;
    }

    /// Capture the store as it stands. The capture is one consistent read,
    /// so it never holds a document without its metadata.
    pub fn export_snapshot(&self, name: &str) -> IndexSnapshot {
        let snapshot = IndexSnapshot::capture(name, self.store.as_ref());
        self.log.log(
            LogLevel::Info,
            "snapshot",
            &format!("exported {}", name),
            Some(serde_json::json!({ "files": snapshot.file_count })),
        );
        snapshot
    }

    /// Replace the session with `snapshot`. An invalid bundle changes nothing.
    pub async fn import_snapshot(&self, snapshot: &IndexSnapshot) -> Result<(), SnapshotError> {
        let _writer = self.writer.lock().await;
        if let Err(e) = snapshot.restore(self.store.as_ref(), &self.index) {
            self.log
                .log(LogLevel::Error, "snapshot", &format!("import failed: {}", e), None);
            return Err(e);
        }
        self.errors.lock().clear();
        *self.status.lock() = ProcessingStatus::Idle;
        self.log.log(
            LogLevel::Info,
            "snapshot",
            &format!("imported {}", snapshot.name),
            Some(serde_json::json!({ "files": snapshot.file_count })),
        );
        Ok(())
    }
}
