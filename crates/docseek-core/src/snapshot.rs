//! Export/import bundle for a document store and search index pair.
//!
//! A snapshot carries everything needed to rebuild a session: file
//! metadata plus the stored documents. The index itself is not serialized;
//! it is rebuilt from the documents on restore, which keeps the bundle
//! independent of index internals.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SnapshotError;
use crate::index::SearchIndex;
use crate::models::{DocumentContent, FileMetadata};
use crate::store::Store;

/// Bumped whenever the `searchData` layout changes.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchData {
    pub version: u32,
    pub documents: Vec<DocumentContent>,
}

/// A stored index: `{id, name, created, fileCount, metadata, searchData}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSnapshot {
    pub id: String,
    pub name: String,
    pub created: DateTime<Utc>,
    pub file_count: usize,
    pub metadata: Vec<FileMetadata>,
    pub search_data: SearchData,
}

impl IndexSnapshot {
    /// Capture the current contents of `store`.
    pub fn capture<S: Store + ?Sized>(name: &str, store: &S) -> Self {
        let (metadata, documents) = store.contents();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created: Utc::now(),
            file_count: metadata.len(),
            metadata,
            search_data: SearchData {
                version: SNAPSHOT_VERSION,
                documents,
            },
        }
    }

    /// Check the bundle is internally consistent.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.search_data.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.search_data.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        if self.file_count != self.metadata.len() {
            return Err(SnapshotError::FileCountMismatch {
                declared: self.file_count,
                actual: self.metadata.len(),
            });
        }
        let mut known = HashSet::new();
        for meta in &self.metadata {
            if !known.insert(meta.id.as_str()) {
                return Err(SnapshotError::DuplicateFile(meta.id.clone()));
            }
        }
        let mut seen = HashSet::new();
        for doc in &self.search_data.documents {
            if !seen.insert(doc.id.as_str()) {
                return Err(SnapshotError::DuplicateDocument(doc.id.clone()));
            }
        }
        if let Some(orphan) = self
            .search_data
            .documents
            .iter()
            .find(|d| !known.contains(d.file_id.as_str()))
        {
            return Err(SnapshotError::OrphanDocument {
                document_id: orphan.id.clone(),
                file_id: orphan.file_id.clone(),
            });
        }
        Ok(())
    }

    /// Replace the contents of `store` and `index` with this snapshot.
    ///
    /// The bundle is validated and the new index built before anything is
    /// swapped, so an invalid bundle leaves both untouched. Each side is
    /// replaced in a single write; a query running in between sees index
    /// hits the store no longer holds, which [`search`](crate::search::search)
    /// skips.
    pub fn restore<S: Store + ?Sized>(
        &self,
        store: &S,
        index: &SearchIndex,
    ) -> Result<(), SnapshotError> {
        self.validate()?;

        index.rebuild(&self.search_data.documents)?;
        store.replace_all(self.metadata.clone(), self.search_data.documents.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{search, SearchOptions};
    use crate::store::memory::InMemoryStore;
    use crate::SearchQuery;

    fn populated() -> (InMemoryStore, SearchIndex) {
        let store = InMemoryStore::new();
        let index = SearchIndex::default();
        for (name, text) in [("a.txt", "apples and pears"), ("b.md", "pears only")] {
            let meta = FileMetadata::new(name, None, text.len() as u64, Utc::now())
                .with_hash(text.as_bytes());
            let doc = DocumentContent::new(&meta.id, text.to_string());
            store.set_metadata(meta);
            store.add_documents(vec![doc.clone()]);
            index.add_documents(&[doc]).unwrap();
        }
        (store, index)
    }

    #[test]
    fn capture_and_restore_rebuilds_search() {
        let (store, _index) = populated();
        let snapshot = IndexSnapshot::capture("session", &store);
        assert_eq!(snapshot.file_count, 2);
        assert_eq!(snapshot.search_data.documents.len(), 2);

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"fileCount\":2"));
        assert!(json.contains("\"searchData\""));
        let parsed: IndexSnapshot = serde_json::from_str(&json).unwrap();

        let fresh_store = InMemoryStore::new();
        let fresh_index = SearchIndex::default();
        parsed.restore(&fresh_store, &fresh_index).unwrap();
        assert_eq!(fresh_store.file_count(), 2);
        assert_eq!(fresh_index.document_count(), 2);

        let results = search(
            &fresh_index,
            &fresh_store,
            &SearchQuery::new("apples"),
            &SearchOptions::default(),
        )
        .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].metadata.name, "a.txt");
        assert!(results[0].metadata.has_hash());
    }

    #[test]
    fn restore_replaces_existing_contents() {
        let (store, index) = populated();
        let snapshot = IndexSnapshot::capture("empty", &InMemoryStore::new());
        snapshot.restore(&store, &index).unwrap();
        assert_eq!(store.file_count(), 0);
        assert_eq!(index.document_count(), 0);
    }

    #[test]
    fn invalid_bundles_leave_state_untouched() {
        let (store, index) = populated();

        let mut wrong_version = IndexSnapshot::capture("v", &store);
        wrong_version.search_data.version = 99;
        assert!(matches!(
            wrong_version.restore(&store, &index),
            Err(SnapshotError::UnsupportedVersion { found: 99, .. })
        ));

        let mut orphan = IndexSnapshot::capture("o", &store);
        orphan.metadata.pop();
        orphan.file_count = orphan.metadata.len();
        assert!(matches!(
            orphan.restore(&store, &index),
            Err(SnapshotError::OrphanDocument { .. })
        ));

        let mut miscounted = IndexSnapshot::capture("c", &store);
        miscounted.file_count = 7;
        assert!(matches!(
            miscounted.validate(),
            Err(SnapshotError::FileCountMismatch { declared: 7, actual: 2 })
        ));

        assert_eq!(store.file_count(), 2);
        assert_eq!(index.document_count(), 2);
    }

    #[test]
    fn duplicated_entries_are_rejected_before_any_change() {
        let (store, index) = populated();

        let mut repeated_doc = IndexSnapshot::capture("d", &store);
        let first = repeated_doc.search_data.documents[0].clone();
        repeated_doc.search_data.documents.push(first.clone());
        assert!(matches!(
            repeated_doc.restore(&store, &index),
            Err(SnapshotError::DuplicateDocument(id)) if id == first.id
        ));

        let mut repeated_file = IndexSnapshot::capture("f", &store);
        let meta = repeated_file.metadata[0].clone();
        repeated_file.metadata.push(meta);
        repeated_file.file_count = 3;
        assert!(matches!(
            repeated_file.validate(),
            Err(SnapshotError::DuplicateFile(_))
        ));

        assert_eq!(store.file_count(), 2);
        assert_eq!(store.document_count(), 2);
        assert_eq!(index.document_count(), 2);
        let results = search(
            &index,
            &store,
            &SearchQuery::new("pears"),
            &SearchOptions::default(),
        )
        .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn queries_during_repeated_restores_never_see_missing_metadata() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let (store, index) = populated();
        let snapshot = IndexSnapshot::capture("loop", &store);
        let store = Arc::new(store);
        let index = Arc::new(index);
        let done = Arc::new(AtomicBool::new(false));

        let reader = {
            let (store, index, done) = (store.clone(), index.clone(), done.clone());
            std::thread::spawn(move || {
                let query = SearchQuery::new("pears");
                let options = SearchOptions::default();
                let mut queries = 0usize;
                while !done.load(Ordering::Relaxed) || queries == 0 {
                    let results = search(&*index, &*store, &query, &options).unwrap();
                    assert!(results.len() <= 2);
                    queries += 1;
                }
                queries
            })
        };

        for _ in 0..2_000 {
            snapshot.restore(&*store, &*index).unwrap();
        }
        done.store(true, Ordering::Relaxed);
        assert!(reader.join().unwrap() > 0);
        assert_eq!(store.document_count(), 2);
        assert_eq!(index.document_count(), 2);
    }
}
