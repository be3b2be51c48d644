//! In-memory [`Store`] implementation.
//!
//! Documents by document id and metadata by file id, both behind one
//! `parking_lot::RwLock` so that lookups, captures and replacements see a
//! single consistent state. Snippets are computed on demand from the
//! stored text.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::models::{DocumentContent, FileMetadata, SearchSnippet};
use crate::snippet::{build_snippets, SnippetOptions};

use super::{Lookup, Store};

#[derive(Default)]
struct Contents {
    documents: HashMap<String, DocumentContent>,
    metadata: HashMap<String, FileMetadata>,
}

impl Contents {
    fn sorted_metadata(&self) -> Vec<FileMetadata> {
        let mut all: Vec<FileMetadata> = self.metadata.values().cloned().collect();
        all.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.id.cmp(&b.id)));
        all
    }

    fn sorted_documents(&self) -> Vec<DocumentContent> {
        let mut all: Vec<DocumentContent> = self.documents.values().cloned().collect();
        all.sort_by(|a, b| a.file_id.cmp(&b.file_id).then_with(|| a.id.cmp(&b.id)));
        all
    }
}

/// Session-scoped document store.
pub struct InMemoryStore {
    contents: RwLock<Contents>,
    snippet_options: SnippetOptions,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_snippet_options(SnippetOptions::default())
    }

    pub fn with_snippet_options(snippet_options: SnippetOptions) -> Self {
        Self {
            contents: RwLock::new(Contents::default()),
            snippet_options,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for InMemoryStore {
    fn add_documents(&self, docs: Vec<DocumentContent>) {
        let mut contents = self.contents.write();
        for doc in docs {
            contents.documents.insert(doc.id.clone(), doc);
        }
    }

    fn set_metadata(&self, metadata: FileMetadata) {
        self.contents
            .write()
            .metadata
            .insert(metadata.id.clone(), metadata);
    }

    fn get_snippets(&self, document_id: &str, query: &str) -> Vec<SearchSnippet> {
        let contents = self.contents.read();
        match contents.documents.get(document_id) {
            Some(doc) => build_snippets(&doc.text, query, &self.snippet_options),
            None => Vec::new(),
        }
    }

    fn get_metadata(&self, file_id: &str) -> Option<FileMetadata> {
        self.contents.read().metadata.get(file_id).cloned()
    }

    fn get_document(&self, document_id: &str) -> Option<DocumentContent> {
        self.contents.read().documents.get(document_id).cloned()
    }

    fn lookup(&self, document_id: &str, file_id: &str) -> Lookup {
        let contents = self.contents.read();
        if !contents.documents.contains_key(document_id) {
            return Lookup::Gone;
        }
        match contents.metadata.get(file_id) {
            Some(meta) => Lookup::Found(meta.clone()),
            None => Lookup::MissingMetadata,
        }
    }

    fn documents_for_file(&self, file_id: &str) -> Vec<DocumentContent> {
        let mut docs: Vec<DocumentContent> = self
            .contents
            .read()
            .documents
            .values()
            .filter(|d| d.file_id == file_id)
            .cloned()
            .collect();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        docs
    }

    fn remove_document(&self, document_id: &str) -> Option<DocumentContent> {
        self.contents.write().documents.remove(document_id)
    }

    fn remove_metadata(&self, file_id: &str) -> Option<FileMetadata> {
        self.contents.write().metadata.remove(file_id)
    }

    fn all_metadata(&self) -> Vec<FileMetadata> {
        self.contents.read().sorted_metadata()
    }

    fn all_documents(&self) -> Vec<DocumentContent> {
        self.contents.read().sorted_documents()
    }

    fn contents(&self) -> (Vec<FileMetadata>, Vec<DocumentContent>) {
        let contents = self.contents.read();
        (contents.sorted_metadata(), contents.sorted_documents())
    }

    fn replace_all(&self, metadata: Vec<FileMetadata>, docs: Vec<DocumentContent>) {
        let fresh = Contents {
            documents: docs.into_iter().map(|d| (d.id.clone(), d)).collect(),
            metadata: metadata.into_iter().map(|m| (m.id.clone(), m)).collect(),
        };
        *self.contents.write() = fresh;
    }

    fn file_count(&self) -> usize {
        self.contents.read().metadata.len()
    }

    fn document_count(&self) -> usize {
        self.contents.read().documents.len()
    }

    fn clear(&self) {
        *self.contents.write() = Contents::default();
    }
}
