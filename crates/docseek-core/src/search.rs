//! Query execution: ranked index hits hydrated through a [`Store`].
//!
//! The algorithm has no configuration or I/O dependencies. The calling
//! application builds [`SearchOptions`] from its own config and passes the
//! store and index it owns.
//!
//! 1. Empty or whitespace-only query text returns no results.
//! 2. The index ranks every matching document.
//! 3. Each hit is hydrated with its file metadata (which must exist) and
//!    snippets from the store. A hit whose document a concurrent writer has
//!    already removed from the store is skipped.
//! 4. Filters drop non-matching hits.
//! 5. The first `limit` survivors are returned. Limiting happens after
//!    ranking and filtering, so it never changes which documents compete.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;

use crate::error::IndexError;
use crate::index::SearchIndex;
use crate::models::{DateRange, FileMetadata, FileType, SearchFilters, SearchQuery, SearchResult};
use crate::store::{Lookup, Store};

/// Retrieval parameters decoupled from application config.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Used when a query carries no explicit limit.
    pub default_limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { default_limit: 20 }
    }
}

/// Run a query against `index`, hydrating results from `store`.
///
/// Fails with [`IndexError::MissingMetadata`] if a stored document's file has
/// no metadata, and with [`IndexError::InvalidFilter`] for an unparsable path glob.
pub fn search<S: Store + ?Sized>(
    index: &SearchIndex,
    store: &S,
    query: &SearchQuery,
    options: &SearchOptions,
) -> Result<Vec<SearchResult>, IndexError> {
    if query.text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let limit = query.limit.unwrap_or(options.default_limit);
    if limit == 0 {
        return Ok(Vec::new());
    }

    let filter = match &query.filters {
        Some(filters) => Some(CompiledFilter::compile(filters)?),
        None => None,
    };

    let mut results = Vec::new();
    for hit in index.search(&query.text) {
        let metadata = match store.lookup(&hit.document_id, &hit.file_id) {
            Lookup::Found(metadata) => metadata,
            Lookup::Gone => {
                tracing::debug!(document = %hit.document_id, "hit removed while querying");
                continue;
            }
            Lookup::MissingMetadata => {
                return Err(IndexError::MissingMetadata {
                    document_id: hit.document_id,
                    file_id: hit.file_id,
                })
            }
        };

        if let Some(f) = &filter {
            if !f.matches(&metadata) {
                continue;
            }
        }

        results.push(SearchResult {
            snippets: store.get_snippets(&hit.document_id, &query.text),
            file_id: hit.file_id,
            score: hit.score,
            metadata,
        });
        if results.len() == limit {
            break;
        }
    }

    Ok(results)
}

struct CompiledFilter {
    file_types: Option<HashSet<FileType>>,
    path_globs: Option<GlobSet>,
    path_prefixes: Vec<String>,
    date_range: Option<DateRange>,
}

impl CompiledFilter {
    fn compile(filters: &SearchFilters) -> Result<Self, IndexError> {
        if filters.languages.as_ref().is_some_and(|l| !l.is_empty()) {
            tracing::debug!("language filters are accepted but not enforced");
        }

        let mut path_globs = None;
        let mut path_prefixes = Vec::new();
        if let Some(patterns) = &filters.paths {
            let mut builder = GlobSetBuilder::new();
            let mut any_glob = false;
            for pattern in patterns {
                if pattern.contains(['*', '?', '[', '{']) {
                    let glob = Glob::new(pattern).map_err(|e| IndexError::InvalidFilter {
                        pattern: pattern.clone(),
                        cause: e.to_string(),
                    })?;
                    builder.add(glob);
                    any_glob = true;
                } else {
                    path_prefixes.push(pattern.clone());
                }
            }
            if any_glob {
                path_globs = Some(builder.build().map_err(|e| IndexError::InvalidFilter {
                    pattern: patterns.join(", "),
                    cause: e.to_string(),
                })?);
            }
        }

        Ok(Self {
            file_types: filters
                .file_types
                .as_ref()
                .map(|types| types.iter().copied().collect()),
            path_globs,
            path_prefixes,
            date_range: filters.date_range.clone(),
        })
    }

    fn matches(&self, meta: &FileMetadata) -> bool {
        if let Some(types) = &self.file_types {
            if !types.contains(&meta.file_type) {
                return false;
            }
        }

        let has_path_filter = self.path_globs.is_some() || !self.path_prefixes.is_empty();
        if has_path_filter {
            let by_glob = self
                .path_globs
                .as_ref()
                .is_some_and(|set| set.is_match(&meta.path));
            let by_prefix = self
                .path_prefixes
                .iter()
                .any(|p| meta.path.starts_with(p.as_str()));
            if !by_glob && !by_prefix {
                return false;
            }
        }

        if let Some(range) = &self.date_range {
            if !range.contains(&meta.last_modified) {
                return false;
            }
        }
        true
    }
}
