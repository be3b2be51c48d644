//! Inverted full-text index with BM25+ ranking.
//!
//! The index keeps only a lightweight projection of each document: its id,
//! owning file id, token count and distinct terms. The text itself lives in
//! the [`Store`](crate::store::Store), which is also where snippets come from.
//!
//! # Scoring
//!
//! Each query term is expanded into derived vocabulary terms:
//!
//! 1. the exact term (weight `1.0`),
//! 2. every term it is a prefix of (weight `0.375 · len / (len + 0.3 · extra)`),
//! 3. every other term within `round(len · fuzzy)` edits, capped at
//!    `max_fuzzy` (weight `0.45 · len / (len + distance)`).
//!
//! A derived term contributes `weight · text_boost · bm25+(tf, df, N, dl, avgdl)`
//! to every document it occurs in. Document scores are summed across query
//! terms and multiplied by the number of distinct query terms matched.
//! Ties keep insertion order.
//!
//! All operations go through a `parking_lot::RwLock`, so queries may run
//! concurrently with ingestion without observing a half-inserted document.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;

use parking_lot::RwLock;

use crate::error::IndexError;
use crate::fuzzy::{bounded_distance, max_distance};
use crate::models::DocumentContent;

const BM25_K: f64 = 1.2;
const BM25_B: f64 = 0.7;
const BM25_D: f64 = 0.5;

const PREFIX_WEIGHT: f64 = 0.375;
const FUZZY_WEIGHT: f64 = 0.45;

/// Matching and ranking knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexOptions {
    /// Multiplier applied to the text field's score.
    pub text_boost: f64,
    /// Fuzzy tolerance as a fraction of term length. `0.0` disables fuzzy matching.
    pub fuzzy: f64,
    /// Upper bound on the edit distance, whatever the term length.
    pub max_fuzzy: usize,
    /// Expand query terms to indexed terms that start with them.
    pub prefix: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            text_boost: 2.0,
            fuzzy: 0.2,
            max_fuzzy: 6,
            prefix: true,
        }
    }
}

/// A raw, un-hydrated match.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub document_id: String,
    pub file_id: String,
    pub score: f64,
    /// Query terms (post-tokenization) that matched this document.
    pub matched_terms: Vec<String>,
}

/// Split text into lowercase alphanumeric terms.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Tokenize a query, dropping repeated terms but keeping first-seen order.
pub fn query_terms(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

struct IndexedDoc {
    id: String,
    file_id: String,
    length: usize,
    terms: Vec<String>,
}

#[derive(Default)]
struct Inner {
    next_short_id: u32,
    short_ids: HashMap<String, u32>,
    docs: HashMap<u32, IndexedDoc>,
    /// term -> (short doc id -> term frequency)
    postings: BTreeMap<String, HashMap<u32, u32>>,
    total_length: usize,
}

impl Inner {
    fn insert(&mut self, doc: &DocumentContent) {
        let short = self.next_short_id;
        self.next_short_id += 1;

        let tokens = tokenize(&doc.text);
        let length = tokens.len();
        let mut distinct = Vec::new();
        for token in tokens {
            let freqs = self.postings.entry(token.clone()).or_default();
            let tf = freqs.entry(short).or_insert(0);
            if *tf == 0 {
                distinct.push(token);
            }
            *tf += 1;
        }

        self.total_length += length;
        self.short_ids.insert(doc.id.clone(), short);
        self.docs.insert(
            short,
            IndexedDoc {
                id: doc.id.clone(),
                file_id: doc.file_id.clone(),
                length,
                terms: distinct,
            },
        );
    }

    fn remove(&mut self, id: &str) -> bool {
        let Some(short) = self.short_ids.remove(id) else {
            return false;
        };
        if let Some(doc) = self.docs.remove(&short) {
            self.total_length -= doc.length;
            for term in doc.terms {
                if let Some(freqs) = self.postings.get_mut(&term) {
                    freqs.remove(&short);
                    if freqs.is_empty() {
                        self.postings.remove(&term);
                    }
                }
            }
        }
        true
    }

    /// Vocabulary terms derived from one query term, with their weights.
    fn expand(&self, term: &str, options: &IndexOptions) -> Vec<(&str, f64)> {
        let len = term.chars().count() as f64;
        let mut derived: Vec<(&str, f64)> = Vec::new();

        if let Some((exact, _)) = self.postings.get_key_value(term) {
            derived.push((exact.as_str(), 1.0));
        }

        if options.prefix {
            let after = (Bound::Excluded(term), Bound::Unbounded);
            for (candidate, _) in self
                .postings
                .range::<str, _>(after)
                .take_while(|(k, _)| k.starts_with(term))
            {
                let extra = candidate.chars().count() as f64 - len;
                derived.push((candidate.as_str(), PREFIX_WEIGHT * len / (len + 0.3 * extra)));
            }
        }

        let budget = max_distance(term.chars().count(), options.fuzzy, options.max_fuzzy);
        if budget > 0 {
            let query: Vec<char> = term.chars().collect();
            for candidate in self.postings.keys() {
                if candidate == term || (options.prefix && candidate.starts_with(term)) {
                    continue;
                }
                let chars: Vec<char> = candidate.chars().collect();
                if let Some(distance) = bounded_distance(&query, &chars, budget) {
                    derived.push((candidate.as_str(), FUZZY_WEIGHT * len / (len + distance as f64)));
                }
            }
        }

        derived
    }
}

/// BM25+ relevance of one term in one document.
fn bm25_plus(tf: u32, df: usize, doc_count: usize, doc_len: usize, avg_len: f64) -> f64 {
    let idf = (1.0 + (doc_count as f64 - df as f64 + 0.5) / (df as f64 + 0.5)).ln();
    let tf = tf as f64;
    let norm = 1.0 - BM25_B + BM25_B * doc_len as f64 / avg_len;
    idf * (BM25_D + tf * (BM25_K + 1.0) / (tf + BM25_K * norm))
}

/// In-memory inverted index over document text.
pub struct SearchIndex {
    options: IndexOptions,
    inner: RwLock<Inner>,
}

impl SearchIndex {
    pub fn new(options: IndexOptions) -> Self {
        Self {
            options,
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Index every document's text.
    ///
    /// The batch is all-or-nothing: if any id is already indexed (or repeated
    /// within the batch) nothing is added.
    pub fn add_documents(&self, docs: &[DocumentContent]) -> Result<(), IndexError> {
        let mut inner = self.inner.write();
        let mut batch_ids = HashSet::new();
        for doc in docs {
            if inner.short_ids.contains_key(&doc.id) || !batch_ids.insert(doc.id.as_str()) {
                return Err(IndexError::DuplicateDocument(doc.id.clone()));
            }
        }
        for doc in docs {
            inner.insert(doc);
        }
        Ok(())
    }

    /// Replace the whole index with `docs`.
    ///
    /// The new index is built before the swap, so a duplicate id leaves the
    /// current contents in place.
    pub fn rebuild(&self, docs: &[DocumentContent]) -> Result<(), IndexError> {
        let mut fresh = Inner::default();
        let mut ids = HashSet::new();
        for doc in docs {
            if !ids.insert(doc.id.as_str()) {
                return Err(IndexError::DuplicateDocument(doc.id.clone()));
            }
            fresh.insert(doc);
        }
        *self.inner.write() = fresh;
        Ok(())
    }

    /// Drop a document from the index. Returns false if it was not indexed.
    pub fn remove_document(&self, id: &str) -> bool {
        self.inner.write().remove(id)
    }

    pub fn clear(&self) {
        *self.inner.write() = Inner::default();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.read().short_ids.contains_key(id)
    }

    pub fn document_count(&self) -> usize {
        self.inner.read().docs.len()
    }

    /// Number of distinct terms in the vocabulary.
    pub fn term_count(&self) -> usize {
        self.inner.read().postings.len()
    }

    /// Rank every matching document. No limit is applied here.
    ///
    /// Empty or whitespace-only queries match nothing.
    pub fn search(&self, text: &str) -> Vec<IndexHit> {
        let terms = query_terms(text);
        if terms.is_empty() {
            return Vec::new();
        }

        let inner = self.inner.read();
        let doc_count = inner.docs.len();
        if doc_count == 0 {
            return Vec::new();
        }
        let avg_len = (inner.total_length as f64 / doc_count as f64).max(1.0);

        let mut scores: HashMap<u32, (f64, Vec<String>)> = HashMap::new();
        for term in &terms {
            let mut term_scores: HashMap<u32, f64> = HashMap::new();
            for (derived, weight) in inner.expand(term, &self.options) {
                let Some(freqs) = inner.postings.get(derived) else {
                    continue;
                };
                let df = freqs.len();
                for (short, tf) in freqs {
                    let doc_len = inner.docs.get(short).map_or(0, |d| d.length);
                    let s = weight
                        * self.options.text_boost
                        * bm25_plus(*tf, df, doc_count, doc_len, avg_len);
                    *term_scores.entry(*short).or_insert(0.0) += s;
                }
            }
            for (short, s) in term_scores {
                let entry = scores.entry(short).or_insert_with(|| (0.0, Vec::new()));
                entry.0 += s;
                entry.1.push(term.clone());
            }
        }

        let mut ranked: Vec<(u32, f64, Vec<String>)> = scores
            .into_iter()
            .map(|(short, (score, matched))| (short, score * matched.len() as f64, matched))
            .collect();
        ranked.sort_by_key(|(short, _, _)| *short);
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        ranked
            .into_iter()
            .filter_map(|(short, score, matched_terms)| {
                inner.docs.get(&short).map(|doc| IndexHit {
                    document_id: doc.id.clone(),
                    file_id: doc.file_id.clone(),
                    score,
                    matched_terms,
                })
            })
            .collect()
    }
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new(IndexOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, text: &str) -> DocumentContent {
        DocumentContent {
            id: id.to_string(),
            file_id: format!("file-{}", id),
            text: text.to_string(),
            metadata: serde_json::Map::new(),
        }
    }

    fn ids(hits: &[IndexHit]) -> Vec<&str> {
        hits.iter().map(|h| h.document_id.as_str()).collect()
    }

    #[test]
    fn tokenize_splits_on_punctuation_and_lowercases() {
        assert_eq!(
            tokenize("Hello, World! rust-lang 2024"),
            vec!["hello", "world", "rust", "lang", "2024"]
        );
        assert!(tokenize("  \n\t ").is_empty());
    }

    #[test]
    fn query_terms_dedupes() {
        assert_eq!(query_terms("test Test tests"), vec!["test", "tests"]);
    }

    #[test]
    fn exact_match_scores_positive() {
        let index = SearchIndex::default();
        index
            .add_documents(&[doc("a", "rust search engine"), doc("b", "python notebook")])
            .unwrap();
        let hits = index.search("rust");
        assert_eq!(ids(&hits), vec!["a"]);
        assert!(hits[0].score > 0.0);
        assert_eq!(hits[0].file_id, "file-a");
    }

    #[test]
    fn fuzzy_match_tolerates_dropped_letter() {
        let index = SearchIndex::default();
        index
            .add_documents(&[doc("a", "an introduction to programming")])
            .unwrap();
        let hits = index.search("programing");
        assert_eq!(ids(&hits), vec!["a"]);
        assert!(hits[0].score > 0.0);
    }

    #[test]
    fn short_query_terms_expand_by_prefix() {
        let index = SearchIndex::default();
        index.add_documents(&[doc("a", "cat")]).unwrap();
        assert_eq!(index.search("ca").len(), 1);
        let no_prefix = SearchIndex::new(IndexOptions {
            prefix: false,
            ..IndexOptions::default()
        });
        no_prefix.add_documents(&[doc("a", "cat")]).unwrap();
        assert!(no_prefix.search("ca").is_empty());
    }

    #[test]
    fn prefix_matches_partial_trailing_term() {
        let index = SearchIndex::default();
        index
            .add_documents(&[doc("a", "document indexing pipeline"), doc("b", "other words")])
            .unwrap();
        let hits = index.search("pipeline ind");
        assert_eq!(ids(&hits), vec!["a"]);
    }

    #[test]
    fn exact_outranks_prefix_and_fuzzy() {
        let index = SearchIndex::default();
        index
            .add_documents(&[doc("p", "searching"), doc("f", "serch"), doc("e", "search")])
            .unwrap();
        let hits = index.search("search");
        assert_eq!(hits[0].document_id, "e");
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn more_matched_terms_rank_higher() {
        let index = SearchIndex::default();
        index
            .add_documents(&[
                doc("one", "alpha filler words here"),
                doc("two", "alpha beta filler words"),
            ])
            .unwrap();
        let hits = index.search("alpha beta");
        assert_eq!(ids(&hits), vec!["two", "one"]);
        assert_eq!(hits[0].matched_terms, vec!["alpha", "beta"]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let index = SearchIndex::default();
        index
            .add_documents(&[doc("x", "same text"), doc("y", "same text"), doc("z", "same text")])
            .unwrap();
        assert_eq!(ids(&index.search("same")), vec!["x", "y", "z"]);
    }

    #[test]
    fn empty_query_returns_nothing() {
        let index = SearchIndex::default();
        index.add_documents(&[doc("a", "anything")]).unwrap();
        assert!(index.search("").is_empty());
        assert!(index.search("   ").is_empty());
        assert!(index.search("!!!").is_empty());
    }

    #[test]
    fn duplicate_ids_are_rejected_atomically() {
        let index = SearchIndex::default();
        index.add_documents(&[doc("a", "first")]).unwrap();
        let err = index
            .add_documents(&[doc("b", "second"), doc("a", "again")])
            .unwrap_err();
        assert_eq!(err, IndexError::DuplicateDocument("a".to_string()));
        assert_eq!(index.document_count(), 1);
        assert!(!index.contains("b"));
    }

    #[test]
    fn remove_drops_postings() {
        let index = SearchIndex::default();
        index
            .add_documents(&[doc("a", "unique shared"), doc("b", "shared")])
            .unwrap();
        assert!(index.remove_document("a"));
        assert!(!index.remove_document("a"));
        assert!(index.search("unique").is_empty());
        assert_eq!(ids(&index.search("shared")), vec!["b"]);
        assert_eq!(index.term_count(), 1);
    }

    #[test]
    fn clear_empties_everything() {
        let index = SearchIndex::default();
        index.add_documents(&[doc("a", "text")]).unwrap();
        index.clear();
        assert_eq!(index.document_count(), 0);
        assert_eq!(index.term_count(), 0);
        assert!(index.search("text").is_empty());
        index.add_documents(&[doc("a", "text")]).unwrap();
    }

    #[test]
    fn term_frequency_raises_score() {
        let index = SearchIndex::default();
        index
            .add_documents(&[
                doc("once", "test alpha beta gamma"),
                doc("thrice", "test test test gamma"),
            ])
            .unwrap();
        assert_eq!(ids(&index.search("test")), vec!["thrice", "once"]);
    }

    #[test]
    fn rebuild_is_all_or_nothing() {
        let index = SearchIndex::default();
        index.add_documents(&[doc("a", "apples")]).unwrap();

        let err = index
            .rebuild(&[doc("b", "pears"), doc("b", "pears again")])
            .unwrap_err();
        assert_eq!(err, IndexError::DuplicateDocument("b".to_string()));
        assert!(index.contains("a"));
        assert_eq!(index.document_count(), 1);

        index.rebuild(&[doc("b", "pears"), doc("c", "plums")]).unwrap();
        assert!(!index.contains("a"));
        assert_eq!(ids(&index.search("pears")), vec!["b"]);
    }
}
