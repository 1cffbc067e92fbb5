//! The search engine core: three cross-referenced maps under one owner.
//!
//! `postings` maps each term to the documents containing it with their
//! term frequency; `forward` is the per-document mirror of the same
//! entries; `documents` carries rating, status, and the original text.
//! Term keys are interned `Arc<str>`s shared between `postings` and
//! `forward`, so both maps reference a single allocation per term and the
//! last reference drops with the document that owned it.
//!
//! The engine permits one mutator at a time and readers only while no
//! mutator is active. Parallel variants of retrieval, matching, and
//! removal distribute disjoint loop iterations over rayon workers; all
//! their writes land in per-call storage or in distinct posting cells.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::concurrent_map::ShardedMap;
use crate::config::EngineSettings;
use crate::error::{Result, SearchError};
use crate::models::{DocumentId, DocumentStatus, SearchResult};
use crate::query::ParsedQuery;
use crate::tokenizer::{is_valid_word, split_into_words, StopWordSet};

/// Per-document metadata; the text buffer is the document's original form.
#[derive(Clone, Debug)]
struct DocumentData {
    rating: i32,
    status: DocumentStatus,
    text: String,
}

/// In-memory ranked text search engine
pub struct SearchEngine {
    settings: EngineSettings,
    stop_words: StopWordSet,
    /// term -> document id -> term frequency
    postings: BTreeMap<Arc<str>, BTreeMap<DocumentId, f64>>,
    /// document id -> term -> term frequency
    forward: HashMap<DocumentId, BTreeMap<Arc<str>, f64>>,
    /// document id -> rating, status, text
    documents: BTreeMap<DocumentId, DocumentData>,
    document_ids: BTreeSet<DocumentId>,
}

impl SearchEngine {
    /// Create an engine from any collection of stop words.
    pub fn new<I, S>(stop_words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::with_settings(
            StopWordSet::new(stop_words)?,
            EngineSettings::default(),
        ))
    }

    /// Create an engine from a space-separated string of stop words.
    pub fn from_stop_words_text(stop_words_text: &str) -> Result<Self> {
        Ok(Self::with_settings(
            StopWordSet::from_text(stop_words_text)?,
            EngineSettings::default(),
        ))
    }

    pub fn with_settings(stop_words: StopWordSet, settings: EngineSettings) -> Self {
        Self {
            settings,
            stop_words,
            postings: BTreeMap::new(),
            forward: HashMap::new(),
            documents: BTreeMap::new(),
            document_ids: BTreeSet::new(),
        }
    }

    /// Index a document under a caller-supplied id.
    ///
    /// The id must be non-negative and unused; the text must contain no
    /// control bytes. The whole token stream is validated before any map
    /// is touched, so a failed add leaves the engine unchanged. The rating
    /// stored is the truncated integer average of `ratings` (0 if empty).
    pub fn add_document(
        &mut self,
        document_id: DocumentId,
        text: &str,
        status: DocumentStatus,
        ratings: &[i32],
    ) -> Result<()> {
        if document_id < 0 {
            return Err(SearchError::NegativeDocumentId(document_id));
        }
        if self.documents.contains_key(&document_id) {
            return Err(SearchError::DuplicateDocumentId(document_id));
        }

        let words = self.split_into_words_no_stop(text)?;
        // a document made of stop words alone carries zero tokens
        let inverse_word_count = if words.is_empty() {
            0.0
        } else {
            1.0 / words.len() as f64
        };

        self.forward.entry(document_id).or_default();
        for word in words {
            let term = self.intern_term(word);
            *self
                .postings
                .entry(Arc::clone(&term))
                .or_default()
                .entry(document_id)
                .or_insert(0.0) += inverse_word_count;
            *self
                .forward
                .entry(document_id)
                .or_default()
                .entry(term)
                .or_insert(0.0) += inverse_word_count;
        }

        self.documents.insert(
            document_id,
            DocumentData {
                rating: average_rating(ratings),
                status,
                text: text.to_string(),
            },
        );
        self.document_ids.insert(document_id);
        debug!(document_id, "indexed document");
        Ok(())
    }

    /// Remove a document and every posting that references it.
    ///
    /// An unknown id is a silent no-op. Posting lists that become empty
    /// are pruned, so a live term always has at least one document.
    pub fn remove_document(&mut self, document_id: DocumentId) {
        let words = match self.forward.remove(&document_id) {
            Some(words) => words,
            None => return,
        };
        for term in words.keys() {
            let emptied = match self.postings.get_mut(term.as_ref()) {
                Some(docs) => {
                    docs.remove(&document_id);
                    docs.is_empty()
                }
                None => false,
            };
            if emptied {
                self.postings.remove(term.as_ref());
            }
        }
        self.finish_removal(document_id);
    }

    /// Parallel variant of [`remove_document`](Self::remove_document).
    ///
    /// Posting-list erasure is distributed over workers; each worker gets
    /// exclusive access to a distinct term's postings, so no two
    /// iterations write to the same cell.
    pub fn remove_document_par(&mut self, document_id: DocumentId) {
        let words = match self.forward.remove(&document_id) {
            Some(words) => words,
            None => return,
        };
        let emptied: Vec<Arc<str>> = self
            .postings
            .par_iter_mut()
            .filter_map(|(term, docs)| {
                if !words.contains_key(term.as_ref()) {
                    return None;
                }
                docs.remove(&document_id);
                if docs.is_empty() {
                    Some(Arc::clone(term))
                } else {
                    None
                }
            })
            .collect();
        for term in emptied {
            self.postings.remove(term.as_ref());
        }
        self.finish_removal(document_id);
    }

    fn finish_removal(&mut self, document_id: DocumentId) {
        self.document_ids.remove(&document_id);
        self.documents.remove(&document_id);
        debug!(document_id, "removed document");
    }

    /// Report which query terms the given document contains.
    ///
    /// If any minus-term occurs in the document the result is empty;
    /// otherwise it is the document's plus-terms in the parsed query's
    /// iteration order. The returned slices borrow from `raw_query`.
    pub fn match_document<'q>(
        &self,
        raw_query: &'q str,
        document_id: DocumentId,
    ) -> Result<(Vec<&'q str>, DocumentStatus)> {
        let status = self.document_status(document_id)?;
        let query = ParsedQuery::parse(raw_query, &self.stop_words)?;
        for word in &query.minus {
            if self.term_occurs_in(word, document_id) {
                return Ok((Vec::new(), status));
            }
        }
        let matched = query
            .plus
            .iter()
            .copied()
            .filter(|word| self.term_occurs_in(word, document_id))
            .collect();
        Ok((matched, status))
    }

    /// Parallel variant of [`match_document`](Self::match_document);
    /// minus-term checking and plus-term collection each fan out over
    /// workers.
    pub fn match_document_par<'q>(
        &self,
        raw_query: &'q str,
        document_id: DocumentId,
    ) -> Result<(Vec<&'q str>, DocumentStatus)> {
        let status = self.document_status(document_id)?;
        let query = ParsedQuery::parse(raw_query, &self.stop_words)?;
        if query
            .minus
            .par_iter()
            .any(|word| self.term_occurs_in(word, document_id))
        {
            return Ok((Vec::new(), status));
        }
        let matched = query
            .plus
            .par_iter()
            .copied()
            .filter(|word| self.term_occurs_in(word, document_id))
            .collect();
        Ok((matched, status))
    }

    /// Top documents with status `Actual`, ranked by TF-IDF relevance.
    pub fn find_top_documents(&self, raw_query: &str) -> Result<Vec<SearchResult>> {
        self.find_top_documents_with_status(raw_query, DocumentStatus::Actual)
    }

    /// Top documents with the given status.
    pub fn find_top_documents_with_status(
        &self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<SearchResult>> {
        self.find_top_documents_by(raw_query, move |_, document_status, _| {
            document_status == status
        })
    }

    /// Top documents accepted by an arbitrary `(id, status, rating)`
    /// predicate, sorted by relevance descending with rating breaking
    /// near-ties, truncated to the configured maximum.
    pub fn find_top_documents_by<P>(&self, raw_query: &str, predicate: P) -> Result<Vec<SearchResult>>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool,
    {
        let query = ParsedQuery::parse(raw_query, &self.stop_words)?;
        let mut results = self.find_all_documents(&query, &predicate);
        results.sort_by(|a, b| self.ranking_order(a, b));
        results.truncate(self.settings.max_results);
        Ok(results)
    }

    /// Parallel variant of [`find_top_documents`](Self::find_top_documents).
    pub fn find_top_documents_par(&self, raw_query: &str) -> Result<Vec<SearchResult>> {
        self.find_top_documents_with_status_par(raw_query, DocumentStatus::Actual)
    }

    /// Parallel variant of
    /// [`find_top_documents_with_status`](Self::find_top_documents_with_status).
    pub fn find_top_documents_with_status_par(
        &self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<SearchResult>> {
        self.find_top_documents_by_par(raw_query, move |_, document_status, _| {
            document_status == status
        })
    }

    /// Parallel variant of
    /// [`find_top_documents_by`](Self::find_top_documents_by): relevance
    /// accumulates in a sharded concurrent map across workers, and the
    /// final sort runs in parallel. Produces the same ordering as the
    /// sequential path.
    pub fn find_top_documents_by_par<P>(
        &self,
        raw_query: &str,
        predicate: P,
    ) -> Result<Vec<SearchResult>>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        let query = ParsedQuery::parse(raw_query, &self.stop_words)?;
        let mut results = self.find_all_documents_par(&query, &predicate);
        results.par_sort_by(|a, b| self.ranking_order(a, b));
        results.truncate(self.settings.max_results);
        Ok(results)
    }

    /// Ascending iterator over live document ids.
    pub fn document_ids(&self) -> impl Iterator<Item = DocumentId> + '_ {
        self.document_ids.iter().copied()
    }

    /// Term frequencies of one document; empty for an unknown id.
    ///
    /// The term slices stay valid until the next mutation of the engine.
    pub fn word_frequencies(&self, document_id: DocumentId) -> BTreeMap<&str, f64> {
        self.forward
            .get(&document_id)
            .map(|words| {
                words
                    .iter()
                    .map(|(term, &frequency)| (term.as_ref(), frequency))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of live documents.
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Original text of a document, if it is live.
    pub fn document_text(&self, document_id: DocumentId) -> Option<&str> {
        self.documents
            .get(&document_id)
            .map(|data| data.text.as_str())
    }

    fn document_status(&self, document_id: DocumentId) -> Result<DocumentStatus> {
        self.documents
            .get(&document_id)
            .map(|data| data.status)
            .ok_or(SearchError::DocumentNotFound(document_id))
    }

    /// Tokenize, validate, and drop stop words; empty slices are skipped.
    fn split_into_words_no_stop<'t>(&self, text: &'t str) -> Result<Vec<&'t str>> {
        let mut words = Vec::new();
        for word in split_into_words(text) {
            if word.is_empty() {
                continue;
            }
            if !is_valid_word(word) {
                return Err(SearchError::InvalidWord(word.to_string()));
            }
            if !self.stop_words.contains(word) {
                words.push(word);
            }
        }
        Ok(words)
    }

    /// Reuse the postings key for a known term; allocate for a new one.
    fn intern_term(&self, word: &str) -> Arc<str> {
        match self.postings.get_key_value(word) {
            Some((term, _)) => Arc::clone(term),
            None => Arc::from(word),
        }
    }

    fn term_occurs_in(&self, word: &str, document_id: DocumentId) -> bool {
        self.postings
            .get(word)
            .map(|docs| docs.contains_key(&document_id))
            .unwrap_or(false)
    }

    fn inverse_document_frequency(&self, containing_documents: usize) -> f64 {
        (self.documents.len() as f64 / containing_documents as f64).ln()
    }

    fn find_all_documents<P>(&self, query: &ParsedQuery, predicate: &P) -> Vec<SearchResult>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool,
    {
        let mut relevance: BTreeMap<DocumentId, f64> = BTreeMap::new();
        for &word in &query.plus {
            if let Some(postings) = self.postings.get(word) {
                let idf = self.inverse_document_frequency(postings.len());
                for (&document_id, &term_frequency) in postings {
                    if let Some(data) = self.documents.get(&document_id) {
                        if predicate(document_id, data.status, data.rating) {
                            *relevance.entry(document_id).or_insert(0.0) += term_frequency * idf;
                        }
                    }
                }
            }
        }
        for &word in &query.minus {
            if let Some(postings) = self.postings.get(word) {
                for document_id in postings.keys() {
                    relevance.remove(document_id);
                }
            }
        }
        self.collect_results(relevance)
    }

    fn find_all_documents_par<P>(&self, query: &ParsedQuery, predicate: &P) -> Vec<SearchResult>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        let relevance: ShardedMap<DocumentId, f64> =
            ShardedMap::new(self.settings.relevance_shards);
        query.plus.par_iter().for_each(|&word| {
            if let Some(postings) = self.postings.get(word) {
                let idf = self.inverse_document_frequency(postings.len());
                for (&document_id, &term_frequency) in postings {
                    if let Some(data) = self.documents.get(&document_id) {
                        if predicate(document_id, data.status, data.rating) {
                            *relevance.access(document_id) += term_frequency * idf;
                        }
                    }
                }
            }
        });
        query.minus.par_iter().for_each(|&word| {
            if let Some(postings) = self.postings.get(word) {
                for &document_id in postings.keys() {
                    relevance.erase(document_id);
                }
            }
        });
        self.collect_results(relevance.snapshot())
    }

    fn collect_results(&self, relevance: BTreeMap<DocumentId, f64>) -> Vec<SearchResult> {
        relevance
            .into_iter()
            .filter_map(|(document_id, relevance)| {
                self.documents
                    .get(&document_id)
                    .map(|data| SearchResult::new(document_id, relevance, data.rating))
            })
            .collect()
    }

    /// Relevance descending; inside the epsilon band, rating descending.
    fn ranking_order(&self, a: &SearchResult, b: &SearchResult) -> Ordering {
        if (a.relevance - b.relevance).abs() < self.settings.relevance_epsilon {
            b.rating.cmp(&a.rating)
        } else {
            b.relevance.partial_cmp(&a.relevance).unwrap_or(Ordering::Equal)
        }
    }
}

fn average_rating(ratings: &[i32]) -> i32 {
    if ratings.is_empty() {
        return 0;
    }
    let sum: i32 = ratings.iter().sum();
    sum / ratings.len() as i32
}
