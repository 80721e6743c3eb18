//! BM25 scoring engine
//!
//! Turns a tokenized corpus into queryable ranking statistics and scores
//! tokenized queries against it. The artifact is an explicit, versioned
//! data structure so it can be persisted, reloaded, and checked for
//! corruption across versions.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Current artifact schema version
pub const ARTIFACT_SCHEMA_VERSION: &str = "1.0";

fn default_schema_version() -> String {
    String::new()
}

/// Free BM25 parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term-frequency saturation
    pub k1: f32,
    /// Document-length normalization strength
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

/// Trained BM25 scoring structure for one collection
///
/// Immutable once built; rebuilding a collection replaces it wholesale.
/// Document indices refer to positions in the corpus the artifact was built
/// from, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bm25Artifact {
    /// Schema version for compatibility checking
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// Parameters the artifact was built with
    params: Bm25Params,
    /// Postings: term -> list of (doc_index, term_frequency)
    postings: HashMap<String, Vec<(usize, usize)>>,
    /// Document frequency for each term
    doc_frequencies: HashMap<String, usize>,
    /// Document lengths (number of tokens)
    doc_lengths: Vec<usize>,
    /// Average document length (0.0 for an empty corpus)
    avg_doc_length: f32,
    /// Total number of documents
    num_docs: usize,
}

impl Bm25Artifact {
    /// Build an artifact from a tokenized corpus
    ///
    /// The corpus order is significant: document index `i` corresponds to
    /// the `i`-th token sequence, which callers map back to their own ids.
    pub fn build(corpus: &[Vec<String>], params: Bm25Params) -> Self {
        let num_docs = corpus.len();
        let mut postings: HashMap<String, Vec<(usize, usize)>> = HashMap::new();
        let mut doc_frequencies: HashMap<String, usize> = HashMap::new();
        let mut doc_lengths = Vec::with_capacity(num_docs);
        let mut total_length = 0usize;

        for (doc_idx, tokens) in corpus.iter().enumerate() {
            doc_lengths.push(tokens.len());
            total_length += tokens.len();

            let mut term_freqs: HashMap<&str, usize> = HashMap::new();
            for token in tokens {
                *term_freqs.entry(token.as_str()).or_insert(0) += 1;
            }

            for (term, freq) in term_freqs {
                postings
                    .entry(term.to_string())
                    .or_default()
                    .push((doc_idx, freq));
                *doc_frequencies.entry(term.to_string()).or_insert(0) += 1;
            }
        }

        let avg_doc_length = if num_docs > 0 {
            total_length as f32 / num_docs as f32
        } else {
            0.0
        };

        Self {
            schema_version: ARTIFACT_SCHEMA_VERSION.to_string(),
            params,
            postings,
            doc_frequencies,
            doc_lengths,
            avg_doc_length,
            num_docs,
        }
    }

    /// BM25 score of one document for a tokenized query
    ///
    /// Sums over distinct query terms; terms absent from the vocabulary
    /// contribute zero. Out-of-range `doc_idx` scores zero.
    pub fn score(&self, query_tokens: &[String], doc_idx: usize) -> f32 {
        if doc_idx >= self.num_docs {
            return 0.0;
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut score = 0.0;

        for token in query_tokens {
            if !seen.insert(token.as_str()) {
                continue;
            }
            let tf = self
                .postings
                .get(token.as_str())
                .and_then(|postings| {
                    postings
                        .iter()
                        .find(|(idx, _)| *idx == doc_idx)
                        .map(|(_, freq)| *freq)
                })
                .unwrap_or(0);
            if tf == 0 {
                continue;
            }
            score += self.term_score(token, tf, doc_idx);
        }

        score
    }

    /// Top-`k` documents for a tokenized query, by descending score
    ///
    /// Ties break by ascending document index, so the ordering is stable
    /// and deterministic across calls. Only documents matching at least one
    /// query term are candidates; `k` larger than the corpus returns all
    /// matching documents.
    pub fn retrieve(&self, query_tokens: &[String], k: usize) -> Vec<(usize, f32)> {
        if self.num_docs == 0 || query_tokens.is_empty() || k == 0 {
            return Vec::new();
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut scores: HashMap<usize, f32> = HashMap::new();

        for token in query_tokens {
            if !seen.insert(token.as_str()) {
                continue;
            }
            let Some(postings) = self.postings.get(token.as_str()) else {
                continue;
            };
            for &(doc_idx, tf) in postings {
                *scores.entry(doc_idx).or_insert(0.0) += self.term_score(token, tf, doc_idx);
            }
        }

        let mut ranked: Vec<(usize, f32)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(k);
        ranked
    }

    /// BM25 contribution of one term occurring `tf` times in `doc_idx`
    fn term_score(&self, term: &str, tf: usize, doc_idx: usize) -> f32 {
        let df = *self.doc_frequencies.get(term).unwrap_or(&0) as f32;
        if df == 0.0 {
            return 0.0;
        }

        let idf = ((self.num_docs as f32 - df + 0.5) / (df + 0.5) + 1.0).ln();

        let tf = tf as f32;
        let doc_len = self.doc_lengths[doc_idx] as f32;
        let Bm25Params { k1, b } = self.params;
        let numerator = tf * (k1 + 1.0);
        let denominator = tf + k1 * (1.0 - b + b * (doc_len / self.avg_doc_length));

        idf * (numerator / denominator)
    }

    /// Parameters the artifact was built with
    pub fn params(&self) -> Bm25Params {
        self.params
    }

    /// Number of documents in the corpus
    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    /// Check if the artifact was built from an empty corpus
    pub fn is_empty(&self) -> bool {
        self.num_docs == 0
    }

    /// Average document length
    pub fn avg_doc_length(&self) -> f32 {
        self.avg_doc_length
    }

    /// Structural sanity check used when reloading from disk
    ///
    /// Verifies the per-document vectors agree with the recorded corpus
    /// size and that no posting points outside the corpus.
    pub fn is_well_formed(&self) -> bool {
        self.doc_lengths.len() == self.num_docs
            && self
                .postings
                .values()
                .flatten()
                .all(|(doc_idx, _)| *doc_idx < self.num_docs)
    }
}
