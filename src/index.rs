//! Immutable in-memory inverted index over document titles and bodies.
//!
//! # Scoring
//!
//! For each distinct query term `t` present in document `d`:
//!
//! ```text
//! score(d) += Σ_field boost_field × idf(t) × tfw(tf(t, field, d))
//! idf(t)    = ln(1 + (N − df(t) + 0.5) / (df(t) + 0.5))
//! tfw(tf)   = tf × (k1 + 1) / (tf + k1),   k1 = 1.2
//! ```
//!
//! `N` counts indexed documents and `df(t)` the documents containing `t` in
//! any field. Both factors are positive, `tfw` grows with term frequency and
//! `idf` grows as a term gets rarer.
//!
//! Results are ordered by descending score; equal scores fall back to
//! ascending document identity.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::config::IndexConfig;
use crate::models::SearchResult;
use crate::tokenize::{tokenize, truncate_chars};

const K1: f64 = 1.2;

/// Index-time settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexSettings {
    /// Characters of each field kept before tokenization.
    pub max_text_chars: usize,
    pub title_boost: f64,
    pub body_boost: f64,
}

impl From<&IndexConfig> for IndexSettings {
    fn from(cfg: &IndexConfig) -> Self {
        Self {
            max_text_chars: cfg.max_text_chars,
            title_boost: cfg.title_boost,
            body_boost: cfg.body_boost,
        }
    }
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self::from(&IndexConfig::default())
    }
}

/// One document supplied to [`DocumentIndex::build`].
#[derive(Debug, Clone, Copy)]
pub struct IndexInput<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub body: &'a str,
}

#[derive(Debug, Clone)]
struct DocEntry {
    id: String,
    title: String,
}

#[derive(Debug, Clone, Copy)]
struct Posting {
    doc: usize,
    title_tf: u32,
    body_tf: u32,
}

#[derive(Debug, Clone)]
struct TermEntry {
    idf: f64,
    postings: Vec<Posting>,
}

#[derive(Debug, Clone)]
pub struct DocumentIndex {
    docs: Vec<DocEntry>,
    terms: HashMap<String, TermEntry>,
    settings: IndexSettings,
}

impl DocumentIndex {
    /// Build an index from `inputs`. Documents with an empty (or
    /// whitespace-only) body are left out.
    pub fn build<'a, I>(inputs: I, settings: IndexSettings) -> Self
    where
        I: IntoIterator<Item = IndexInput<'a>>,
    {
        let mut docs = Vec::new();
        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();

        for input in inputs {
            let body = truncate_chars(input.body, settings.max_text_chars);
            if body.trim().is_empty() {
                continue;
            }
            let title = truncate_chars(input.title, settings.max_text_chars);

            let doc = docs.len();
            docs.push(DocEntry {
                id: input.id.to_string(),
                title: input.title.to_string(),
            });

            let mut counts: HashMap<String, (u32, u32)> = HashMap::new();
            for term in tokenize(title) {
                counts.entry(term).or_default().0 += 1;
            }
            for term in tokenize(body) {
                counts.entry(term).or_default().1 += 1;
            }
            for (term, (title_tf, body_tf)) in counts {
                postings.entry(term).or_default().push(Posting {
                    doc,
                    title_tf,
                    body_tf,
                });
            }
        }

        let n = docs.len() as f64;
        let terms = postings
            .into_iter()
            .map(|(term, postings)| {
                let df = postings.len() as f64;
                let idf = (1.0 + (n - df + 0.5) / (df + 0.5)).ln();
                (term, TermEntry { idf, postings })
            })
            .collect();

        Self {
            docs,
            terms,
            settings,
        }
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Number of distinct terms.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn settings(&self) -> IndexSettings {
        self.settings
    }

    /// Whether a document with this identity is indexed.
    pub fn contains(&self, id: &str) -> bool {
        self.docs.iter().any(|d| d.id == id)
    }

    /// Score every document matching at least one of `terms`.
    ///
    /// `terms` must already be tokenized; duplicates are ignored.
    pub fn score_terms(&self, terms: &[String]) -> Vec<SearchResult> {
        let mut seen = HashSet::new();
        let mut scores: HashMap<usize, f64> = HashMap::new();

        for term in terms {
            if !seen.insert(term.as_str()) {
                continue;
            }
            let Some(entry) = self.terms.get(term) else {
                continue;
            };
            for posting in &entry.postings {
                let field_weight = self.settings.title_boost * tf_weight(posting.title_tf)
                    + self.settings.body_boost * tf_weight(posting.body_tf);
                *scores.entry(posting.doc).or_insert(0.0) += entry.idf * field_weight;
            }
        }

        let mut results: Vec<SearchResult> = scores
            .into_iter()
            .map(|(doc, score)| SearchResult {
                id: self.docs[doc].id.clone(),
                score,
                title: self.docs[doc].title.clone(),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });

        results
    }
}

fn tf_weight(tf: u32) -> f64 {
    if tf == 0 {
        return 0.0;
    }
    let tf = tf as f64;
    tf * (K1 + 1.0) / (tf + K1)
}
