//! Query engine.
//!
//! Queries are tokenized with the same rules as indexed text and scored
//! against the currently published snapshot. See [`crate::index`] for the
//! scoring formula and tie-break order.

use serde::Serialize;

use crate::error::{LibraryError, Result};
use crate::lifecycle::Snapshot;
use crate::library::Library;
use crate::models::SearchResult;
use crate::tokenize::tokenize;

/// Search response shape: `{ "ok": true, "results": [...] }`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub ok: bool,
    pub results: Vec<SearchResult>,
}

/// Reject empty and whitespace-only queries.
pub fn validate_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(LibraryError::InvalidQuery(
            "query must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Rank the documents of `snapshot` against `query`.
///
/// A query without any indexable term (e.g. only punctuation) matches
/// nothing.
pub fn search_snapshot(snapshot: &Snapshot, query: &str) -> Result<Vec<SearchResult>> {
    validate_query(query)?;
    let terms = tokenize(query);
    if terms.is_empty() {
        return Ok(Vec::new());
    }
    Ok(snapshot.index.score_terms(&terms))
}

/// CLI entry point: search and print ranked results.
pub async fn run_search(
    library: &Library,
    query: &str,
    limit: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    library.wait_until_ready().await?;
    let mut results = library.search(query)?;
    if let Some(limit) = limit {
        results.truncate(limit);
    }

    if json {
        let response = SearchResponse { ok: true, results };
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        println!("{}. [{:.3}] {}", i + 1, result.score, result.title);
        println!("    id: {}", result.id);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{DocumentIndex, IndexInput, IndexSettings};
    use chrono::Utc;

    fn snapshot(docs: &[(&str, &str)]) -> Snapshot {
        let index = DocumentIndex::build(
            docs.iter().map(|(id, body)| IndexInput {
                id,
                title: id,
                body,
            }),
            IndexSettings::default(),
        );
        Snapshot {
            generation: 1,
            built_at: Utc::now(),
            records: Vec::new(),
            index,
            skipped: Vec::new(),
        }
    }

    #[test]
    fn empty_query_is_invalid() {
        let snap = snapshot(&[("a.pdf", "The quick fox")]);
        for q in ["", "   ", "\n\t"] {
            assert!(matches!(
                search_snapshot(&snap, q),
                Err(LibraryError::InvalidQuery(_))
            ));
        }
    }

    #[test]
    fn punctuation_only_query_matches_nothing() {
        let snap = snapshot(&[("a.pdf", "The quick fox")]);
        assert!(search_snapshot(&snap, "?!").unwrap().is_empty());
    }

    #[test]
    fn query_is_tokenized_like_documents() {
        let snap = snapshot(&[("a.pdf", "The quick fox"), ("b.pdf", "A slow turtle")]);
        let results = search_snapshot(&snap, "  FOX!! ").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "a.pdf");
    }

    #[test]
    fn multi_term_queries_are_unions() {
        let snap = snapshot(&[("a.pdf", "The quick fox"), ("b.pdf", "A slow turtle")]);
        let results = search_snapshot(&snap, "fox turtle").unwrap();
        let mut ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["a.pdf", "b.pdf"]);
    }
}
