//! Full rebuild pipeline: scan → extract → truncate → index.
//!
//! Every rebuild starts from the store directory. Per-document work runs in
//! parallel and a document that cannot be read or extracted is logged and
//! left out of the result instead of failing the whole build.

use rayon::prelude::*;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use crate::error::Result;
use crate::extract::{panic_message, TextExtractor};
use crate::index::{DocumentIndex, IndexInput, IndexSettings};
use crate::models::{DocumentRecord, StoreEntry};
use crate::scanner::scan_store;
use crate::tokenize::truncate_chars;

/// A document left out of a rebuild, with the reason.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SkippedDocument {
    pub name: String,
    pub reason: String,
}

/// Output of [`build`]: the records and the index built from them.
#[derive(Debug)]
pub struct BuildOutput {
    pub records: Vec<DocumentRecord>,
    pub index: DocumentIndex,
    pub skipped: Vec<SkippedDocument>,
}

/// Scan `root` and build fresh records plus an index over them.
///
/// Fails only when the store directory itself cannot be enumerated.
pub fn build(
    root: &Path,
    extractor: &dyn TextExtractor,
    settings: IndexSettings,
) -> Result<BuildOutput> {
    let entries = scan_store(root)?;

    let loaded: Vec<std::result::Result<DocumentRecord, SkippedDocument>> = entries
        .par_iter()
        .map(|entry| load_record(entry, extractor, settings.max_text_chars))
        .collect();

    let mut records = Vec::with_capacity(loaded.len());
    let mut skipped = Vec::new();
    for item in loaded {
        match item {
            Ok(record) => records.push(record),
            Err(skip) => {
                tracing::warn!(file = %skip.name, reason = %skip.reason, "document excluded from index");
                skipped.push(skip);
            }
        }
    }

    let index = DocumentIndex::build(
        records.iter().map(|r| IndexInput {
            id: &r.id,
            title: &r.title,
            body: &r.text,
        }),
        settings,
    );

    Ok(BuildOutput {
        records,
        index,
        skipped,
    })
}

fn load_record(
    entry: &StoreEntry,
    extractor: &dyn TextExtractor,
    max_text_chars: usize,
) -> std::result::Result<DocumentRecord, SkippedDocument> {
    let skip = |reason: String| SkippedDocument {
        name: entry.name.clone(),
        reason,
    };

    let bytes = std::fs::read(&entry.path).map_err(|e| skip(format!("read failed: {}", e)))?;
    let extracted = match catch_unwind(AssertUnwindSafe(|| extractor.extract(&bytes))) {
        Ok(result) => result.map_err(|e| skip(e.to_string()))?,
        Err(payload) => {
            return Err(skip(format!(
                "extractor panicked: {}",
                panic_message(payload.as_ref())
            )))
        }
    };
    let fingerprint = fingerprint(&bytes);

    let title = extracted
        .metadata
        .title
        .clone()
        .unwrap_or_else(|| entry.name.clone());

    Ok(DocumentRecord {
        id: entry.name.clone(),
        path: entry.path.clone(),
        title,
        author: extracted.metadata.author,
        page_count: extracted.metadata.page_count,
        size: entry.size,
        modified: entry.modified,
        text: truncate_chars(&extracted.text, max_text_chars).to_string(),
        fingerprint,
    })
}

/// Hex SHA-256 of a document's bytes.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ExtractError, Extracted};
    use std::fs;
    use tempfile::TempDir;

    /// Treats file contents as UTF-8 text; `FAIL` marks an unreadable document.
    struct PlainText;

    impl TextExtractor for PlainText {
        fn extract(&self, bytes: &[u8]) -> std::result::Result<Extracted, ExtractError> {
            let text = String::from_utf8_lossy(bytes).into_owned();
            if text.starts_with("FAIL") {
                return Err(ExtractError::Pdf("corrupt".to_string()));
            }
            if text.starts_with("PANIC") {
                panic!("parser blew up");
            }
            Ok(Extracted {
                text,
                ..Default::default()
            })
        }
    }

    #[test]
    fn failed_and_empty_documents_are_not_indexed() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("good.pdf"), "searchable words").unwrap();
        fs::write(tmp.path().join("bad.pdf"), "FAIL here").unwrap();
        fs::write(tmp.path().join("empty.pdf"), "").unwrap();

        let out = build(tmp.path(), &PlainText, IndexSettings::default()).unwrap();
        let names: Vec<&str> = out.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(names, vec!["empty.pdf", "good.pdf"]);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].name, "bad.pdf");
        assert_eq!(out.index.len(), 1);
        assert!(out.index.contains("good.pdf"));
    }

    #[test]
    fn panicking_extractor_skips_only_that_document() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("good.pdf"), "searchable words").unwrap();
        fs::write(tmp.path().join("bad.pdf"), "PANIC now").unwrap();

        let out = build(tmp.path(), &PlainText, IndexSettings::default()).unwrap();
        assert_eq!(out.records.len(), 1);
        assert!(out.index.contains("good.pdf"));
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].name, "bad.pdf");
        assert!(out.skipped[0].reason.contains("parser blew up"));
    }

    #[test]
    fn text_is_truncated_and_title_defaults_to_name() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("long.pdf"), "x".repeat(50)).unwrap();
        let settings = IndexSettings {
            max_text_chars: 10,
            ..IndexSettings::default()
        };
        let out = build(tmp.path(), &PlainText, settings).unwrap();
        assert_eq!(out.records[0].text.len(), 10);
        assert_eq!(out.records[0].title, "long.pdf");
        assert_eq!(out.records[0].fingerprint, fingerprint("x".repeat(50).as_bytes()));
        assert_eq!(out.records[0].fingerprint.len(), 64);
    }

    #[test]
    fn unreadable_store_fails_the_build() {
        let tmp = TempDir::new().unwrap();
        let err = build(&tmp.path().join("gone"), &PlainText, IndexSettings::default())
            .unwrap_err();
        assert_eq!(err.code(), "store_unavailable");
    }
}
