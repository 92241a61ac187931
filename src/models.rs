//! Core data models used throughout pdfshelf.
//!
//! These types describe the files in the store, the records derived from
//! them during a rebuild, and the results handed back to callers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// A PDF file found by the store scanner.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    /// File name, unique within the store directory.
    pub name: String,
    /// Absolute path to the file.
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Metadata embedded in a PDF.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfMetadata {
    pub page_count: u32,
    pub title: Option<String>,
    pub author: Option<String>,
}

/// In-memory representation of one store file plus its indexable text.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    /// Identity: the file name.
    pub id: String,
    pub path: PathBuf,
    /// Display title (embedded `/Title`, falling back to the file name).
    pub title: String,
    pub author: Option<String>,
    pub page_count: u32,
    pub size: u64,
    pub modified: DateTime<Utc>,
    /// Extracted text, already truncated to the configured maximum.
    pub text: String,
    /// SHA-256 of the file bytes.
    pub fingerprint: String,
}

/// Listing entry returned by `list_documents`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DocumentEntry {
    pub name: String,
    pub size: u64,
    /// Last modification timestamp (ISO 8601).
    pub modified: String,
}

impl From<&StoreEntry> for DocumentEntry {
    fn from(entry: &StoreEntry) -> Self {
        Self {
            name: entry.name.clone(),
            size: entry.size,
            modified: format_ts_iso(entry.modified),
        }
    }
}

/// Full metadata view of one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub name: String,
    pub title: String,
    pub author: Option<String>,
    pub page_count: u32,
    pub size: u64,
    pub modified: String,
    /// SHA-256 of the file bytes, hex encoded.
    pub fingerprint: String,
    /// Whether the document is present in the published index.
    pub indexed: bool,
    /// Number of characters of text held in the index for this document.
    pub indexed_chars: usize,
}

/// A ranked reference to a document.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchResult {
    pub id: String,
    /// Non-negative relevance score, higher is more relevant.
    pub score: f64,
    pub title: String,
}

pub(crate) fn format_ts_iso(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
