//! Error taxonomy for library operations.
//!
//! Directory-level and query-shape failures surface to callers as
//! [`LibraryError`]. Per-document extraction failures are absorbed by the
//! rebuild pipeline and only logged.

use std::path::PathBuf;
use std::sync::Arc;

pub type Result<T> = std::result::Result<T, LibraryError>;

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("document store unavailable at {path}: {source}")]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("text extraction failed for {name}: {reason}")]
    ExtractionFailed { name: String, reason: String },

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("index not ready: no rebuild has completed yet")]
    IndexNotReady,

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("invalid document name: {0}")]
    InvalidName(String),

    #[error("not a PDF document: {0}")]
    InvalidDocument(String),

    #[error("invalid page range {from}-{to} (document has {pages} pages)")]
    InvalidPageRange { from: u32, to: u32, pages: u32 },

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("EPUB error: {0}")]
    Epub(String),

    #[error("rebuild failed: {0}")]
    RebuildFailed(Arc<LibraryError>),

    #[error("rebuild worker stopped")]
    WorkerStopped,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LibraryError {
    /// Machine-readable error code used in JSON responses.
    pub fn code(&self) -> &'static str {
        match self {
            LibraryError::StoreUnavailable { .. } => "store_unavailable",
            LibraryError::ExtractionFailed { .. } => "extraction_failed",
            LibraryError::InvalidQuery(_) => "invalid_query",
            LibraryError::IndexNotReady => "index_not_ready",
            LibraryError::NotFound(_) => "not_found",
            LibraryError::InvalidName(_) => "invalid_name",
            LibraryError::InvalidDocument(_) => "invalid_document",
            LibraryError::InvalidPageRange { .. } => "invalid_page_range",
            LibraryError::Pdf(_) | LibraryError::Epub(_) => "conversion_failed",
            LibraryError::RebuildFailed(inner) => inner.code(),
            LibraryError::WorkerStopped | LibraryError::Internal(_) | LibraryError::Io(_) => {
                "internal"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(LibraryError::IndexNotReady.code(), "index_not_ready");
        assert_eq!(
            LibraryError::InvalidQuery("empty".into()).code(),
            "invalid_query"
        );
        let err = LibraryError::StoreUnavailable {
            path: PathBuf::from("/nope"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.code(), "store_unavailable");
        assert!(err.to_string().contains("/nope"));

        let wrapped = LibraryError::RebuildFailed(Arc::new(err));
        assert_eq!(wrapped.code(), "store_unavailable");
    }
}
