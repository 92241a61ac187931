//! Document store scanner.
//!
//! The store directory is the system of record: every regular file directly
//! inside it whose name ends in `.pdf` (any case) is a document.

use chrono::{DateTime, Utc};
use globset::{GlobBuilder, GlobMatcher};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::error::{LibraryError, Result};
use crate::models::StoreEntry;

/// Enumerate the PDF files in `root`, sorted by name.
pub fn scan_store(root: &Path) -> Result<Vec<StoreEntry>> {
    let root = std::fs::canonicalize(root).map_err(|e| unavailable(root, e))?;
    let mut entries = Vec::new();

    let walker = WalkDir::new(&root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false);
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // Failing to read the directory itself is a configuration error.
            Err(e) if e.depth() == 0 => {
                let io = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
                return Err(unavailable(&root, io));
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable store entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if !is_pdf_name(&name) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "skipping store entry without metadata");
                continue;
            }
        };
        let modified: DateTime<Utc> = metadata
            .modified()
            .unwrap_or(SystemTime::UNIX_EPOCH)
            .into();

        entries.push(StoreEntry {
            name,
            path: entry.path().to_path_buf(),
            size: metadata.len(),
            modified,
        });
    }

    // Sort for deterministic ordering
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(entries)
}

/// Whether `name` carries a `.pdf` suffix (case-insensitive).
pub fn is_pdf_name(name: &str) -> bool {
    PDF_GLOB.is_match(name)
}

/// Resolve a document name to its path inside the store, rejecting names
/// that could escape the store directory.
pub fn store_path(root: &Path, name: &str) -> Result<PathBuf> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed != name
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0'])
    {
        return Err(LibraryError::InvalidName(name.to_string()));
    }
    if !is_pdf_name(name) {
        return Err(LibraryError::InvalidName(format!(
            "{} (expected a .pdf file name)",
            name
        )));
    }
    Ok(root.join(name))
}

static PDF_GLOB: LazyLock<GlobMatcher> = LazyLock::new(|| {
    GlobBuilder::new("*.pdf")
        .case_insensitive(true)
        .literal_separator(true)
        .build()
        .expect("static glob pattern")
        .compile_matcher()
});

fn unavailable(path: &Path, source: std::io::Error) -> LibraryError {
    LibraryError::StoreUnavailable {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn lists_only_pdf_files_case_insensitive() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.pdf"), b"x").unwrap();
        fs::write(tmp.path().join("A.PDF"), b"x").unwrap();
        fs::write(tmp.path().join("notes.txt"), b"x").unwrap();
        fs::write(tmp.path().join("pdf"), b"x").unwrap();
        fs::create_dir(tmp.path().join("dir.pdf")).unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();
        fs::write(tmp.path().join("nested").join("c.pdf"), b"x").unwrap();

        let entries = scan_store(tmp.path()).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["A.PDF", "b.pdf"]);
        for entry in &entries {
            assert!(entry.path.is_absolute());
            assert_eq!(entry.size, 1);
        }
    }

    #[test]
    fn missing_directory_is_store_unavailable() {
        let tmp = TempDir::new().unwrap();
        let err = scan_store(&tmp.path().join("missing")).unwrap_err();
        assert!(matches!(err, LibraryError::StoreUnavailable { .. }));
    }

    #[test]
    fn empty_directory_yields_no_entries() {
        let tmp = TempDir::new().unwrap();
        assert!(scan_store(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn store_path_rejects_traversal() {
        let root = Path::new("/srv/pdfs");
        assert!(store_path(root, "report.pdf").is_ok());
        assert!(store_path(root, "Report.PDF").is_ok());
        for bad in ["../x.pdf", "a/b.pdf", ".hidden.pdf", "", " a.pdf", "a.txt"] {
            assert!(
                matches!(store_path(root, bad), Err(LibraryError::InvalidName(_))),
                "expected {:?} to be rejected",
                bad
            );
        }
    }
}
