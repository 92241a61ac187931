//! The library facade.
//!
//! [`Library`] ties the store directory, the text extractor and the
//! [`IndexManager`] together and exposes every document operation used by
//! the CLI and the HTTP server. Store mutations (upload, removal, page
//! extraction) queue a rebuild and return without waiting for it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::epub::{self, EpubBook};
use crate::error::{LibraryError, Result};
use crate::extract::{looks_like_pdf, Extracted, PdfExtractor, TextExtractor};
use crate::index::IndexSettings;
use crate::lifecycle::{IndexManager, IndexStatus, RebuildReport, Snapshot};
use crate::models::{format_ts_iso, DocumentEntry, DocumentInfo, PdfMetadata, SearchResult};
use crate::pages::{self, PageExtraction};
use crate::rebuild::fingerprint;
use crate::scanner::{scan_store, store_path};
use crate::search::{search_snapshot, validate_query};
use crate::summary::{summarize_text, Summary};

/// Acknowledgement of a store mutation.
#[derive(Debug, Clone, Serialize)]
pub struct StoreChange {
    pub name: String,
    /// Rebuild request queued for the change.
    pub rebuild_ticket: u64,
}

/// A converted EPUB ready to be written or served.
#[derive(Debug, Clone)]
pub struct EpubOutput {
    pub name: String,
    pub title: String,
    pub bytes: Vec<u8>,
}

pub struct Library {
    config: Config,
    extractor: Arc<dyn TextExtractor>,
    index: IndexManager,
}

impl Library {
    /// Open the library described by `config` using the PDF extractor and
    /// queue the initial build. Must be called from within a tokio runtime.
    pub fn open(config: Config) -> Self {
        Self::with_extractor(config, Arc::new(PdfExtractor))
    }

    pub fn with_extractor(config: Config, extractor: Arc<dyn TextExtractor>) -> Self {
        let index = IndexManager::start(
            config.store.root.clone(),
            IndexSettings::from(&config.index),
            Arc::clone(&extractor),
        );
        Self {
            config,
            extractor,
            index,
        }
    }

    /// Like [`Library::open`], but the index is only built once something
    /// waits for it or asks for a rebuild. Commands that never search skip
    /// the build entirely.
    pub fn open_lazy(config: Config) -> Self {
        Self::lazy_with_extractor(config, Arc::new(PdfExtractor))
    }

    pub fn lazy_with_extractor(config: Config, extractor: Arc<dyn TextExtractor>) -> Self {
        let index = IndexManager::lazy(
            config.store.root.clone(),
            IndexSettings::from(&config.index),
            Arc::clone(&extractor),
        );
        Self {
            config,
            extractor,
            index,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.config.store.root
    }

    // ── Index ────────────────────────────────────────────────────────────

    pub fn index_status(&self) -> IndexStatus {
        self.index.status()
    }

    pub fn request_rebuild(&self) -> u64 {
        self.index.request_rebuild()
    }

    /// Rebuild and wait for the report.
    pub async fn rebuild_index(&self) -> Result<RebuildReport> {
        self.index.rebuild().await
    }

    pub async fn wait_until_ready(&self) -> Result<Arc<Snapshot>> {
        self.index.wait_until_ready().await
    }

    pub async fn shutdown(&self) {
        self.index.shutdown().await;
    }

    /// Ranked search over the current snapshot.
    pub fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        validate_query(query)?;
        let snapshot = self.index.ready_snapshot()?;
        search_snapshot(&snapshot, query)
    }

    // ── Documents ────────────────────────────────────────────────────────

    /// Every PDF in the store, whether or not it could be indexed.
    pub async fn list_documents(&self) -> Result<Vec<DocumentEntry>> {
        let root = self.root().to_path_buf();
        let entries = blocking(move || scan_store(&root)).await?;
        Ok(entries.iter().map(DocumentEntry::from).collect())
    }

    /// Metadata for one document. Served from the current snapshot when it
    /// holds a record, otherwise read from the file.
    pub async fn document_info(&self, name: &str) -> Result<DocumentInfo> {
        let path = self.existing_path(name).await?;

        if let Some(snapshot) = self.index.snapshot() {
            if let Some(record) = snapshot.record(name) {
                return Ok(DocumentInfo {
                    name: record.id.clone(),
                    title: record.title.clone(),
                    author: record.author.clone(),
                    page_count: record.page_count,
                    size: record.size,
                    modified: format_ts_iso(record.modified),
                    fingerprint: record.fingerprint.clone(),
                    indexed: snapshot.index.contains(name),
                    indexed_chars: record.text.chars().count(),
                });
            }
        }

        let extractor = Arc::clone(&self.extractor);
        let name = name.to_string();
        blocking(move || {
            let meta = std::fs::metadata(&path)?;
            let modified: DateTime<Utc> = meta
                .modified()
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
                .into();
            let bytes = std::fs::read(&path)?;
            let metadata = match extractor.extract(&bytes) {
                Ok(extracted) => extracted.metadata,
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "metadata unavailable");
                    PdfMetadata::default()
                }
            };
            Ok(DocumentInfo {
                title: metadata.title.unwrap_or_else(|| name.clone()),
                author: metadata.author,
                page_count: metadata.page_count,
                size: meta.len(),
                modified: format_ts_iso(modified),
                fingerprint: fingerprint(&bytes),
                indexed: false,
                indexed_chars: 0,
                name,
            })
        })
        .await
    }

    /// Extractive summary of a document's full text.
    pub async fn summarize(&self, name: &str, sentences: Option<usize>) -> Result<Summary> {
        let max = sentences.unwrap_or(self.config.summary.sentences).max(1);
        let extracted = self.extract(name).await?;
        let picked = summarize_text(&extracted.text, max);
        Ok(Summary {
            name: name.to_string(),
            title: extracted.metadata.title.unwrap_or_else(|| name.to_string()),
            summary: picked.join(" "),
            sentences: picked,
        })
    }

    /// Convert a document into an EPUB 3 book.
    pub async fn convert_to_epub(&self, name: &str) -> Result<EpubOutput> {
        let extracted = self.extract(name).await?;
        let title = extracted
            .metadata
            .title
            .clone()
            .unwrap_or_else(|| name.to_string());
        let book = EpubBook {
            title: title.clone(),
            author: extracted.metadata.author.clone(),
            language: "en".to_string(),
            text: extracted.text,
        };
        let bytes = blocking(move || epub::write_epub(&book)).await?;
        Ok(EpubOutput {
            name: epub::epub_file_name(name),
            title,
            bytes,
        })
    }

    // ── Store mutations ──────────────────────────────────────────────────

    /// Copy pages `from..=to` of `name` into a new document in the store.
    pub async fn extract_pages(
        &self,
        name: &str,
        from: u32,
        to: u32,
        output: Option<String>,
    ) -> Result<PageExtraction> {
        let source = self.existing_path(name).await?;
        let output = output.unwrap_or_else(|| pages::default_output_name(name, from, to));
        if output == name {
            return Err(LibraryError::InvalidName(format!(
                "{} (output would overwrite the source)",
                output
            )));
        }
        let target = store_path(self.root(), &output)?;

        blocking(move || {
            let bytes = std::fs::read(&source)?;
            let extracted = pages::extract_page_range(&bytes, from, to)?;
            write_atomically(&target, &extracted)
        })
        .await?;

        let ticket = self.index.request_rebuild();
        tracing::info!(source = %name, output = %output, from, to, ticket, "pages extracted");

        Ok(PageExtraction {
            source: name.to_string(),
            output,
            from,
            to,
            pages: to - from + 1,
        })
    }

    /// Store `bytes` as `name`, replacing any existing document.
    pub fn add_document(&self, name: &str, bytes: &[u8]) -> Result<StoreChange> {
        let path = store_path(self.root(), name)?;
        if !looks_like_pdf(bytes) {
            return Err(LibraryError::InvalidDocument(name.to_string()));
        }
        write_atomically(&path, bytes)?;
        let ticket = self.index.request_rebuild();
        tracing::info!(file = %name, bytes = bytes.len(), ticket, "document stored");
        Ok(StoreChange {
            name: name.to_string(),
            rebuild_ticket: ticket,
        })
    }

    pub async fn remove_document(&self, name: &str) -> Result<StoreChange> {
        let path = self.existing_path(name).await?;
        blocking(move || Ok(std::fs::remove_file(&path)?)).await?;
        let ticket = self.index.request_rebuild();
        tracing::info!(file = %name, ticket, "document removed");
        Ok(StoreChange {
            name: name.to_string(),
            rebuild_ticket: ticket,
        })
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    async fn existing_path(&self, name: &str) -> Result<PathBuf> {
        let path = store_path(self.root(), name)?;
        let candidate = path.clone();
        if !blocking(move || Ok(candidate.is_file())).await? {
            return Err(LibraryError::NotFound(name.to_string()));
        }
        Ok(path)
    }

    /// Fresh, untruncated extraction of one document.
    async fn extract(&self, name: &str) -> Result<Extracted> {
        let path = self.existing_path(name).await?;
        let extractor = Arc::clone(&self.extractor);
        let owned = name.to_string();
        blocking(move || {
            let bytes = std::fs::read(&path)?;
            extractor
                .extract(&bytes)
                .map_err(|e| LibraryError::ExtractionFailed {
                    name: owned,
                    reason: e.to_string(),
                })
        })
        .await
    }
}

/// Run filesystem or CPU-heavy work off the async executor.
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| LibraryError::Internal(e.to_string()))?
}

/// Write through a hidden temporary file so a concurrent scan never sees a
/// partial PDF.
fn write_atomically(target: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| LibraryError::InvalidName(target.display().to_string()))?;
    let tmp = target.with_file_name(format!(".{}.part", file_name));
    std::fs::write(&tmp, bytes)?;
    if let Err(e) = std::fs::rename(&tmp, target) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// CLI entry point for `rebuild`.
pub async fn run_rebuild(library: &Library, json: bool) -> anyhow::Result<()> {
    let report = library.rebuild_index().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Rebuild complete (generation {})", report.generation);
    println!("  documents: {}", report.documents);
    println!("  indexed:   {}", report.indexed);
    println!("  terms:     {}", report.terms);
    println!("  elapsed:   {}ms", report.elapsed_ms);
    if !report.skipped.is_empty() {
        println!("  skipped:");
        for skip in &report.skipped {
            println!("    {}: {}", skip.name, skip.reason);
        }
    }
    Ok(())
}
