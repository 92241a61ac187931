//! Document listing and metadata commands.
//!
//! Used by `shelf list` and `shelf info`; the HTTP server calls the
//! [`Library`] methods directly.

use serde::Serialize;

use crate::library::Library;
use crate::models::{DocumentEntry, DocumentInfo};

/// Listing response shape: `{ "ok": true, "documents": [...] }`.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentListResponse {
    pub ok: bool,
    pub documents: Vec<DocumentEntry>,
}

/// Single-document response shape: `{ "ok": true, "document": {...} }`.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfoResponse {
    pub ok: bool,
    pub document: DocumentInfo,
}

/// CLI entry point for `list`.
pub async fn run_list(library: &Library, json: bool) -> anyhow::Result<()> {
    let documents = library.list_documents().await?;

    if json {
        let response = DocumentListResponse {
            ok: true,
            documents,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if documents.is_empty() {
        println!("No documents in {}.", library.root().display());
        return Ok(());
    }

    println!("{:<40} {:>12}  MODIFIED", "NAME", "SIZE");
    for doc in &documents {
        println!("{:<40} {:>12}  {}", doc.name, doc.size, doc.modified);
    }
    println!();
    println!("{} document(s)", documents.len());

    Ok(())
}

/// CLI entry point for `info`.
pub async fn run_info(library: &Library, name: &str, json: bool) -> anyhow::Result<()> {
    // Let the initial build finish so indexing details are accurate; a store
    // that cannot be scanned still falls through to the file-based view.
    if let Err(e) = library.wait_until_ready().await {
        tracing::debug!(error = %e, "index unavailable for info");
    }
    let doc = library.document_info(name).await?;

    if json {
        let response = DocumentInfoResponse {
            ok: true,
            document: doc,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("--- Document ---");
    println!("name:          {}", doc.name);
    println!("title:         {}", doc.title);
    if let Some(ref author) = doc.author {
        println!("author:        {}", author);
    }
    println!("pages:         {}", doc.page_count);
    println!("size:          {}", doc.size);
    println!("modified:      {}", doc.modified);
    println!("sha256:        {}", doc.fingerprint);
    println!("indexed:       {}", if doc.indexed { "yes" } else { "no" });
    println!("indexed chars: {}", doc.indexed_chars);

    Ok(())
}
