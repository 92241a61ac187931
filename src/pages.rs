//! Page-range extraction into a new PDF.

use lopdf::Document;
use serde::Serialize;
use std::path::Path;

use crate::error::{LibraryError, Result};
use crate::library::Library;

/// Result of a page extraction.
#[derive(Debug, Clone, Serialize)]
pub struct PageExtraction {
    pub source: String,
    pub output: String,
    pub from: u32,
    pub to: u32,
    pub pages: u32,
}

/// Default output name: `<stem>_p<from>-<to>.pdf`.
pub fn default_output_name(source: &str, from: u32, to: u32) -> String {
    let stem = Path::new(source)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| source.to_string());
    format!("{}_p{}-{}.pdf", stem, from, to)
}

/// Check a 1-based inclusive range against a document's page count.
pub fn validate_range(from: u32, to: u32, pages: u32) -> Result<()> {
    if from == 0 || to < from || to > pages {
        return Err(LibraryError::InvalidPageRange { from, to, pages });
    }
    Ok(())
}

/// Keep pages `from..=to` of the PDF in `bytes`, returning the new PDF.
pub fn extract_page_range(bytes: &[u8], from: u32, to: u32) -> Result<Vec<u8>> {
    let mut doc = Document::load_mem(bytes).map_err(|e| LibraryError::Pdf(e.to_string()))?;
    let pages = doc.get_pages().len() as u32;
    validate_range(from, to, pages)?;

    let dropped: Vec<u32> = (1..=pages).filter(|p| *p < from || *p > to).collect();
    if !dropped.is_empty() {
        doc.delete_pages(&dropped);
        doc.prune_objects();
        doc.renumber_objects();
    }
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| LibraryError::Pdf(e.to_string()))?;
    Ok(out)
}

/// CLI entry point.
pub async fn run_extract(
    library: &Library,
    name: &str,
    from: u32,
    to: u32,
    output: Option<String>,
) -> anyhow::Result<()> {
    let result = library.extract_pages(name, from, to, output).await?;
    let report = library.rebuild_index().await?;
    println!(
        "extracted pages {}-{} of {} into {} ({} pages)",
        result.from, result.to, result.source, result.output, result.pages
    );
    println!("index generation: {}", report.generation);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_name_uses_stem() {
        assert_eq!(default_output_name("report.pdf", 2, 5), "report_p2-5.pdf");
        assert_eq!(default_output_name("Scan.PDF", 1, 1), "Scan_p1-1.pdf");
    }

    #[test]
    fn range_validation() {
        assert!(validate_range(1, 1, 1).is_ok());
        assert!(validate_range(2, 4, 4).is_ok());
        for (from, to) in [(0, 1), (3, 2), (1, 5)] {
            assert!(matches!(
                validate_range(from, to, 4),
                Err(LibraryError::InvalidPageRange { .. })
            ));
        }
    }

    #[test]
    fn garbage_input_is_a_pdf_error() {
        assert!(matches!(
            extract_page_range(b"nope", 1, 1),
            Err(LibraryError::Pdf(_))
        ));
    }
}
