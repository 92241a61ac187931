//! Text and metadata extraction for PDF documents.
//!
//! Extraction is pipeline-layer: the rebuild supplies file bytes and this
//! module returns plain UTF-8 text plus whatever structural metadata the PDF
//! carries. A malformed document yields an [`ExtractError`]; it never aborts
//! the caller, and a panicking parser is contained here.

use lopdf::{Dictionary, Object};

use crate::models::PdfMetadata;

/// Extraction error. The rebuild pipeline logs it and skips the document.
#[derive(Debug)]
pub enum ExtractError {
    NotPdf,
    Pdf(String),
    Panicked(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::NotPdf => write!(f, "missing %PDF- header"),
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::Panicked(e) => write!(f, "PDF parser panicked: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Text and metadata pulled from one document.
#[derive(Debug, Clone, Default)]
pub struct Extracted {
    pub text: String,
    pub metadata: PdfMetadata,
}

/// Converts document bytes into text and metadata.
///
/// The store only ever feeds PDFs through this seam; tests substitute
/// lightweight implementations.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<Extracted, ExtractError>;
}

/// Default extractor backed by `pdf-extract` (text) and `lopdf` (metadata).
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<Extracted, ExtractError> {
        let metadata = extract_metadata(bytes)?;
        let text = extract_text(bytes)?;
        Ok(Extracted { text, metadata })
    }
}

/// Whether the bytes start like a PDF file.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

/// Extracts plain text from PDF bytes.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    if !looks_like_pdf(bytes) {
        return Err(ExtractError::NotPdf);
    }
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractError::Pdf(e.to_string())),
        Err(payload) => Err(ExtractError::Panicked(panic_message(payload.as_ref()))),
    }
}

/// Reads page count and the `/Title` and `/Author` entries of the
/// document information dictionary.
pub fn extract_metadata(bytes: &[u8]) -> Result<PdfMetadata, ExtractError> {
    if !looks_like_pdf(bytes) {
        return Err(ExtractError::NotPdf);
    }
    match std::panic::catch_unwind(|| read_metadata(bytes)) {
        Ok(result) => result,
        Err(payload) => Err(ExtractError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn read_metadata(bytes: &[u8]) -> Result<PdfMetadata, ExtractError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    let page_count = doc.get_pages().len() as u32;

    let info = doc.trailer.get(b"Info").ok().and_then(|obj| match obj {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    });

    let (title, author) = match info {
        Some(dict) => (
            info_string(&doc, dict, b"Title"),
            info_string(&doc, dict, b"Author"),
        ),
        None => (None, None),
    };

    Ok(PdfMetadata {
        page_count,
        title,
        author,
    })
}

fn info_string(doc: &lopdf::Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    let obj = match dict.get(key).ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    match obj {
        Object::String(raw, _) => {
            let decoded = decode_pdf_string(raw);
            let trimmed = decoded.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        _ => None,
    }
}

/// Decodes a PDF text string: UTF-16BE with BOM, UTF-8 with BOM, otherwise
/// treated as single-byte PDFDocEncoding (Latin-1 compatible for text).
pub(crate) fn decode_pdf_string(raw: &[u8]) -> String {
    if let Some(rest) = raw.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(rest) = raw.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    raw.iter().map(|&b| b as char).collect()
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
