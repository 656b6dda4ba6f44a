//! PDF text, page count and title extraction.
//!
//! Page count and the `Info/Title` entry come from `lopdf`; the body text
//! comes from `pdf-extract`. Each part fails independently: a document whose
//! text cannot be decoded still reports its page count.

use lopdf::{Document, Object};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF structure could not be parsed: {0}")]
    Structure(String),
    #[error("PDF text extraction failed: {0}")]
    Text(String),
}

/// Everything the indexer reads out of a PDF.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfInfo {
    pub page_count: u32,
    pub title: Option<String>,
    pub text: String,
}

/// Reads page count, title and text. Never fails: unreadable parts are
/// logged and left at their defaults.
pub fn inspect_pdf(bytes: &[u8], label: &str) -> PdfInfo {
    let mut info = PdfInfo::default();

    match read_structure(bytes) {
        Ok((page_count, title)) => {
            info.page_count = page_count;
            info.title = title;
        }
        Err(e) => {
            // pdf-extract parses with lopdf too; it cannot do better.
            tracing::warn!("{}: {}", label, e);
            return info;
        }
    }

    match extract_text(bytes) {
        Ok(text) => info.text = text,
        Err(e) => tracing::warn!("{}: {}", label, e),
    }

    info
}

pub fn read_structure(bytes: &[u8]) -> Result<(u32, Option<String>), PdfError> {
    let doc = Document::load_mem(bytes).map_err(|e| PdfError::Structure(e.to_string()))?;
    let page_count = doc.get_pages().len() as u32;
    Ok((page_count, document_title(&doc)))
}

pub fn extract_text(bytes: &[u8]) -> Result<String, PdfError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| PdfError::Text(e.to_string()))
}

fn document_title(doc: &Document) -> Option<String> {
    let info = match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let title = match info.as_dict().ok()?.get(b"Title").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    match title {
        Object::String(bytes, _) => {
            let decoded = decode_pdf_string(bytes);
            let trimmed = decoded.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }
}

/// Decodes a PDF text string: UTF-16BE when it carries a byte-order mark,
/// otherwise PDFDocEncoding, approximated here as Latin-1.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(utf8).into_owned();
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// First `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
