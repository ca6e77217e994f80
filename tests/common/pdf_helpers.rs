//! PDF inspection helpers.

use anyhow::Result;
use docredact::{extract_document, EngineConfig};
use std::path::Path;

/// Extracts the text of a PDF through the library's own MuPDF reader.
pub fn extract_text(pdf: &[u8]) -> Result<String> {
    extract_document(pdf, &EngineConfig::default())
        .map(|extracted| extracted.full_text)
        .map_err(|e| anyhow::anyhow!("Failed to extract text: {}", e))
}

/// Extracts text from a PDF file on disk.
pub fn extract_text_from_file(pdf_path: &Path) -> Result<String> {
    extract_text(&std::fs::read(pdf_path)?)
}

/// Extracts text with an independent PDF parser.
///
/// Returns an empty string when the parser cannot read the document.
pub fn independent_text(pdf: &[u8]) -> String {
    std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(pdf))
        .ok()
        .and_then(|r| r.ok())
        .unwrap_or_default()
}

/// Counts occurrences of a literal in a PDF's text.
pub fn count_in_pdf(pdf: &[u8], needle: &str) -> Result<usize> {
    Ok(extract_text(pdf)?.matches(needle).count())
}

/// Checks if a PDF contains any of the given literals.
pub fn pdf_contains_any(pdf: &[u8], needles: &[&str]) -> Result<bool> {
    let text = extract_text(pdf)?;
    Ok(needles.iter().any(|n| text.contains(n)))
}

/// Validates that a PDF is loadable and has basic structure.
pub fn is_valid_pdf(pdf: &[u8]) -> bool {
    ::lopdf::Document::load_mem(pdf).is_ok()
}

/// Number of pages as seen by an independent parser.
pub fn page_count(pdf: &[u8]) -> Result<usize> {
    Ok(::lopdf::Document::load_mem(pdf)?.get_pages().len())
}
