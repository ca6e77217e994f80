//! Custom assertions for redaction testing.
//!
//! Provides domain-specific assertions that make tests more readable
//! and provide better error messages.

use super::pdf_helpers::{extract_text, independent_text, is_valid_pdf};

/// Asserts that a literal no longer appears in a PDF.
///
/// The text is checked through MuPDF and through an independent parser,
/// so a value that was only painted over would still be caught.
///
/// # Panics
/// Panics if the literal is still found in the PDF text.
pub fn assert_redacted(pdf: &[u8], needle: &str) {
    let text = extract_text_or_panic(pdf);
    assert!(
        !text.contains(needle),
        "'{}' should be redacted but was found in the output.\nExtracted text length: {} chars",
        needle,
        text.len()
    );
    assert!(
        !independent_text(pdf).contains(needle),
        "'{}' is still present in the content streams",
        needle
    );
}

/// Asserts that a literal has been preserved (not redacted) in a PDF.
///
/// # Panics
/// Panics if the literal is not found in the PDF.
pub fn assert_preserved(pdf: &[u8], needle: &str) {
    let text = extract_text_or_panic(pdf);
    assert!(
        text.contains(needle),
        "'{}' should be preserved but was not found in:\n{}",
        needle,
        text
    );
}

/// Asserts that every literal is redacted.
///
/// # Panics
/// Panics if any literal is found in the PDF.
pub fn assert_all_redacted(pdf: &[u8], needles: &[&str]) {
    let text = extract_text_or_panic(pdf);
    let found: Vec<_> = needles.iter().filter(|n| text.contains(*n)).collect();
    assert!(
        found.is_empty(),
        "The following values should be redacted but were found: {:?}",
        found
    );
}

/// Asserts that bytes form a loadable, non-empty PDF.
///
/// # Panics
/// Panics if the PDF appears to be empty or corrupted.
pub fn assert_valid_pdf(pdf: &[u8]) {
    assert!(!pdf.is_empty(), "PDF should not be empty");
    assert!(pdf.starts_with(b"%PDF-"), "output should start with a PDF header");
    assert!(is_valid_pdf(pdf), "output should parse as a PDF");
}

fn extract_text_or_panic(pdf: &[u8]) -> String {
    extract_text(pdf).unwrap_or_else(|e| panic!("Failed to extract text from PDF: {}", e))
}
