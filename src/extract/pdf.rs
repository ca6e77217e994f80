//! PDF text, one entry per page.

use super::{ExtractedText, PageText};
use crate::error::RedactorResult;
use crate::redaction::secure::MupdfDocument;

pub fn extract_pdf(bytes: &[u8]) -> RedactorResult<ExtractedText> {
    let document = MupdfDocument::open(bytes)?;
    let mut pages = Vec::with_capacity(document.page_count());
    for index in 0..document.page_count() {
        pages.push(PageText {
            page_number: index as u32 + 1,
            text: document.page_text(index)?,
        });
    }
    tracing::debug!(pages = pages.len(), "extracted PDF text");
    Ok(ExtractedText::from_pages(pages))
}
