//! Secure redaction strategy using MuPDF.
//!
//! This strategy physically removes text from PDF documents using MuPDF's
//! redaction API, ensuring that redacted content cannot be recovered.

use super::locator::{prepare_page_boxes, PageGeometry, Rect, RedactionLocator, Word};
use super::strategy::{RedactedPdf, RedactionBox, RedactionResult, RedactionStrategy};
use crate::config::EngineConfig;
use crate::domain::{RuleId, RuleTable};
use crate::error::{RedactorError, RedactorResult};
use crate::extract::pdf::extract_pdf;
use crate::extract::ExtractedText;
use std::collections::BTreeMap;

use mupdf::pdf::{PdfAnnotationType, PdfDocument, PdfPage};
use mupdf::{Page, Quad, Rect as MuRect, TextPageFlags};

const DEFAULT_MAX_HITS: u32 = 100;

/// A PDF opened with MuPDF.
pub struct MupdfDocument {
    doc: PdfDocument,
    page_count: usize,
}

impl MupdfDocument {
    pub fn open(bytes: &[u8]) -> RedactorResult<Self> {
        let doc = PdfDocument::from_bytes(bytes).map_err(|e| RedactorError::MalformedStructure {
            context: "PDF".to_string(),
            reason: e.to_string(),
        })?;
        let page_count = doc
            .page_count()
            .map_err(|e| RedactorError::mupdf("Failed to get page count", e))?;
        Ok(Self {
            doc,
            page_count: page_count.max(0) as usize,
        })
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    fn page(&self, index: usize) -> RedactorResult<Page> {
        if index >= self.page_count {
            return Err(RedactorError::InvalidInput {
                parameter: "page".to_string(),
                reason: format!(
                    "page index {} out of range for {} pages",
                    index, self.page_count
                ),
            });
        }
        self.doc
            .load_page(index as i32)
            .map_err(|e| RedactorError::PdfProcessing {
                message: format!("Failed to load page {}", index + 1),
                page: Some(index + 1),
                source: Some(Box::new(e)),
            })
    }

    /// Plain text of one page, lines separated by newlines.
    pub fn page_text(&self, index: usize) -> RedactorResult<String> {
        let (text, _) = read_page(&self.page(index)?, index)?;
        Ok(text)
    }

    /// Loads a page with its word geometry.
    pub fn load(&self, index: usize, max_hits: u32) -> RedactorResult<MupdfPage> {
        let page = self.page(index)?;
        let (_, words) = read_page(&page, index)?;
        let bounds = page
            .bounds()
            .map_err(|e| RedactorError::mupdf(format!("Failed to get bounds for page {}", index + 1), e))?;
        Ok(MupdfPage {
            page,
            words,
            width: (bounds.x1 - bounds.x0) as f64,
            height: (bounds.y1 - bounds.y0) as f64,
            max_hits,
        })
    }
}

/// One loaded page: the MuPDF page plus the words read from it.
pub struct MupdfPage {
    page: Page,
    words: Vec<Word>,
    width: f64,
    height: f64,
    max_hits: u32,
}

impl PageGeometry for MupdfPage {
    fn words(&self) -> &[Word] {
        &self.words
    }

    fn search_exact(&self, needle: &str) -> Vec<Rect> {
        match self.page.search(needle, self.max_hits) {
            Ok(hits) => hits.into_iter().map(|q| quad_bounds(&q)).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "page search failed");
                Vec::new()
            }
        }
    }

    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }
}

fn quad_bounds(quad: &Quad) -> Rect {
    Rect::new(
        quad.ul.x.min(quad.ll.x).min(quad.ur.x).min(quad.lr.x) as f64,
        quad.ul.y.min(quad.ll.y).min(quad.ur.y).min(quad.lr.y) as f64,
        quad.ul.x.max(quad.ll.x).max(quad.ur.x).max(quad.lr.x) as f64,
        quad.ul.y.max(quad.ll.y).max(quad.ur.y).max(quad.lr.y) as f64,
    )
}

/// Reads a page's structured text into plain text and whitespace-separated words.
fn read_page(page: &Page, index: usize) -> RedactorResult<(String, Vec<Word>)> {
    let text_page = page
        .to_text_page(TextPageFlags::empty())
        .map_err(|e| RedactorError::PdfProcessing {
            message: "Failed to read page text".to_string(),
            page: Some(index + 1),
            source: Some(Box::new(e)),
        })?;

    let mut lines = Vec::new();
    let mut words = Vec::new();
    for block in text_page.blocks() {
        for line in block.lines() {
            let mut line_text = String::new();
            let mut current: Option<Word> = None;
            for ch in line.chars() {
                let Some(c) = ch.char() else { continue };
                line_text.push(c);
                if c.is_whitespace() {
                    words.extend(current.take());
                    continue;
                }
                let rect = quad_bounds(&ch.quad());
                match current.as_mut() {
                    Some(word) => {
                        word.text.push(c);
                        word.rect = word.rect.union(&rect);
                    }
                    None => current = Some(Word::new(c.to_string(), rect)),
                }
            }
            words.extend(current);
            lines.push(line_text);
        }
    }
    Ok((lines.join("\n"), words))
}

/// Secure redaction strategy that physically removes text using MuPDF.
///
/// This strategy:
/// 1. Creates PDF redaction annotations over each box
/// 2. Applies redactions using `pdf_redact_page` (physical removal)
/// 3. Serializes the modified PDF
///
/// **Security**: Redacted text is completely removed and cannot be extracted.
#[derive(Debug, Clone)]
pub struct SecureRedactionStrategy {
    /// Maximum exact-search hits per lookup (prevents performance issues)
    max_hits: u32,
}

impl Default for SecureRedactionStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureRedactionStrategy {
    /// Creates a new secure redaction strategy with default settings.
    pub fn new() -> Self {
        Self {
            max_hits: DEFAULT_MAX_HITS,
        }
    }

    /// Sets the maximum number of exact-search hits per lookup.
    pub fn with_max_hits(mut self, max_hits: u32) -> Self {
        self.max_hits = max_hits;
        self
    }

    /// Draws the boxes of one page and commits them.
    fn redact_page(
        &self,
        document: &MupdfDocument,
        index: usize,
        boxes: &[&RedactionBox],
        config: &EngineConfig,
        result: &mut RedactionResult,
    ) -> RedactorResult<()> {
        let page = document.page(index)?;
        let bounds = page
            .bounds()
            .map_err(|e| RedactorError::mupdf(format!("Failed to get bounds for page {}", index + 1), e))?;
        let rects = prepare_page_boxes(
            boxes.iter().copied(),
            (bounds.x1 - bounds.x0) as f64,
            (bounds.y1 - bounds.y0) as f64,
            config.redaction.min_box_size,
        );
        result.boxes_skipped += boxes.len() - rects.len();
        if rects.is_empty() {
            return Ok(());
        }

        // Convert to PDF page for annotation support
        let mut pdf_page = PdfPage::try_from(page.clone()).map_err(|e| RedactorError::PdfProcessing {
            message: "Page is not a PDF page".to_string(),
            page: Some(index + 1),
            source: Some(Box::new(e)),
        })?;

        for rect in &rects {
            let annot = pdf_page
                .create_annotation(PdfAnnotationType::Redact)
                .map_err(|e| RedactorError::PdfProcessing {
                    message: "Failed to create redaction annotation".to_string(),
                    page: Some(index + 1),
                    source: Some(Box::new(e)),
                })?;

            let mu_rect = MuRect {
                x0: rect.x0 as f32,
                y0: rect.y0 as f32,
                x1: rect.x1 as f32,
                y1: rect.y1 as f32,
            };
            unsafe {
                ffi::set_annotation_rect(&annot, mu_rect);
                ffi::set_annotation_fill(&annot, config.redaction.fill);
            }
        }

        pdf_page
            .redact()
            .map_err(|e| RedactorError::PdfProcessing {
                message: format!("Failed to apply redactions on page {}", index + 1),
                page: Some(index + 1),
                source: Some(Box::new(e)),
            })?;

        result.instances_redacted += rects.len();
        result.pages_modified += 1;
        Ok(())
    }
}

impl RedactionStrategy for SecureRedactionStrategy {
    fn detect(
        &self,
        pdf: &[u8],
        rules: &[RuleId],
        config: &EngineConfig,
    ) -> RedactorResult<Vec<RedactionBox>> {
        let document = MupdfDocument::open(pdf)?;
        let locator = RedactionLocator::new(RuleTable::global(), config.validation);

        let mut boxes = Vec::new();
        for index in 0..document.page_count() {
            let page = document.load(index, self.max_hits)?;
            let found = locator.locate(index as u32, &page, rules);
            tracing::debug!(page = index + 1, boxes = found.len(), "located matches");
            boxes.extend(found);
        }
        Ok(boxes)
    }

    fn apply(
        &self,
        pdf: &[u8],
        boxes: &[RedactionBox],
        config: &EngineConfig,
    ) -> RedactorResult<RedactedPdf> {
        let document = MupdfDocument::open(pdf)?;

        let mut by_page: BTreeMap<usize, Vec<&RedactionBox>> = BTreeMap::new();
        for b in boxes {
            by_page.entry(b.page_index as usize).or_default().push(b);
        }
        if let Some(&last) = by_page.keys().next_back() {
            if last >= document.page_count() {
                return Err(RedactorError::InvalidInput {
                    parameter: "boxes".to_string(),
                    reason: format!(
                        "box on page index {} but document has {} pages",
                        last,
                        document.page_count()
                    ),
                });
            }
        }

        let mut result = RedactionResult {
            pages_processed: document.page_count(),
            secure: true,
            ..Default::default()
        };
        for (index, page_boxes) in &by_page {
            self.redact_page(&document, *index, page_boxes, config, &mut result)?;
        }

        let mut bytes = Vec::new();
        document
            .doc
            .write_to(&mut bytes)
            .map_err(|e| RedactorError::PdfProcessing {
                message: "Failed to write redacted PDF".to_string(),
                page: None,
                source: Some(Box::new(e)),
            })?;

        Ok(RedactedPdf { bytes, result })
    }

    fn extract_text(&self, pdf: &[u8]) -> RedactorResult<ExtractedText> {
        extract_pdf(pdf)
    }

    fn name(&self) -> &str {
        "SecureRedaction"
    }

    fn is_secure(&self) -> bool {
        true
    }
}

/// FFI helpers for MuPDF annotation operations.
mod ffi {
    use crate::config::FillColor;
    use mupdf::pdf::PdfAnnotation;
    use mupdf::Rect;

    #[repr(C)]
    struct PdfAnnotRaw {
        inner: *mut mupdf_sys::pdf_annot,
    }

    /// Sets the rectangle for a PDF annotation via FFI.
    ///
    /// # Safety
    /// This function uses unsafe FFI calls to access MuPDF's C API.
    /// The annotation must be valid and the context properly initialized.
    pub unsafe fn set_annotation_rect(annot: &PdfAnnotation, rect: Rect) {
        let annot_raw = std::mem::transmute::<&PdfAnnotation, &PdfAnnotRaw>(annot);
        let ctx = mupdf_sys::mupdf_new_base_context();

        if !ctx.is_null() {
            let fz_rect = mupdf_sys::fz_rect {
                x0: rect.x0,
                y0: rect.y0,
                x1: rect.x1,
                y1: rect.y1,
            };

            mupdf_sys::pdf_set_annot_rect(ctx, annot_raw.inner, fz_rect);
            mupdf_sys::mupdf_drop_base_context(ctx);
        }
    }

    /// Sets the colour the redaction leaves behind.
    ///
    /// # Safety
    /// Same requirements as [`set_annotation_rect`].
    pub unsafe fn set_annotation_fill(annot: &PdfAnnotation, fill: FillColor) {
        let annot_raw = std::mem::transmute::<&PdfAnnotation, &PdfAnnotRaw>(annot);
        let ctx = mupdf_sys::mupdf_new_base_context();

        if !ctx.is_null() {
            let rgb = fill.rgb();
            mupdf_sys::pdf_set_annot_interior_color(ctx, annot_raw.inner, 3, rgb.as_ptr());
            mupdf_sys::mupdf_drop_base_context(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_creation() {
        let strategy = SecureRedactionStrategy::new();
        assert_eq!(strategy.name(), "SecureRedaction");
        assert!(strategy.is_secure());
    }

    #[test]
    fn test_max_hits_configuration() {
        let strategy = SecureRedactionStrategy::new().with_max_hits(50);
        assert_eq!(strategy.max_hits, 50);
    }
}
