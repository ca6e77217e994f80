//! Redaction strategy trait and supporting types.
//!
//! This module defines the core abstraction for redaction strategies,
//! allowing for different PDF engines behind the same service.

use super::locator::Rect;
use crate::config::EngineConfig;
use crate::domain::RuleId;
use crate::error::RedactorResult;
use crate::extract::ExtractedText;
use serde::{Deserialize, Serialize};

/// A region of a page to paint over.
///
/// This is also the wire shape of detection results, so a caller can review
/// or edit boxes before sending them back to be applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionBox {
    /// Zero-based page index.
    #[serde(rename = "page")]
    pub page_index: u32,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub matched_text: String,
    #[serde(rename = "pattern_name")]
    pub rule_id: String,
}

impl RedactionBox {
    pub fn new(page_index: u32, rect: Rect, matched_text: String, rule_id: &str) -> Self {
        Self {
            page_index,
            x0: rect.x0,
            y0: rect.y0,
            x1: rect.x1,
            y1: rect.y1,
            matched_text,
            rule_id: rule_id.to_string(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x0, self.y0, self.x1, self.y1)
    }
}

/// Boxes found on a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectReport {
    pub total_matches: usize,
    pub boxes: Vec<RedactionBox>,
}

impl DetectReport {
    pub fn new(boxes: Vec<RedactionBox>) -> Self {
        Self {
            total_matches: boxes.len(),
            boxes,
        }
    }
}

/// Statistics about a redaction operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RedactionResult {
    /// Number of boxes drawn
    pub instances_redacted: usize,

    /// Pages processed
    pub pages_processed: usize,

    /// Pages with redactions
    pub pages_modified: usize,

    /// Boxes dropped for being smaller than the minimum size
    pub boxes_skipped: usize,

    /// Whether text was physically removed (vs visually obscured)
    pub secure: bool,
}

impl RedactionResult {
    /// Creates a result indicating no redactions were needed.
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns true if any redactions were applied.
    pub fn has_redactions(&self) -> bool {
        self.instances_redacted > 0
    }
}

/// A rewritten document plus what was done to it.
#[derive(Debug, Clone)]
pub struct RedactedPdf {
    pub bytes: Vec<u8>,
    pub result: RedactionResult,
}

/// Strategy for finding and removing PII from PDFs.
///
/// Implementations of this trait wrap a PDF engine. They work on in-memory
/// documents and never touch the filesystem.
pub trait RedactionStrategy: Send + Sync {
    /// Finds validated matches of the selected rules on every page.
    fn detect(
        &self,
        pdf: &[u8],
        rules: &[RuleId],
        config: &EngineConfig,
    ) -> RedactorResult<Vec<RedactionBox>>;

    /// Draws and commits redactions for `boxes`, returning the new document.
    fn apply(
        &self,
        pdf: &[u8],
        boxes: &[RedactionBox],
        config: &EngineConfig,
    ) -> RedactorResult<RedactedPdf>;

    /// Extracts per-page text.
    fn extract_text(&self, pdf: &[u8]) -> RedactorResult<ExtractedText>;

    /// Returns a human-readable name for this strategy.
    fn name(&self) -> &str;

    /// Returns whether this strategy provides secure (physical) deletion.
    fn is_secure(&self) -> bool;
}
