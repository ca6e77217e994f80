//! Redaction strategies and implementations.
//!
//! This module provides a strategy pattern for different PDF engines,
//! allowing for flexible and testable redaction implementations.

pub mod locator;
pub mod secure;
pub mod strategy;

pub use locator::{PageGeometry, Rect, RedactionLocator, Word};
pub use secure::SecureRedactionStrategy;
pub use strategy::{
    DetectReport, RedactedPdf, RedactionBox, RedactionResult, RedactionStrategy,
};

use crate::config::EngineConfig;
use crate::domain::RuleTable;
use crate::error::{RedactorError, RedactorResult};
use crate::extract::{is_pdf, ExtractedText};
use std::sync::Arc;

/// Redaction service coordinating strategy execution.
///
/// This service provides the detect, apply and detect-then-apply operations
/// on in-memory PDFs, checking inputs before the strategy sees them.
pub struct RedactionService {
    strategy: Box<dyn RedactionStrategy>,
    config: Arc<EngineConfig>,
}

impl RedactionService {
    /// Creates a new redaction service with the specified strategy.
    pub fn new(strategy: Box<dyn RedactionStrategy>, config: Arc<EngineConfig>) -> Self {
        Self { strategy, config }
    }

    /// Creates a service with secure (physical removal) redaction.
    pub fn with_secure_strategy(config: Arc<EngineConfig>) -> Self {
        Self::new(Box::new(SecureRedactionStrategy::default()), config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Finds redaction boxes for the selected rules. `None` selects all rules.
    pub fn detect<S: AsRef<str>>(
        &self,
        pdf: &[u8],
        rules: Option<&[S]>,
    ) -> RedactorResult<DetectReport> {
        check_pdf(pdf)?;
        let selected = RuleTable::global().select(rules)?;
        let boxes = self.strategy.detect(pdf, &selected, &self.config)?;
        tracing::info!(
            strategy = self.strategy.name(),
            boxes = boxes.len(),
            "detection finished"
        );
        Ok(DetectReport::new(boxes))
    }

    /// Commits caller-supplied boxes.
    pub fn apply(&self, pdf: &[u8], boxes: &[RedactionBox]) -> RedactorResult<RedactedPdf> {
        check_pdf(pdf)?;
        if boxes.is_empty() {
            return Err(RedactorError::InvalidInput {
                parameter: "boxes".to_string(),
                reason: "No redaction boxes specified".to_string(),
            });
        }

        let redacted = self.strategy.apply(pdf, boxes, &self.config)?;
        tracing::info!(
            strategy = self.strategy.name(),
            redacted = redacted.result.instances_redacted,
            skipped = redacted.result.boxes_skipped,
            pages = redacted.result.pages_modified,
            "redactions applied"
        );
        Ok(redacted)
    }

    /// Detects and commits in one step.
    ///
    /// A document with no matches comes back unchanged.
    pub fn redact<S: AsRef<str>>(
        &self,
        pdf: &[u8],
        rules: Option<&[S]>,
    ) -> RedactorResult<RedactedPdf> {
        let report = self.detect(pdf, rules)?;
        if report.boxes.is_empty() {
            return Ok(RedactedPdf {
                bytes: pdf.to_vec(),
                result: RedactionResult {
                    secure: self.strategy.is_secure(),
                    ..RedactionResult::none()
                },
            });
        }
        self.apply(pdf, &report.boxes)
    }

    /// Extracts per-page text for analysis.
    pub fn extract_text(&self, pdf: &[u8]) -> RedactorResult<ExtractedText> {
        check_pdf(pdf)?;
        self.strategy.extract_text(pdf)
    }
}

fn check_pdf(pdf: &[u8]) -> RedactorResult<()> {
    if is_pdf(pdf) {
        Ok(())
    } else {
        Err(RedactorError::UnsupportedFormat {
            reason: "input is not a PDF".to_string(),
        })
    }
}
