//! Text extraction, PII detection and secure PDF redaction.
//!
//! This library pulls text out of PDFs and legacy Office binaries (.doc,
//! .xls, .ppt), finds Korean personal data in it, and physically removes
//! that data from PDFs using MuPDF's redaction API.
//!
//! # Features
//!
//! - **Legacy Office Extraction**: Word piece tables, Excel shared strings
//!   (across CONTINUE records), PowerPoint text atoms with a raw-scan fallback
//! - **Code Page Handling**: CP949/CP1252 decode chains ending in Latin-1
//! - **Validated Rules**: resident registration numbers, mobile and landline
//!   phones, e-mail, business registration numbers and card numbers, each
//!   confirmed by a checksum, date or structure check
//! - **Secure Redaction**: Redacted text is removed, not just covered
//!
//! # Architecture
//!
//! - [`extract`]: Format detection and per-format text extraction
//! - [`text`]: Normalization and legacy encoding helpers
//! - [`domain`]: Rule table, validators and the text match engine
//! - [`redaction`]: Page geometry, redaction strategies and service layer
//! - [`config`]: Engine configuration
//! - [`error`]: Comprehensive error handling
//!
//! # Quick Start
//!
//! ```no_run
//! use docredact::{EngineConfig, RedactionService};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = RedactionService::with_secure_strategy(Arc::new(EngineConfig::default()));
//!
//! let pdf = std::fs::read("input.pdf")?;
//! let redacted = service.redact::<&str>(&pdf, None)?;
//! std::fs::write("output.pdf", &redacted.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Examples
//!
//! ## Matching Text
//!
//! ```
//! use docredact::{EngineConfig, MatchEngine, RuleId, ValidationOptions};
//!
//! let engine = MatchEngine::from_config(&EngineConfig::default());
//! let report = engine.run(
//!     "연락처 010-1234-5678 입니다",
//!     &RuleId::ALL,
//!     &ValidationOptions::default(),
//!     true,
//! );
//! assert_eq!(report.items.len(), 1);
//! assert_eq!(report.items[0].rule, RuleId::PhoneMobile);
//! ```

// Public API
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod redaction;
pub mod text;

// Re-exports for convenient access
pub use config::{EngineConfig, FillColor, SlideStrategy, ValidationOptions};
pub use domain::{
    Match, MatchEngine, MatchReport, MatchRequest, PatternMatcher, PiiRule, RuleId, RuleTable,
    Validate, Validator,
};
pub use error::{RedactorError, RedactorResult};
pub use extract::{extract_document, DocumentKind, ExtractedText, PageText};
pub use redaction::{
    DetectReport, RedactedPdf, RedactionBox, RedactionResult, RedactionService,
    RedactionStrategy, SecureRedactionStrategy,
};
