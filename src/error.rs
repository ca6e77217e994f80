//! Error types for extraction, matching and redaction.
//!
//! Structural problems with an input document abort the whole operation and
//! surface as one of the typed variants below. Decode-level problems are
//! recovered inside the extractors and only appear here when a caller asks
//! for a single decode directly.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for all library operations.
pub type RedactorResult<T> = Result<T, RedactorError>;

/// Comprehensive error type for extraction, matching and redaction.
#[derive(Debug, Error)]
pub enum RedactorError {
    /// The container lacks a stream the extractor requires.
    #[error("Missing stream '{stream}'")]
    MissingStream { stream: String },

    /// A declared offset + length runs past the end of the data it points into.
    #[error("{what} range {offset}+{length} exceeds available {available} bytes")]
    RangeOverflow {
        what: String,
        offset: usize,
        length: usize,
        available: usize,
    },

    /// A structure inside a stream is not what the format requires.
    #[error("Malformed {context}: {reason}")]
    MalformedStructure { context: String, reason: String },

    /// No extractor recognizes the input.
    #[error("Unsupported format: {reason}")]
    UnsupportedFormat { reason: String },

    /// Every candidate encoding failed for one run, string or cell.
    #[error("Could not decode {context}")]
    DecodeFailure { context: String },

    /// Error occurred while reading or writing files
    #[error("IO error for path '{}': {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    /// Error occurred during PDF processing
    #[error("PDF processing error{}: {message}", .page.map(|p| format!(" on page {}", p)).unwrap_or_default())]
    PdfProcessing {
        message: String,
        page: Option<usize>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Pattern compilation error
    #[error("Pattern error for '{pattern}': {reason}")]
    PatternError { pattern: String, reason: String },

    /// Invalid configuration or parameters
    #[error("Invalid input for '{parameter}': {reason}")]
    InvalidInput { parameter: String, reason: String },

    /// Configuration file could not be loaded
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// Backend-specific error (MuPDF, compound file reader, etc.)
    #[error("{backend} backend error: {message}")]
    BackendError {
        backend: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl RedactorError {
    pub(crate) fn malformed(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedStructure {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing_stream(stream: impl Into<String>) -> Self {
        Self::MissingStream {
            stream: stream.into(),
        }
    }

    pub(crate) fn mupdf(message: impl Into<String>, err: mupdf::Error) -> Self {
        Self::BackendError {
            backend: "MuPDF".to_string(),
            message: message.into(),
            source: Some(Box::new(err)),
        }
    }

    /// Returns true when the input itself is at fault.
    ///
    /// The transport answers these with a client-class response; anything
    /// else is an internal failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingStream { .. }
                | Self::RangeOverflow { .. }
                | Self::MalformedStructure { .. }
                | Self::UnsupportedFormat { .. }
                | Self::InvalidInput { .. }
        )
    }
}

impl From<io::Error> for RedactorError {
    fn from(err: io::Error) -> Self {
        Self::BackendError {
            backend: "std::io".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<regex::Error> for RedactorError {
    fn from(err: regex::Error) -> Self {
        Self::PatternError {
            pattern: "<unknown>".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for RedactorError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidInput {
            parameter: "json".to_string(),
            reason: err.to_string(),
        }
    }
}
