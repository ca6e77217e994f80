//! Domain models and business logic for PII detection.
//!
//! This module holds the rule table, the validators that confirm what the
//! rules find, and the engine that runs them over text.

pub mod matcher;
pub mod rules;
pub mod validators;

pub use matcher::{card_spans, mask_spans, Match, MatchEngine, MatchReport, MatchRequest};
pub use rules::{PiiRule, RuleId, RuleTable};
pub use validators::{Validate, Validator};

use regex::Regex;

/// Trait for pattern matching strategies.
pub trait PatternMatcher: Send + Sync {
    fn pattern(&self) -> &Regex;
    fn extract_all<'a>(&self, text: &'a str) -> Vec<&'a str>;
}
