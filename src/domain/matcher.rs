//! Rule evaluation over plain text.
//!
//! Resident registration numbers are matched first and every confirmed one
//! is masked out of a working copy of the text, so the looser digit rules
//! that run afterwards cannot report pieces of them again. Masking swaps
//! ASCII characters for ASCII characters, so offsets found in the working
//! copy point at the same bytes in the original.

use super::rules::{RuleId, RuleTable};
use super::PatternMatcher;
use crate::config::{EngineConfig, ValidationOptions};
use crate::error::RedactorResult;
use crate::text::normalize_text;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Written over the digits and separators of confirmed RRN matches.
pub const MASK_CHAR: char = 'R';

const CONTEXT_OPEN: char = '【';
const CONTEXT_CLOSE: char = '】';

static RRN_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{6}[-\s]?[0-9]{7}$").expect("Valid regex"));

/// One reported match. Offsets are character offsets into the matched text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub rule: RuleId,
    pub value: String,
    pub valid: bool,
    #[serde(rename = "index")]
    pub start: usize,
    pub end: usize,
    pub context: String,
}

/// Result of a text match request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Items per rule, for every rule in the table.
    pub counts: BTreeMap<RuleId, usize>,
    pub items: Vec<Match>,
}

impl MatchReport {
    pub fn count(&self, rule: RuleId) -> usize {
        self.counts.get(&rule).copied().unwrap_or(0)
    }
}

/// A text match request as accepted from callers.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchRequest {
    pub text: String,
    #[serde(default)]
    pub rules: Option<Vec<String>>,
    #[serde(default)]
    pub options: Option<ValidationOptions>,
    #[serde(default = "default_normalize")]
    pub normalize: bool,
}

fn default_normalize() -> bool {
    true
}

#[derive(Debug, Clone, Copy)]
struct RawMatch {
    rule: RuleId,
    start: usize,
    end: usize,
    valid: bool,
}

impl RawMatch {
    fn overlaps(&self, other: &RawMatch) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Evaluates rules against text.
pub struct MatchEngine<'a> {
    rules: &'a RuleTable,
    context_window: usize,
}

impl<'a> MatchEngine<'a> {
    pub fn new(rules: &'a RuleTable, context_window: usize) -> Self {
        Self {
            rules,
            context_window,
        }
    }

    pub fn from_config(config: &EngineConfig) -> MatchEngine<'static> {
        MatchEngine::new(RuleTable::global(), config.context_window)
    }

    /// Serves a request, filling unset fields from `defaults`.
    pub fn handle(
        &self,
        request: &MatchRequest,
        defaults: &ValidationOptions,
    ) -> RedactorResult<MatchReport> {
        let selected = self.rules.select(request.rules.as_deref())?;
        let options = request.options.unwrap_or(*defaults);
        Ok(self.run(&request.text, &selected, &options, request.normalize))
    }

    /// Runs the selected rules over `input`.
    ///
    /// Offsets and context refer to the normalized text when `normalize` is set.
    pub fn run(
        &self,
        input: &str,
        selected: &[RuleId],
        options: &ValidationOptions,
        normalize: bool,
    ) -> MatchReport {
        let text = if normalize {
            normalize_text(input)
        } else {
            input.to_string()
        };

        let mut found = Vec::new();

        let working = if selected.contains(&RuleId::Rrn) {
            let rule = self.rules.get(RuleId::Rrn);
            let mut confirmed = Vec::new();
            for m in rule.pattern().find_iter(&text) {
                let valid = rule.validate(m.as_str(), options);
                if valid {
                    confirmed.push((m.start(), m.end()));
                }
                found.push(RawMatch {
                    rule: RuleId::Rrn,
                    start: m.start(),
                    end: m.end(),
                    valid,
                });
            }
            mask_spans(&text, &confirmed)
        } else {
            text.clone()
        };

        let mut ordered = selected.to_vec();
        ordered.sort_by_key(|id| self.rules.get(*id).priority_rank);
        ordered.dedup();

        for id in ordered.into_iter().filter(|id| *id != RuleId::Rrn) {
            let rule = self.rules.get(id);
            let spans: Vec<(usize, usize)> = if id == RuleId::Card {
                card_spans(&working)
                    .into_iter()
                    .map(|(start, end)| {
                        let digits = working[start..end].trim_end_matches(&[' ', '-'][..]);
                        (start, start + digits.len())
                    })
                    .filter(|&(start, end)| self.card_candidate_ok(&text, start, end))
                    .collect()
            } else {
                rule.pattern()
                    .find_iter(&working)
                    .map(|m| (m.start(), m.end()))
                    .collect()
            };
            for (start, end) in spans {
                found.push(RawMatch {
                    rule: id,
                    start,
                    end,
                    valid: rule.validate(&text[start..end], options),
                });
            }
        }

        let found = resolve_overlaps(found);
        tracing::debug!(items = found.len(), "matched text");

        let index = CharIndex::new(&text);
        let mut counts: BTreeMap<RuleId, usize> = self.rules.iter().map(|r| (r.id, 0)).collect();
        let items = found
            .into_iter()
            .map(|m| {
                *counts.entry(m.rule).or_insert(0) += 1;
                Match {
                    rule: m.rule,
                    value: text[m.start..m.end].to_string(),
                    valid: m.valid,
                    start: index.char_at(m.start),
                    end: index.char_at(m.end),
                    context: index.context(&text, m.start, m.end, self.context_window),
                }
            })
            .collect();

        MatchReport { counts, items }
    }

    /// Card numbers are rejected when they look like an RRN or share a line
    /// with something RRN-shaped. `text` is the unmasked text, so confirmed
    /// RRNs count too.
    fn card_candidate_ok(&self, text: &str, start: usize, end: usize) -> bool {
        if RRN_LIKE.is_match(&text[start..end]) {
            return false;
        }

        let line_start = text[..start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = text[end..].find('\n').map_or(text.len(), |i| end + i);
        !self
            .rules
            .get(RuleId::Rrn)
            .pattern()
            .is_match(&text[line_start..line_end])
    }
}

const CARD_MIN_DIGITS: usize = 13;
const CARD_MAX_DIGITS: usize = 19;

/// Byte spans of card number candidates: 13 to 19 digits, each optionally
/// followed by one space or hyphen, with no digit directly before or after.
///
/// When the longest run at a start touches another digit, shorter runs are
/// tried down to 13 digits, so a card followed by an expiry group is still
/// found. A span may end in a separator.
pub fn card_spans(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let preceded = pos > 0 && bytes[pos - 1].is_ascii_digit();
        if !preceded && bytes[pos].is_ascii_digit() {
            if let Some(end) = card_at(bytes, pos) {
                spans.push((pos, end));
                pos = end;
                continue;
            }
        }
        pos += 1;
    }
    spans
}

fn card_at(bytes: &[u8], start: usize) -> Option<usize> {
    // (end after the digit, end after its separator) per digit
    let mut groups = Vec::with_capacity(CARD_MAX_DIGITS);
    let mut i = start;
    while groups.len() < CARD_MAX_DIGITS && bytes.get(i).is_some_and(u8::is_ascii_digit) {
        let digit_end = i + 1;
        let sep_end = match bytes.get(digit_end) {
            Some(b' ') | Some(b'-') => digit_end + 1,
            _ => digit_end,
        };
        groups.push((digit_end, sep_end));
        i = sep_end;
    }

    let free = |end: usize| !bytes.get(end).is_some_and(u8::is_ascii_digit);
    for n in (CARD_MIN_DIGITS..=groups.len()).rev() {
        let (digit_end, sep_end) = groups[n - 1];
        if free(sep_end) {
            return Some(sep_end);
        }
        if sep_end != digit_end && free(digit_end) {
            return Some(digit_end);
        }
    }
    None
}

/// Drops card matches inside a confirmed RRN and landline matches inside a
/// confirmed mobile number.
fn resolve_overlaps(found: Vec<RawMatch>) -> Vec<RawMatch> {
    let confirmed = |rule: RuleId| -> Vec<RawMatch> {
        found
            .iter()
            .filter(|m| m.rule == rule && m.valid)
            .copied()
            .collect()
    };
    let rrns = confirmed(RuleId::Rrn);
    let mobiles = confirmed(RuleId::PhoneMobile);

    found
        .into_iter()
        .filter(|m| match m.rule {
            RuleId::Card => !rrns.iter().any(|r| r.overlaps(m)),
            RuleId::PhoneCity => !mobiles.iter().any(|r| r.overlaps(m)),
            _ => true,
        })
        .collect()
}

/// Replaces digits, hyphens and spaces inside the given byte spans with
/// [`MASK_CHAR`]. The result has the same byte length as `text`.
pub fn mask_spans(text: &str, spans: &[(usize, usize)]) -> String {
    if spans.is_empty() {
        return text.to_string();
    }
    text.char_indices()
        .map(|(i, c)| {
            let inside = spans.iter().any(|&(s, e)| s <= i && i < e);
            if inside && (c.is_ascii_digit() || c == '-' || c == ' ') {
                MASK_CHAR
            } else {
                c
            }
        })
        .collect()
}

/// Byte-to-character offset conversion for one text.
struct CharIndex {
    boundaries: Vec<usize>,
    len: usize,
}

impl CharIndex {
    fn new(text: &str) -> Self {
        Self {
            boundaries: text.char_indices().map(|(i, _)| i).collect(),
            len: text.len(),
        }
    }

    fn char_at(&self, byte: usize) -> usize {
        self.boundaries.partition_point(|&b| b < byte)
    }

    fn byte_at(&self, ch: usize) -> usize {
        self.boundaries.get(ch).copied().unwrap_or(self.len)
    }

    /// Up to `window` characters either side of the match, with the match bracketed.
    fn context(&self, text: &str, start: usize, end: usize, window: usize) -> String {
        let lo = self.byte_at(self.char_at(start).saturating_sub(window));
        let hi = self.byte_at(self.char_at(end) + window);
        format!(
            "{}{}{}{}{}",
            &text[lo..start],
            CONTEXT_OPEN,
            &text[start..end],
            CONTEXT_CLOSE,
            &text[end..hi]
        )
    }
}
