//! Locating PII on a PDF page.
//!
//! The page is seen as a list of positioned words. Most rules run over the
//! words joined by single spaces and each match is mapped back to the words
//! it covers, whose boxes are unioned. Two rules need special handling:
//!
//! - card numbers are often split across several number-only words, so
//!   consecutive digit/hyphen words are gathered into one candidate
//! - e-mail boxes estimated from words are loose, so the page is searched
//!   for the exact address and the hit that best overlaps the estimate wins

use super::strategy::RedactionBox;
use crate::config::ValidationOptions;
use crate::domain::{PatternMatcher, RuleId, RuleTable};
use crate::text::digits_only;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NUMERIC_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9\- ]+$").expect("Valid regex"));

/// Axis-aligned rectangle in PDF points, y growing downwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let r = Rect {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        };
        (r.x0 < r.x1 && r.y0 < r.y1).then_some(r)
    }

    /// Intersection over union; 0.0 for disjoint or degenerate boxes.
    pub fn iou(&self, other: &Rect) -> f64 {
        let inter = self.intersection(other).map_or(0.0, |r| r.area());
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }

    /// Swaps inverted coordinates so that x0 <= x1 and y0 <= y1.
    pub fn normalized(&self) -> Rect {
        Rect {
            x0: self.x0.min(self.x1),
            y0: self.y0.min(self.y1),
            x1: self.x0.max(self.x1),
            y1: self.y0.max(self.y1),
        }
    }

    /// Clips to a page of the given size.
    pub fn clamped(&self, width: f64, height: f64) -> Rect {
        Rect {
            x0: self.x0.clamp(0.0, width),
            y0: self.y0.clamp(0.0, height),
            x1: self.x1.clamp(0.0, width),
            y1: self.y1.clamp(0.0, height),
        }
    }
}

/// A word on the page with its bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub rect: Rect,
    pub text: String,
}

impl Word {
    pub fn new(text: impl Into<String>, rect: Rect) -> Self {
        Self {
            rect,
            text: text.into(),
        }
    }
}

/// What the locator needs to know about a page.
pub trait PageGeometry {
    /// Words in reading order.
    fn words(&self) -> &[Word];

    /// Boxes of every exact occurrence of `needle`. Search failures yield none.
    fn search_exact(&self, needle: &str) -> Vec<Rect>;

    /// Page width and height in points.
    fn size(&self) -> (f64, f64);
}

/// Turns rule matches on a page into redaction boxes.
pub struct RedactionLocator<'a> {
    rules: &'a RuleTable,
    options: ValidationOptions,
}

impl<'a> RedactionLocator<'a> {
    pub fn new(rules: &'a RuleTable, options: ValidationOptions) -> Self {
        Self { rules, options }
    }

    /// Finds every validated match of the selected rules on one page.
    ///
    /// `page_index` is zero-based. Matches that fail validation are dropped
    /// and boxes are clipped to the page.
    pub fn locate<P: PageGeometry + ?Sized>(
        &self,
        page_index: u32,
        page: &P,
        selected: &[RuleId],
    ) -> Vec<RedactionBox> {
        let words = page.words();
        if words.is_empty() {
            return Vec::new();
        }

        let (width, height) = page.size();
        let mut boxes = Vec::new();
        for &id in selected {
            let rule = self.rules.get(id);
            let candidates = match id {
                RuleId::Card => self.card_candidates(words),
                _ => joined_matches(words, rule.pattern()),
            };

            for (rect, matched) in candidates {
                if !rule.validate(&matched, &self.options) {
                    tracing::debug!(rule = %id, page = page_index, "dropped unvalidated match");
                    continue;
                }
                let rect = if id == RuleId::Email {
                    refine_by_search(page, &matched, rect)
                } else {
                    rect
                };
                let rect = rect.clamped(width, height);
                boxes.push(RedactionBox::new(page_index, rect, matched, id.as_str()));
            }
        }
        boxes
    }

    /// Gathers runs of number-only words and keeps those whose digits form
    /// a card number.
    fn card_candidates(&self, words: &[Word]) -> Vec<(Rect, String)> {
        let card = self.rules.get(RuleId::Card);
        let mut out = Vec::new();
        let mut run: Vec<&Word> = Vec::new();

        let mut flush = |run: &mut Vec<&Word>| {
            if run.is_empty() {
                return;
            }
            let joined: String = run.iter().map(|w| w.text.as_str()).collect();
            if card.is_full_match(&digits_only(&joined)) {
                let rect = union_of(run.iter().map(|w| w.rect));
                let text = run.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ");
                out.push((rect, text));
            }
            run.clear();
        };

        for word in words {
            if NUMERIC_TOKEN.is_match(&word.text) {
                run.push(word);
            } else {
                flush(&mut run);
            }
        }
        flush(&mut run);
        out
    }
}

/// Runs `pattern` over the words joined with single spaces and maps every
/// match back to the union box of the words it touches.
pub fn joined_matches(words: &[Word], pattern: &Regex) -> Vec<(Rect, String)> {
    let mut joined = String::new();
    let mut spans = Vec::with_capacity(words.len());
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            joined.push(' ');
        }
        let start = joined.len();
        joined.push_str(&word.text);
        spans.push((start, joined.len()));
    }

    pattern
        .find_iter(&joined)
        .filter_map(|m| {
            let covered = words
                .iter()
                .zip(&spans)
                .filter(|(_, span)| span.0 < m.end() && m.start() < span.1)
                .map(|(w, _)| w.rect);
            let mut covered = covered.peekable();
            covered.peek()?;
            Some((union_of(covered), m.as_str().to_string()))
        })
        .collect()
}

/// Replaces an estimated box with the exact-search hit that overlaps it best.
///
/// The first hit wins ties; with no hits the estimate stands.
fn refine_by_search<P: PageGeometry + ?Sized>(page: &P, needle: &str, estimate: Rect) -> Rect {
    let mut best: Option<(f64, Rect)> = None;
    for hit in page.search_exact(needle) {
        let score = hit.iou(&estimate);
        if best.map_or(true, |(s, _)| score > s) {
            best = Some((score, hit));
        }
    }
    best.map_or(estimate, |(_, r)| r)
}

fn union_of(rects: impl Iterator<Item = Rect>) -> Rect {
    rects
        .reduce(|a, b| a.union(&b))
        .unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0))
}

/// Prepares the boxes of one page for drawing: coordinates normalized,
/// clipped to the page, and anything thinner than `min_size` dropped.
pub fn prepare_page_boxes<'b>(
    boxes: impl IntoIterator<Item = &'b RedactionBox>,
    width: f64,
    height: f64,
    min_size: f64,
) -> Vec<Rect> {
    boxes
        .into_iter()
        .map(|b| b.rect().normalized().clamped(width, height))
        .filter(|r| r.width() >= min_size && r.height() >= min_size)
        .collect()
}
