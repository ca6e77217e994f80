//! Legacy PowerPoint (.ppt) text.
//!
//! The structured path walks the record stream and keeps the text atoms.
//! Some files keep most of their text out of reach of that walk, so a second
//! path scans the raw stream as UTF-16 and filters the printable runs it
//! finds. [`SlideStrategy`] picks between them.

use crate::config::SlideStrategy;
use crate::text::{decode_chain, decode_utf16le, Candidate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

pub const PRESENTATION_STREAM: &str = "PowerPoint Document";

const TEXT_CHARS_ATOM: u16 = 4000;
const TEXT_BYTES_ATOM: u16 = 4008;
const CSTRING: u16 = 4026;

const RECORD_HEADER_LEN: usize = 8;

const MIN_RUN_CHARS: usize = 2;

/// Template and font names that show up as printable runs in every deck.
const NOISE: &[&str] = &[
    "Click to edit",
    "Master title style",
    "Master text styles",
    "Second level",
    "Third level",
    "Fourth level",
    "Fifth level",
    "Office Theme",
    "Default Design",
    "Arial",
    "Calibri",
    "Times New Roman",
    "Wingdings",
    "Symbol",
    "Tahoma",
    "Verdana",
    "Gulim",
    "Batang",
    "Dotum",
    "Malgun Gothic",
    "마스터 제목 스타일",
    "마스터 텍스트 스타일",
    "둘째 수준",
    "셋째 수준",
    "넷째 수준",
    "다섯째 수준",
    "맑은 고딕",
    "굴림",
    "돋움",
    "바탕",
    "궁서",
];

/// Field labels that make a short run worth keeping.
const PII_LABELS: &[&str] = &[
    "이름", "성명", "주민", "전화", "연락처", "휴대폰", "이메일", "주소", "계좌", "카드", "사업자",
    "생년월일", "name", "phone", "email", "e-mail", "address", "mobile",
];

static EMAIL_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("Valid regex"));

/// Share of letters and digits below which a run counts as binary debris.
const MIN_ALNUM_RATIO: f64 = 0.3;

/// Extracts slide text with the chosen strategy.
pub fn extract_slides(stream: &[u8], strategy: SlideStrategy, code_page: u16) -> String {
    match strategy {
        SlideStrategy::Structured => structured_text(stream, code_page),
        SlideStrategy::Heuristic => heuristic_text(stream),
        SlideStrategy::Auto => {
            let text = structured_text(stream, code_page);
            if text.trim().is_empty() {
                tracing::debug!("record walk found no text, scanning raw stream");
                heuristic_text(stream)
            } else {
                text
            }
        }
    }
}

/// Walks the top-level records and keeps the text of text atoms.
///
/// The walk advances by each record's declared length; a record that runs
/// past the end of the stream is read as far as it goes.
pub fn structured_text(stream: &[u8], code_page: u16) -> String {
    let candidates = [Candidate::CodePage(code_page), Candidate::Utf8];
    let mut offset = 0usize;
    let mut found = Vec::new();

    while offset + RECORD_HEADER_LEN <= stream.len() {
        let header = &stream[offset..offset + RECORD_HEADER_LEN];
        let rec_type = u16::from_le_bytes([header[2], header[3]]);
        let rec_len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;

        let start = offset + RECORD_HEADER_LEN;
        let end = start.saturating_add(rec_len).min(stream.len());
        let payload = &stream[start..end];

        let text = match rec_type {
            TEXT_CHARS_ATOM | CSTRING => Some(decode_utf16le(payload)),
            TEXT_BYTES_ATOM => Some(decode_chain(payload, &candidates)),
            _ => None,
        };
        if let Some(t) = text {
            found.push(t);
        }

        offset = start.saturating_add(rec_len);
    }

    dedupe(found).join("\n")
}

/// Scans the raw stream as UTF-16 and keeps plausible text runs.
pub fn heuristic_text(stream: &[u8]) -> String {
    let decoded = decode_utf16le(stream);

    let mut runs = Vec::new();
    let mut current = String::new();
    for c in decoded.chars() {
        if is_allowed(c) {
            current.push(c);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    let kept = runs
        .into_iter()
        .map(|r| r.trim().to_string())
        .filter(|r| r.chars().count() >= MIN_RUN_CHARS && !is_noise(r))
        .filter(|r| !is_garbage(r))
        .filter(|r| looks_informative(r))
        .collect();

    dedupe(kept).join("\n")
}

fn is_allowed(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{7E}'
        | '\u{AC00}'..='\u{D7A3}'
        | '\u{3130}'..='\u{318F}'
        | '\u{1100}'..='\u{11FF}')
}

fn is_noise(run: &str) -> bool {
    NOISE.iter().any(|n| run.contains(n))
        || run.chars().all(|c| c.is_ascii_punctuation() || c.is_whitespace())
}

/// Short runs and runs mostly made of symbols are what raw record bytes
/// look like when read as UTF-16.
fn is_garbage(run: &str) -> bool {
    let total = run.chars().count();
    let alnum = run.chars().filter(|c| c.is_alphanumeric()).count();
    total <= 3 || alnum == 0 || (alnum as f64) < MIN_ALNUM_RATIO * total as f64
}

fn is_hangul(c: char) -> bool {
    matches!(c, '\u{AC00}'..='\u{D7A3}' | '\u{3130}'..='\u{318F}' | '\u{1100}'..='\u{11FF}')
}

/// Keeps runs that look like an address, carry digits, mention a field
/// label, or mix Hangul with Latin letters.
fn looks_informative(run: &str) -> bool {
    if EMAIL_LIKE.is_match(run) || run.chars().any(|c| c.is_ascii_digit()) {
        return true;
    }
    let lower = run.to_lowercase();
    if PII_LABELS.iter().any(|l| lower.contains(l)) {
        return true;
    }
    run.chars().any(is_hangul) && run.chars().any(|c| c.is_ascii_alphabetic())
}

/// Drops empty values and repeats, keeping first occurrences in order.
fn dedupe(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| !v.trim().is_empty())
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(rec_type: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0x00, 0x00];
        out.extend_from_slice(&rec_type.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn utf16(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    #[test]
    fn test_text_atoms_collected_in_order() {
        let mut stream = atom(TEXT_CHARS_ATOM, &utf16("Hello"));
        stream.extend(atom(1234, &[0xAA; 10]));
        stream.extend(atom(TEXT_BYTES_ATOM, b"World"));
        stream.extend(atom(CSTRING, &utf16("Hello")));

        assert_eq!(structured_text(&stream, 949), "Hello\nWorld");
    }

    #[test]
    fn test_unknown_record_skipped_by_length() {
        let mut stream = atom(1000, &[0u8; 40]);
        stream.extend(atom(TEXT_CHARS_ATOM, &utf16("연락처")));
        assert_eq!(structured_text(&stream, 949), "연락처");
    }

    #[test]
    fn test_truncated_header_ends_walk() {
        let mut stream = atom(TEXT_BYTES_ATOM, b"abc");
        stream.extend_from_slice(&[0, 0, 0xA0]);
        assert_eq!(structured_text(&stream, 949), "abc");
    }

    #[test]
    fn test_heuristic_filters_noise_and_short_runs() {
        let mut raw = utf16("Click to edit Master title style");
        raw.extend_from_slice(&[0x00, 0xD8]); // lone surrogate
        raw.extend(utf16("x"));
        raw.extend_from_slice(&[0x01, 0x00]);
        raw.extend(utf16("연락처 010-1234-5678"));
        raw.extend_from_slice(&[0x02, 0x00]);
        raw.extend(utf16("Calibri"));

        assert_eq!(heuristic_text(&raw), "연락처 010-1234-5678");
    }

    #[test]
    fn test_auto_falls_back_to_heuristic() {
        let raw = utf16("이메일 kim@example.com");
        assert_eq!(extract_slides(&raw, SlideStrategy::Structured, 949), "");
        assert_eq!(
            extract_slides(&raw, SlideStrategy::Auto, 949),
            "이메일 kim@example.com"
        );
    }

    #[test]
    fn test_heuristic_content_tests() {
        // symbol debris, plain prose, then a Hangul/Latin mix
        let mut raw = utf16("a#%&*()!~");
        raw.extend_from_slice(&[0x01, 0x00]);
        raw.extend(utf16("Quarterly review"));
        raw.extend_from_slice(&[0x01, 0x00]);
        raw.extend(utf16("담당 Kim"));

        assert_eq!(heuristic_text(&raw), "담당 Kim");
    }
}
