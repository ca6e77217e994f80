//! Canonical text normalization applied before pattern matching.
//!
//! Text pulled out of PDFs and Office binaries carries invisible characters,
//! typographic dashes and odd whitespace that break otherwise simple
//! patterns. [`normalize_text`] folds all of that into a predictable shape.
//! Running it twice gives the same result as running it once.

use unicode_normalization::UnicodeNormalization;

const ZERO_WIDTH: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

const DASHES: &[char] = &[
    '\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{2212}', '\u{FE63}', '\u{2043}',
];

/// Normalizes text for matching.
///
/// 1. `\r\n` and `\r` become `\n`
/// 2. zero-width characters and control characters (other than `\n` and `\t`) are removed,
///    every other whitespace character becomes a plain space
/// 3. NFKC composition
/// 4. dash variants become ASCII `-`
/// 5. tabs become spaces, runs of spaces collapse to one, lines lose trailing spaces
pub fn normalize_text(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let unified = input.replace("\r\n", "\n").replace('\r', "\n");

    // Invisible characters go before composition so that removing them can
    // never leave a sequence that would compose differently on a second pass.
    let visible: String = unified
        .chars()
        .filter_map(|c| match c {
            '\n' | '\t' => Some(c),
            c if ZERO_WIDTH.contains(&c) => None,
            c if c.is_whitespace() => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect();

    let composed: String = visible
        .nfkc()
        .map(|c| if DASHES.contains(&c) { '-' } else { c })
        .collect();

    composed
        .split('\n')
        .map(collapse_spaces)
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_spaces(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut prev_space = false;
    for c in line.chars() {
        let is_space = c == ' ' || c == '\t' || (c.is_whitespace() && c != '\n');
        if is_space {
            if !prev_space {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
    }
    out.truncate(out.trim_end_matches(' ').len());
    out
}

/// Keeps only the ASCII digits of `s`.
pub fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}
