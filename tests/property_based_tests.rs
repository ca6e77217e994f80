//! Property-based tests for normalization, validation and matching.
//!
//! Uses proptest to check invariants across a wide range of inputs that
//! example-based tests would not think to try.

use chrono::{Duration, Local};
use docredact::domain::mask_spans;
use docredact::domain::validators::{is_valid_card, is_valid_rrn_on, luhn_ok};
use docredact::text::normalize_text;
use docredact::{EngineConfig, MatchEngine, RuleId, ValidationOptions};
use proptest::prelude::*;

/// Appends the Luhn check digit to a digit string.
fn with_check_digit(body: &[u32]) -> String {
    let sum: u32 = body
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 0 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    let check = (10 - sum % 10) % 10;
    body.iter()
        .chain(std::iter::once(&check))
        .map(|d| char::from_digit(*d, 10).unwrap_or('0'))
        .collect()
}

proptest! {
    /// Property: normalizing twice gives the same text as normalizing once
    #[test]
    fn normalize_is_idempotent(
        input in "[a-zA-Z0-9가-힣 \t\r\n@.:-]{0,40}|[０-９ａ-ｚ：–—\u{200B}\u{00A0}\u{3000} a-z0-9]{0,40}",
    ) {
        let once = normalize_text(&input);
        prop_assert_eq!(normalize_text(&once), once);
    }

    /// Property: normalized text has no carriage returns or trailing spaces
    #[test]
    fn normalize_output_shape(input in "[a-z0-9 \t\r\n\u{00A0}]{0,60}") {
        let out = normalize_text(&input);
        prop_assert!(!out.contains('\r'));
        prop_assert!(!out.contains('\t'));
        prop_assert!(!out.contains("  "));
        for line in out.split('\n') {
            prop_assert!(!line.ends_with(' '));
        }
    }

    /// Property: masking never changes the byte length of the text
    #[test]
    fn mask_preserves_length(
        text in "[0-9가-힣a-z -]{0,40}",
        start in 0usize..60,
        len in 0usize..60,
    ) {
        let masked = mask_spans(&text, &[(start, start + len)]);
        prop_assert_eq!(masked.len(), text.len());
        prop_assert_eq!(masked.chars().count(), text.chars().count());
    }

    /// Property: a correct check digit always passes Luhn, a wrong one never does
    #[test]
    fn luhn_check_digit(body in prop::collection::vec(0u32..10, 12..18), bump in 1u32..10) {
        let number = with_check_digit(&body);
        prop_assert!(luhn_ok(&number));

        let mut wrong: Vec<char> = number.chars().collect();
        let last = wrong.len() - 1;
        let digit = wrong[last].to_digit(10).unwrap_or(0);
        wrong[last] = char::from_digit((digit + bump) % 10, 10).unwrap_or('0');
        let wrong: String = wrong.into_iter().collect();
        prop_assert!(!luhn_ok(&wrong));
    }

    /// Property: separators do not change the card verdict
    #[test]
    fn card_separators_ignored(body in prop::collection::vec(0u32..10, 15..16)) {
        let mut visa = vec![4];
        visa.extend(body.into_iter().take(14));
        let number = with_check_digit(&visa);
        let spaced = number
            .as_bytes()
            .chunks(4)
            .map(|c| std::str::from_utf8(c).unwrap_or(""))
            .collect::<Vec<_>>()
            .join(" ");
        prop_assert!(is_valid_card(&number, true));
        prop_assert!(is_valid_card(&spaced, true));
    }

    /// Property: a birth date after today is never a valid RRN
    #[test]
    fn rrn_future_birth_date_rejected(days_ahead in 1i64..3000) {
        let today = Local::now().date_naive();
        let birth = today + Duration::days(days_ahead);
        let yy = birth.format("%y").to_string();
        let gender = if birth.format("%Y").to_string().starts_with("19") { '1' } else { '3' };
        let value = format!("{}{}-{}234567", yy, birth.format("%m%d"), gender);
        prop_assert!(!is_valid_rrn_on(&value, today, false));
    }

    /// Property: matching never panics and reports in-bounds character offsets
    #[test]
    fn match_offsets_in_bounds(input in "[0-9a-z가-힣 @.\n-]{0,80}") {
        let engine = MatchEngine::from_config(&EngineConfig::default());
        let report = engine.run(&input, &RuleId::ALL, &ValidationOptions::default(), true);
        let normalized = normalize_text(&input);
        let chars: Vec<char> = normalized.chars().collect();
        for item in &report.items {
            prop_assert!(item.start < item.end);
            prop_assert!(item.end <= chars.len());
            let span: String = chars[item.start..item.end].iter().collect();
            prop_assert_eq!(&span, &item.value);
        }
        let total: usize = report.counts.values().sum();
        prop_assert_eq!(total, report.items.len());
    }
}
