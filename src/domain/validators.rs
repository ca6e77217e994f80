//! Checks that separate real identifiers from look-alike digit runs.
//!
//! Patterns find candidates; the functions here decide whether a candidate
//! could actually have been issued. All checks are pure and never panic on
//! odd input.

use crate::config::ValidationOptions;
use crate::text::digits_only;
use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static RRN_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{6})-([0-9]{7})$").expect("Valid regex"));

static AREA_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:02|0(?:3[1-3]|4[1-4]|5[1-5]|6[1-4]))").expect("Valid regex")
});

static EMAIL_STRICT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@(?:[A-Za-z0-9-]+\.)+[A-Za-z]{2,}$").expect("Valid regex")
});

const RRN_WEIGHTS: [u32; 12] = [2, 3, 4, 5, 6, 7, 8, 9, 2, 3, 4, 5];
const BIZNO_WEIGHTS: [u32; 9] = [1, 3, 7, 1, 3, 7, 1, 3, 5];

/// Something that can accept or reject a matched value.
pub trait Validate {
    fn validate(&self, value: &str, options: &ValidationOptions) -> bool;
}

/// The validator attached to each built-in rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    Rrn,
    PhoneMobile,
    PhoneCity,
    Email,
    BusinessNumber,
    Card,
}

impl Validate for Validator {
    fn validate(&self, value: &str, options: &ValidationOptions) -> bool {
        match self {
            Validator::Rrn => is_valid_rrn(value, options.rrn_checksum),
            Validator::PhoneMobile => is_valid_phone_mobile(value),
            Validator::PhoneCity => is_valid_phone_city(value),
            Validator::Email => is_valid_email(value),
            Validator::BusinessNumber => is_valid_bizno(value),
            Validator::Card => is_valid_card(value, options.card_iin_filter),
        }
    }
}

/// Validates a resident registration number against today's date.
pub fn is_valid_rrn(value: &str, use_checksum: bool) -> bool {
    is_valid_rrn_on(value, Local::now().date_naive(), use_checksum)
}

/// Validates a resident registration number as of `today`.
///
/// The number must be `YYMMDD-GNNNNNN`. The gender/century digit G picks the
/// century (1, 2, 5, 6 for the 1900s; 3, 4, 7, 8 for the 2000s), the birth
/// date must exist and must not lie after `today`.
pub fn is_valid_rrn_on(value: &str, today: NaiveDate, use_checksum: bool) -> bool {
    let Some(caps) = RRN_SHAPE.captures(value) else {
        return false;
    };
    let (front, back) = (&caps[1], &caps[2]);

    let century = match back.as_bytes()[0] {
        b'1' | b'2' | b'5' | b'6' => 1900,
        b'3' | b'4' | b'7' | b'8' => 2000,
        _ => return false,
    };

    let field = |range: std::ops::Range<usize>| front[range].parse::<u32>().ok();
    let (Some(yy), Some(month), Some(day)) = (field(0..2), field(2..4), field(4..6)) else {
        return false;
    };

    match NaiveDate::from_ymd_opt(century + yy as i32, month, day) {
        Some(birth) if birth <= today => {}
        _ => return false,
    }

    !use_checksum || rrn_checksum_ok(&format!("{}{}", front, back))
}

/// Weighted mod-11 check over the 13 digits of a resident registration number.
pub fn rrn_checksum_ok(digits: &str) -> bool {
    let d: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
    if d.len() != 13 {
        return false;
    }
    let total: u32 = d.iter().zip(RRN_WEIGHTS).map(|(x, w)| x * w).sum();
    (11 - total % 11) % 10 == d[12]
}

/// Mobile numbers are exactly 11 digits starting with 010.
pub fn is_valid_phone_mobile(value: &str) -> bool {
    let digits = digits_only(value);
    digits.len() == 11 && digits.starts_with("010")
}

/// Landline numbers need a known area code and a length that fits it.
///
/// Seoul (02) numbers are 9 or 10 digits, every other area 10 or 11.
pub fn is_valid_phone_city(value: &str) -> bool {
    let digits = digits_only(value);
    if !AREA_CODE.is_match(&digits) {
        return false;
    }
    if digits.starts_with("02") {
        (9..=10).contains(&digits.len())
    } else {
        (10..=11).contains(&digits.len())
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_STRICT.is_match(value)
}

/// Luhn check over the digits of `value`, which must number 13 to 19.
pub fn luhn_ok(value: &str) -> bool {
    let digits: Vec<u32> = value.chars().filter_map(|c| c.to_digit(10)).collect();
    if !(13..=19).contains(&digits.len()) {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
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
    sum % 10 == 0
}

/// Issuer prefixes as (prefix length, low, high), inclusive.
const KNOWN_IIN_RANGES: &[(usize, u32, u32)] = &[
    (1, 4, 4),         // Visa
    (2, 51, 55),       // Mastercard
    (4, 2221, 2720),   // Mastercard 2-series
    (2, 34, 34),       // American Express
    (2, 37, 37),       // American Express
    (4, 6011, 6011),   // Discover
    (3, 644, 649),     // Discover
    (2, 65, 65),       // Discover
    (4, 3528, 3589),   // JCB
    (3, 300, 305),     // Diners Club
    (2, 36, 36),       // Diners Club
    (2, 38, 39),       // Diners Club
    (2, 62, 62),       // UnionPay
    (2, 94, 94),       // domestic BC cards
];

/// Returns true when the leading digits belong to a known card issuer.
pub fn has_known_iin(digits: &str) -> bool {
    KNOWN_IIN_RANGES.iter().any(|&(len, lo, hi)| {
        digits
            .get(..len)
            .and_then(|p| p.parse::<u32>().ok())
            .is_some_and(|p| (lo..=hi).contains(&p))
    })
}

pub fn is_valid_card(value: &str, iin_filter: bool) -> bool {
    let digits = digits_only(value);
    luhn_ok(&digits) && (!iin_filter || has_known_iin(&digits))
}

/// Business registration number: ten digits with a weighted check digit.
pub fn is_valid_bizno(value: &str) -> bool {
    let d: Vec<u32> = value.chars().filter_map(|c| c.to_digit(10)).collect();
    if d.len() != 10 {
        return false;
    }
    let mut sum: u32 = d.iter().zip(BIZNO_WEIGHTS).map(|(x, w)| x * w).sum();
    sum += (d[8] * 5) / 10;
    (10 - sum % 10) % 10 == d[9]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_rrn_date_and_century() {
        let today = day(2024, 6, 1);
        assert!(is_valid_rrn_on("900101-1234567", today, false));
        assert!(is_valid_rrn_on("050101-3234567", today, false));
        // 2090 is in the future
        assert!(!is_valid_rrn_on("900101-3234567", today, false));
        // no 13th month
        assert!(!is_valid_rrn_on("901301-1234567", today, false));
        // 9 is not a century digit
        assert!(!is_valid_rrn_on("900101-9234567", today, false));
        assert!(!is_valid_rrn_on("9001011234567", today, false));
    }

    #[test]
    fn test_rrn_leap_day() {
        let today = day(2024, 6, 1);
        assert!(is_valid_rrn_on("000229-3123456", today, false));
        assert!(!is_valid_rrn_on("010229-3123456", today, false));
    }

    #[test]
    fn test_rrn_checksum() {
        // weights over 900101123456 sum to 124; (11 - 124 % 11) % 10 = 8
        assert!(rrn_checksum_ok("9001011234568"));
        assert!(!rrn_checksum_ok("9001011234567"));

        let today = day(2024, 6, 1);
        assert!(is_valid_rrn_on("900101-1234568", today, true));
        assert!(!is_valid_rrn_on("900101-1234567", today, true));
    }

    #[test]
    fn test_phone_mobile() {
        assert!(is_valid_phone_mobile("010-1234-5678"));
        assert!(is_valid_phone_mobile("010 1234 5678"));
        assert!(!is_valid_phone_mobile("010-123-4567"));
        assert!(!is_valid_phone_mobile("011-1234-5678"));
    }

    #[test]
    fn test_phone_city() {
        assert!(is_valid_phone_city("02-123-4567"));
        assert!(is_valid_phone_city("02-1234-5678"));
        assert!(is_valid_phone_city("031-123-4567"));
        assert!(is_valid_phone_city("064-1234-5678"));
        assert!(!is_valid_phone_city("039-123-4567"));
        assert!(!is_valid_phone_city("02-12-3456"));
    }

    #[test]
    fn test_email() {
        assert!(is_valid_email("kim.minsu@example.co.kr"));
        assert!(!is_valid_email("kim@localhost"));
        assert!(!is_valid_email("kim@@example.com"));
    }

    #[test]
    fn test_luhn() {
        assert!(luhn_ok("4111111111111111"));
        assert!(luhn_ok("378282246310005"));
        assert!(!luhn_ok("4111111111111112"));
        assert!(!luhn_ok("411111111111"));
    }

    #[test]
    fn test_card_iin_filter() {
        // Luhn-valid, unknown issuer
        assert!(luhn_ok("1234567812345670"));
        assert!(!is_valid_card("1234567812345670", true));
        assert!(is_valid_card("1234567812345670", false));

        assert!(is_valid_card("4111-1111-1111-1111", true));
        assert!(is_valid_card("5555 5555 5555 4444", true));
        assert!(is_valid_card("3782 822463 10005", true));
    }

    #[test]
    fn test_bizno() {
        assert!(is_valid_bizno("123-45-67891"));
        assert!(is_valid_bizno("2208162517"));
        assert!(is_valid_bizno("124-81-00998"));
        assert!(!is_valid_bizno("101-82-12345"));
        assert!(!is_valid_bizno("123-45-6789"));
    }

    #[test]
    fn test_validator_dispatch_uses_options() {
        let strict = ValidationOptions {
            rrn_checksum: false,
            card_iin_filter: true,
        };
        let loose = ValidationOptions {
            rrn_checksum: false,
            card_iin_filter: false,
        };
        assert!(!Validator::Card.validate("1234567812345670", &strict));
        assert!(Validator::Card.validate("1234567812345670", &loose));
        assert!(Validator::PhoneMobile.validate("01012345678", &strict));
    }
}
