//! The built-in PII rule table.
//!
//! Each rule pairs a search pattern with the validator that confirms its
//! matches and a priority rank. Rules are evaluated in rank order, which is
//! also the order their counts are reported in.

use super::validators::{Validate, Validator};
use super::PatternMatcher;
use crate::config::ValidationOptions;
use crate::error::{RedactorError, RedactorResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a built-in rule. Variant order is priority order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    Rrn,
    Email,
    PhoneMobile,
    PhoneCity,
    Bizno,
    Card,
}

impl RuleId {
    /// Every rule, highest priority first.
    pub const ALL: [RuleId; 6] = [
        RuleId::Rrn,
        RuleId::Email,
        RuleId::PhoneMobile,
        RuleId::PhoneCity,
        RuleId::Bizno,
        RuleId::Card,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::Rrn => "rrn",
            RuleId::Email => "email",
            RuleId::PhoneMobile => "phone_mobile",
            RuleId::PhoneCity => "phone_city",
            RuleId::Bizno => "bizno",
            RuleId::Card => "card",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RuleId::Rrn => "Resident registration number (YYMMDD-GNNNNNN)",
            RuleId::Email => "E-mail address",
            RuleId::PhoneMobile => "Mobile phone number (010)",
            RuleId::PhoneCity => "Landline number with area code",
            RuleId::Bizno => "Business registration number (NNN-NN-NNNNN)",
            RuleId::Card => "Payment card number",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleId {
    type Err = RedactorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleId::ALL
            .into_iter()
            .find(|id| id.as_str() == s.trim())
            .ok_or_else(|| RedactorError::InvalidInput {
                parameter: "rules".to_string(),
                reason: format!("unknown rule '{}'", s),
            })
    }
}

/// A compiled rule.
#[derive(Debug)]
pub struct PiiRule {
    pub id: RuleId,
    pub priority_rank: u8,
    pattern: Regex,
    anchored: Regex,
    validator: Validator,
}

impl PiiRule {
    fn new(id: RuleId, priority_rank: u8, pattern: &str, validator: Validator) -> RedactorResult<Self> {
        let compile = |p: &str| {
            Regex::new(p).map_err(|e| RedactorError::PatternError {
                pattern: id.to_string(),
                reason: e.to_string(),
            })
        };
        Ok(Self {
            id,
            priority_rank,
            pattern: compile(pattern)?,
            anchored: compile(&format!("^(?:{})$", pattern))?,
            validator,
        })
    }

    pub fn validator(&self) -> Validator {
        self.validator
    }

    pub fn validate(&self, value: &str, options: &ValidationOptions) -> bool {
        self.validator.validate(value, options)
    }

    /// True when the whole of `value` matches the pattern.
    pub fn is_full_match(&self, value: &str) -> bool {
        self.anchored.is_match(value)
    }
}

impl PatternMatcher for PiiRule {
    fn pattern(&self) -> &Regex {
        &self.pattern
    }

    fn extract_all<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.pattern.find_iter(text).map(|m| m.as_str()).collect()
    }
}

// ASCII digit classes keep byte offsets stable when matched spans are masked.
const RRN_PATTERN: &str = r"\b[0-9]{6}-[1-8][0-9]{6}\b";
const EMAIL_PATTERN: &str = r"\b[a-zA-Z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";
const PHONE_MOBILE_PATTERN: &str = r"\b010[-.\s]?[0-9]{3,4}[-.\s]?[0-9]{4}\b";
const PHONE_CITY_PATTERN: &str =
    r"\b(?:02|0(?:3[1-3]|4[1-4]|5[1-5]|6[1-4]))[-.\s]?[0-9]{3,4}[-.\s]?[0-9]{4}\b";
const BIZNO_PATTERN: &str = r"\b[0-9]{3}-?[0-9]{2}-?[0-9]{5}\b";
// Listed form and full-match check; text is scanned with `matcher::card_spans`,
// which also keeps neighbouring digits out.
const CARD_PATTERN: &str = r"(?:[0-9][ -]?){13,19}";

/// The compiled rule set.
#[derive(Debug)]
pub struct RuleTable {
    rules: Vec<PiiRule>,
}

static RULES: Lazy<RuleTable> =
    Lazy::new(|| RuleTable::new().expect("Valid built-in rule patterns"));

impl RuleTable {
    /// Compiles the built-in rules.
    pub fn new() -> RedactorResult<Self> {
        let rules = vec![
            PiiRule::new(RuleId::Rrn, 0, RRN_PATTERN, Validator::Rrn)?,
            PiiRule::new(RuleId::Email, 1, EMAIL_PATTERN, Validator::Email)?,
            PiiRule::new(RuleId::PhoneMobile, 2, PHONE_MOBILE_PATTERN, Validator::PhoneMobile)?,
            PiiRule::new(RuleId::PhoneCity, 3, PHONE_CITY_PATTERN, Validator::PhoneCity)?,
            PiiRule::new(RuleId::Bizno, 4, BIZNO_PATTERN, Validator::BusinessNumber)?,
            PiiRule::new(RuleId::Card, 5, CARD_PATTERN, Validator::Card)?,
        ];
        Ok(Self { rules })
    }

    /// Process-wide table, compiled on first use.
    pub fn global() -> &'static RuleTable {
        &RULES
    }

    pub fn get(&self, id: RuleId) -> &PiiRule {
        // One rule per id, stored in id order
        &self.rules[id as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &PiiRule> {
        self.rules.iter()
    }

    /// Resolves a caller's rule selection.
    ///
    /// `None` or an empty list selects every rule. Unknown ids are an error.
    /// The result is deduplicated and in priority order.
    pub fn select<S: AsRef<str>>(&self, ids: Option<&[S]>) -> RedactorResult<Vec<RuleId>> {
        let mut selected: Vec<RuleId> = match ids {
            Some(ids) if !ids.is_empty() => ids
                .iter()
                .map(|s| s.as_ref().parse())
                .collect::<RedactorResult<_>>()?,
            _ => RuleId::ALL.to_vec(),
        };
        selected.sort_by_key(|id| self.get(*id).priority_rank);
        selected.dedup();
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order_matches_ids() {
        let table = RuleTable::global();
        for (i, rule) in table.iter().enumerate() {
            assert_eq!(rule.id, RuleId::ALL[i]);
            assert_eq!(table.get(rule.id).id, rule.id);
        }
    }

    #[test]
    fn test_rule_id_round_trip_names() {
        assert_eq!("phone_city".parse::<RuleId>().unwrap(), RuleId::PhoneCity);
        assert_eq!(RuleId::Bizno.to_string(), "bizno");
        assert_eq!(serde_json::to_string(&RuleId::PhoneMobile).unwrap(), "\"phone_mobile\"");
        assert!("passport".parse::<RuleId>().is_err());
    }

    #[test]
    fn test_select() {
        let table = RuleTable::global();
        assert_eq!(table.select::<String>(None).unwrap(), RuleId::ALL.to_vec());
        assert_eq!(
            table.select(Some(["card", "rrn", "card"].as_slice())).unwrap(),
            vec![RuleId::Rrn, RuleId::Card]
        );
        let err = table.select(Some(["rrn", "passport"].as_slice())).unwrap_err();
        assert!(matches!(err, RedactorError::InvalidInput { .. }));
    }

    #[test]
    fn test_patterns() {
        let table = RuleTable::global();
        let rrn = table.get(RuleId::Rrn);
        assert_eq!(rrn.extract_all("주민번호 900101-1234567 끝"), vec!["900101-1234567"]);
        assert!(rrn.extract_all("900101-9234567").is_empty());

        let mobile = table.get(RuleId::PhoneMobile);
        assert_eq!(mobile.extract_all("연락처 010-1234-5678 입니다"), vec!["010-1234-5678"]);

        let city = table.get(RuleId::PhoneCity);
        assert_eq!(city.extract_all("tel 02-123-4567"), vec!["02-123-4567"]);

        let email = table.get(RuleId::Email);
        assert_eq!(email.extract_all("mail kim@example.com."), vec!["kim@example.com"]);
    }

    #[test]
    fn test_card_full_match() {
        let card = RuleTable::global().get(RuleId::Card);
        assert!(card.is_full_match("378282246310005"));
        assert!(card.is_full_match("4111 1111 1111 1111"));
        assert!(!card.is_full_match("123456789012"));
        assert!(!card.is_full_match("12345678901234567890"));
    }
}
