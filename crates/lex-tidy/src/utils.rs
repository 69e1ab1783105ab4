//! Shared parsing and text helpers.
//!
//! These are used by the profiler (to vote on column types), by the
//! type-enforcement rules (to coerce dirty cells) and by header normalization.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

// =============================================================================
// Parsing tokens
// =============================================================================

/// Characters commonly used in numeric formatting that are stripped before parsing.
pub const NUMERIC_FORMAT_CHARS: [char; 7] = [',', '$', '%', '€', '£', '¥', ' '];

/// Tokens that stand for "no value" in hand-maintained spreadsheets.
pub const NULL_TOKENS: [&str; 10] = [
    "n/a", "na", "null", "none", "nan", "missing", "#n/a", "-", "?", "nil",
];

/// Date formats tried in order when coercing text to dates.
pub const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d"];

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid regex: whitespace run"));

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{M}\p{N}\s]").expect("Invalid regex: non-alphanumeric"));

// =============================================================================
// String parsing
// =============================================================================

/// Strip currency, percent, thousands separators and spaces.
///
/// ```rust,ignore
/// assert_eq!(clean_numeric_string("$1,234.56"), "1234.56");
/// ```
pub fn clean_numeric_string(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !NUMERIC_FORMAT_CHARS.contains(c))
        .collect()
}

/// Parse a plain float literal with no cleanup. Used when typing raw cells.
pub fn parse_float_literal(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a numeric value, tolerating formatting characters.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    parse_float_literal(&cleaned)
}

/// Check whether a string is a null token such as `N/A` or `null`.
pub fn is_null_token(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    NULL_TOKENS.iter().any(|&token| lower == token)
}

/// Parse a boolean token (`true/false`, `yes/no`, `y/n`, `t/f`, `1/0`).
pub fn parse_bool_token(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "t" | "1" => Some(true),
        "false" | "no" | "n" | "f" | "0" => Some(false),
        _ => None,
    }
}

/// Parse an ISO `YYYY-MM-DD` date with no other format attempted.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Parse a date using every supported format, including datetimes.
pub fn parse_date_string(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                .map(|dt| dt.date())
        })
}

// =============================================================================
// Text helpers
// =============================================================================

/// Trim and collapse inner whitespace runs to a single space.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s.trim(), " ").into_owned()
}

/// Remove one layer of wrapping quotes (`"abc"` or `'abc'`).
pub fn strip_wrapping_quotes(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Drop every character that is not a letter, digit or whitespace.
///
/// Letters and digits from any script are kept, so `Größe` survives intact.
pub fn strip_punctuation(s: &str) -> String {
    NON_ALPHANUMERIC.replace_all(s, "").into_owned()
}

/// Uppercase the first character of each word and lowercase the rest.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Uppercase the first character of the text and lowercase the rest.
pub fn sentence_case(s: &str) -> String {
    capitalize(s)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}
