//! Typed cell values.

use crate::types::ColumnType;
use crate::utils::{
    is_null_token, parse_bool_token, parse_date_string, parse_float_literal, parse_iso_date,
    parse_numeric_string,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a cell holds no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingKind {
    /// Absent value or a null token such as `N/A`
    Null,
    /// Empty string
    Empty,
    /// Whitespace-only string
    Whitespace,
}

/// A single typed cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Numeric(f64),
    Text(String),
    Date(NaiveDate),
    Boolean(bool),
    Missing(MissingKind),
}

impl CellValue {
    /// Type a raw cell read from a file.
    ///
    /// Only unambiguous literals are typed here. Dirty values such as
    /// `"$1,200"` or `"N/A"` stay text so their coercion is audited later.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let Some(s) = raw else {
            return CellValue::Missing(MissingKind::Null);
        };
        if s.is_empty() {
            return CellValue::Missing(MissingKind::Empty);
        }
        if s.trim().is_empty() {
            return CellValue::Missing(MissingKind::Whitespace);
        }
        if let Some(v) = parse_float_literal(s) {
            return CellValue::Numeric(v);
        }
        if s.eq_ignore_ascii_case("true") {
            return CellValue::Boolean(true);
        }
        if s.eq_ignore_ascii_case("false") {
            return CellValue::Boolean(false);
        }
        if let Some(d) = parse_iso_date(s) {
            return CellValue::Date(d);
        }
        CellValue::Text(s.to_string())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing(_))
    }

    /// Missing category, counting null tokens in text as `Null`.
    pub fn missing_kind(&self) -> Option<MissingKind> {
        match self {
            CellValue::Missing(kind) => Some(*kind),
            CellValue::Text(s) if is_null_token(s) => Some(MissingKind::Null),
            _ => None,
        }
    }

    /// Whether the cell counts as missing for statistics.
    pub fn is_missing_like(&self) -> bool {
        self.missing_kind().is_some()
    }

    /// Numeric view of the cell, parsing formatted text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Numeric(v) => Some(*v),
            CellValue::Text(s) => parse_numeric_string(s),
            _ => None,
        }
    }

    /// Date view of the cell, parsing text in any supported format.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            CellValue::Text(s) => parse_date_string(s),
            _ => None,
        }
    }

    /// Boolean view of the cell, accepting tokens and 0/1.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            CellValue::Numeric(v) if *v == 1.0 => Some(true),
            CellValue::Numeric(v) if *v == 0.0 => Some(false),
            CellValue::Text(s) => parse_bool_token(s),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The type this cell votes for during type inference.
    ///
    /// Text votes for the first type it parses as, in priority order.
    pub fn vote(&self) -> Option<ColumnType> {
        match self {
            CellValue::Missing(_) => None,
            CellValue::Numeric(_) => Some(ColumnType::Numeric),
            CellValue::Date(_) => Some(ColumnType::Date),
            CellValue::Boolean(_) => Some(ColumnType::Boolean),
            CellValue::Text(s) => {
                if is_null_token(s) {
                    None
                } else if parse_numeric_string(s).is_some() {
                    Some(ColumnType::Numeric)
                } else if parse_date_string(s).is_some() {
                    Some(ColumnType::Date)
                } else if parse_bool_token(s).is_some() {
                    Some(ColumnType::Boolean)
                } else {
                    Some(ColumnType::Text)
                }
            }
        }
    }

    /// Stable key used for full-row equality. All missing kinds compare equal.
    pub fn equality_key(&self) -> String {
        match self {
            CellValue::Numeric(v) => {
                let normalized = if *v == 0.0 { 0.0 } else { *v };
                format!("n:{:x}", normalized.to_bits())
            }
            CellValue::Text(s) => format!("t:{s}"),
            CellValue::Date(d) => format!("d:{d}"),
            CellValue::Boolean(b) => format!("b:{b}"),
            CellValue::Missing(_) => "m".to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Numeric(v) => write!(f, "{v}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Boolean(b) => write!(f, "{b}"),
            CellValue::Missing(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_missing_categories() {
        assert_eq!(CellValue::from_raw(None), CellValue::Missing(MissingKind::Null));
        assert_eq!(CellValue::from_raw(Some("")), CellValue::Missing(MissingKind::Empty));
        assert_eq!(
            CellValue::from_raw(Some("   ")),
            CellValue::Missing(MissingKind::Whitespace)
        );
    }

    #[test]
    fn test_from_raw_literals() {
        assert_eq!(CellValue::from_raw(Some("42")), CellValue::Numeric(42.0));
        assert_eq!(CellValue::from_raw(Some("TRUE")), CellValue::Boolean(true));
        assert_eq!(
            CellValue::from_raw(Some("2020-01-31")),
            CellValue::Date(NaiveDate::from_ymd_opt(2020, 1, 31).unwrap())
        );
        // Dirty values are kept verbatim
        assert_eq!(
            CellValue::from_raw(Some("$1,200")),
            CellValue::Text("$1,200".to_string())
        );
        assert_eq!(CellValue::from_raw(Some("N/A")), CellValue::Text("N/A".to_string()));
    }

    #[test]
    fn test_null_token_counts_as_missing() {
        let cell = CellValue::Text("NULL".to_string());
        assert!(!cell.is_missing());
        assert!(cell.is_missing_like());
        assert_eq!(cell.missing_kind(), Some(MissingKind::Null));
        assert_eq!(cell.vote(), None);
    }

    #[test]
    fn test_vote_priority() {
        assert_eq!(CellValue::Text("$5".into()).vote(), Some(ColumnType::Numeric));
        assert_eq!(CellValue::Text("03/04/2021".into()).vote(), Some(ColumnType::Date));
        assert_eq!(CellValue::Text("yes".into()).vote(), Some(ColumnType::Boolean));
        assert_eq!(CellValue::Text("Paris".into()).vote(), Some(ColumnType::Text));
    }

    #[test]
    fn test_equality_key() {
        assert_eq!(
            CellValue::Numeric(0.0).equality_key(),
            CellValue::Numeric(-0.0).equality_key()
        );
        assert_eq!(
            CellValue::Missing(MissingKind::Empty).equality_key(),
            CellValue::Missing(MissingKind::Null).equality_key()
        );
        assert_ne!(
            CellValue::Numeric(1.0).equality_key(),
            CellValue::Text("1".into()).equality_key()
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Numeric(5.0).to_string(), "5");
        assert_eq!(CellValue::Numeric(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Missing(MissingKind::Empty).to_string(), "");
    }
}
