//! Quality scoring.
//!
//! A dataset starts at 100 points and loses points for each issue. The
//! itemized deductions are kept so a report can show why the score is what
//! it is.

mod scorer;

pub use scorer::QualityScorer;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Letter grade for a quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    /// 95-100
    A,
    /// 85-94
    B,
    /// 70-84
    C,
    /// 50-69
    D,
    /// Below 50
    F,
}

impl Grade {
    pub fn from_score(score: u8) -> Self {
        match score {
            95.. => Self::A,
            85..=94 => Self::B,
            70..=84 => Self::C,
            50..=69 => Self::D,
            _ => Self::F,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        };
        write!(f, "{letter}")
    }
}

/// What a deduction was charged for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionKind {
    MissingValues,
    Duplicates,
    Constraint,
    Outliers,
    Drift,
}

/// One itemized deduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deduction {
    pub kind: DeductionKind,
    pub column: Option<String>,
    pub points: f64,
    pub reason: String,
}

/// A 0-100 quality score with its itemization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub score: u8,
    pub grade: Grade,
    pub deductions: Vec<Deduction>,
}

impl QualityScore {
    /// Build a score from deductions, flooring at 0.
    pub fn from_deductions(deductions: Vec<Deduction>) -> Self {
        let total: f64 = deductions.iter().map(|d| d.points).sum();
        let score = (100.0 - total).clamp(0.0, 100.0).round() as u8;
        Self {
            score,
            grade: Grade::from_score(score),
            deductions,
        }
    }

    pub fn total_deducted(&self) -> f64 {
        self.deductions.iter().map(|d| d.points).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_bands() {
        assert_eq!(Grade::from_score(100), Grade::A);
        assert_eq!(Grade::from_score(95), Grade::A);
        assert_eq!(Grade::from_score(94), Grade::B);
        assert_eq!(Grade::from_score(70), Grade::C);
        assert_eq!(Grade::from_score(50), Grade::D);
        assert_eq!(Grade::from_score(49), Grade::F);
        assert_eq!(Grade::B.to_string(), "B");
    }

    #[test]
    fn test_score_floors_at_zero() {
        let deductions = (0..30)
            .map(|i| Deduction {
                kind: DeductionKind::Constraint,
                column: Some(format!("c{i}")),
                points: 5.0,
                reason: "violation".into(),
            })
            .collect();
        let score = QualityScore::from_deductions(deductions);
        assert_eq!(score.score, 0);
        assert_eq!(score.grade, Grade::F);
        assert_eq!(score.total_deducted(), 150.0);
    }

    #[test]
    fn test_no_deductions_is_perfect() {
        let score = QualityScore::from_deductions(vec![]);
        assert_eq!(score.score, 100);
        assert_eq!(score.grade, Grade::A);
    }
}
