//! Append-only audit trail of every mutation made while cleaning.
//!
//! Rules describe their mutations as [`Change`] values. The trail stamps each
//! one with a monotonically increasing sequence number and the originating
//! rule, producing an immutable [`ChangeRecord`]. Records are never reordered,
//! edited or removed; a run that fails part-way keeps everything appended
//! before the failure.

use crate::dataset::CellValue;
use crate::rules::RuleTier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// What kind of mutation a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    CellUpdated,
    RowRemoved,
    ColumnRemoved,
    HeaderRenamed,
}

impl ChangeKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::CellUpdated => "Cell updated",
            Self::RowRemoved => "Row removed",
            Self::ColumnRemoved => "Column removed",
            Self::HeaderRenamed => "Header renamed",
        }
    }
}

/// Before/after value recorded for a change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AuditValue {
    Cell(CellValue),
    Header(String),
    /// Rendered cells of a whole row
    Row(Vec<String>),
    Absent,
}

impl fmt::Display for AuditValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditValue::Cell(cell) => write!(f, "{cell}"),
            AuditValue::Header(name) => write!(f, "{name}"),
            AuditValue::Row(cells) => write!(f, "{}", cells.join(", ")),
            AuditValue::Absent => Ok(()),
        }
    }
}

/// A mutation reported by a rule, before it is stamped into the trail.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub kind: ChangeKind,
    pub column: Option<String>,
    /// Raw row positions affected
    pub rows: Vec<usize>,
    pub before: AuditValue,
    pub after: AuditValue,
}

impl Change {
    pub fn cell(column: &str, row: usize, before: CellValue, after: CellValue) -> Self {
        Self {
            kind: ChangeKind::CellUpdated,
            column: Some(column.to_string()),
            rows: vec![row],
            before: AuditValue::Cell(before),
            after: AuditValue::Cell(after),
        }
    }

    pub fn row_removed(row: usize, cells: Vec<String>) -> Self {
        Self {
            kind: ChangeKind::RowRemoved,
            column: None,
            rows: vec![row],
            before: AuditValue::Row(cells),
            after: AuditValue::Absent,
        }
    }

    pub fn column_removed(column: &str) -> Self {
        Self {
            kind: ChangeKind::ColumnRemoved,
            column: Some(column.to_string()),
            rows: Vec::new(),
            before: AuditValue::Header(column.to_string()),
            after: AuditValue::Absent,
        }
    }

    pub fn header_renamed(before: &str, after: &str) -> Self {
        Self {
            kind: ChangeKind::HeaderRenamed,
            column: Some(before.to_string()),
            rows: Vec::new(),
            before: AuditValue::Header(before.to_string()),
            after: AuditValue::Header(after.to_string()),
        }
    }
}

/// An immutable, sequenced audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub sequence: u64,
    pub rule_id: String,
    pub tier: RuleTier,
    pub kind: ChangeKind,
    pub column: Option<String>,
    pub rows: Vec<usize>,
    pub before: AuditValue,
    pub after: AuditValue,
}

/// Number of records a rule contributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleChangeCount {
    pub rule_id: String,
    pub changes: usize,
}

/// Ordered, append-only sequence of change records for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditTrail {
    records: Vec<ChangeRecord>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp and append a change, returning its sequence number.
    pub fn append(&mut self, rule_id: &str, tier: RuleTier, change: Change) -> u64 {
        let sequence = self.records.last().map_or(1, |r| r.sequence + 1);
        self.records.push(ChangeRecord {
            sequence,
            rule_id: rule_id.to_string(),
            tier,
            kind: change.kind,
            column: change.column,
            rows: change.rows,
            before: change.before,
            after: change.after,
        });
        sequence
    }

    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn by_rule<'a>(&'a self, rule_id: &'a str) -> impl Iterator<Item = &'a ChangeRecord> {
        self.records.iter().filter(move |r| r.rule_id == rule_id)
    }

    /// Records touching a column under any name it has had during the run.
    pub fn by_column(&self, column: &str) -> Vec<&ChangeRecord> {
        let aliases = self.column_aliases(column);
        self.records
            .iter()
            .filter(|r| r.column.as_deref().is_some_and(|c| aliases.contains(c)))
            .collect()
    }

    /// Full history of one cell, identified by column and raw row position.
    pub fn lineage(&self, column: &str, row: usize) -> Vec<&ChangeRecord> {
        let aliases = self.column_aliases(column);
        self.records
            .iter()
            .filter(|r| match r.kind {
                ChangeKind::CellUpdated => {
                    r.rows.contains(&row)
                        && r.column.as_deref().is_some_and(|c| aliases.contains(c))
                }
                ChangeKind::RowRemoved => r.rows.contains(&row),
                ChangeKind::ColumnRemoved | ChangeKind::HeaderRenamed => {
                    r.column.as_deref().is_some_and(|c| aliases.contains(c))
                }
            })
            .collect()
    }

    /// Per-rule record counts in order of each rule's first record.
    pub fn summary(&self) -> Vec<RuleChangeCount> {
        let mut summary: Vec<RuleChangeCount> = Vec::new();
        for record in &self.records {
            match summary.iter_mut().find(|s| s.rule_id == record.rule_id) {
                Some(entry) => entry.changes += 1,
                None => summary.push(RuleChangeCount {
                    rule_id: record.rule_id.clone(),
                    changes: 1,
                }),
            }
        }
        summary
    }

    /// Distinct raw rows touched by any record.
    pub fn affected_rows(&self) -> BTreeSet<usize> {
        self.records
            .iter()
            .flat_map(|r| r.rows.iter().copied())
            .collect()
    }

    fn column_aliases<'a>(&'a self, column: &'a str) -> BTreeSet<&'a str> {
        let mut aliases = BTreeSet::from([column]);
        for record in &self.records {
            if let (AuditValue::Header(before), AuditValue::Header(after)) =
                (&record.before, &record.after)
            {
                if aliases.contains(after.as_str()) {
                    aliases.insert(before.as_str());
                }
                if aliases.contains(before.as_str()) {
                    aliases.insert(after.as_str());
                }
            }
        }
        aliases
    }
}
