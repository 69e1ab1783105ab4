//! Majority-vote type inference.

use crate::dataset::Column;
use crate::types::ColumnType;

/// Infer a column type by majority vote over its non-missing cells.
///
/// Ties are broken by [`ColumnType::PRIORITY`] (numeric > date > boolean > text).
/// A column with no votes is text.
pub fn infer_column_type(column: &Column) -> ColumnType {
    let mut votes = [0usize; 4];
    for vote in column.values.iter().filter_map(|cell| cell.vote()) {
        votes[priority_index(vote)] += 1;
    }

    let best = votes.iter().copied().max().unwrap_or(0);
    if best == 0 {
        return ColumnType::Text;
    }

    ColumnType::PRIORITY
        .iter()
        .zip(votes)
        .find(|(_, count)| *count == best)
        .map(|(column_type, _)| *column_type)
        .unwrap_or_default()
}

fn priority_index(column_type: ColumnType) -> usize {
    match column_type {
        ColumnType::Numeric => 0,
        ColumnType::Date => 1,
        ColumnType::Boolean => 2,
        ColumnType::Text => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[&str]) -> Column {
        Column::from_raw("c", values.iter().map(|v| Some(*v)))
    }

    #[test]
    fn test_numeric_majority() {
        let col = column(&["1", "$2,000", "abc", "4"]);
        assert_eq!(infer_column_type(&col), ColumnType::Numeric);
    }

    #[test]
    fn test_text_majority() {
        let col = column(&["Paris", "Rome", "3"]);
        assert_eq!(infer_column_type(&col), ColumnType::Text);
    }

    #[test]
    fn test_tie_prefers_numeric_over_text() {
        let col = column(&["1", "x"]);
        assert_eq!(infer_column_type(&col), ColumnType::Numeric);
    }

    #[test]
    fn test_tie_prefers_date_over_boolean() {
        let col = column(&["2020-01-01", "yes"]);
        assert_eq!(infer_column_type(&col), ColumnType::Date);
    }

    #[test]
    fn test_missing_and_null_tokens_do_not_vote() {
        let col = column(&["", "N/A", "  ", "true"]);
        assert_eq!(infer_column_type(&col), ColumnType::Boolean);
    }

    #[test]
    fn test_all_missing_is_text() {
        let col = column(&["", "null"]);
        assert_eq!(infer_column_type(&col), ColumnType::Text);
    }
}
