//! Token-level differences between expected and predicted SQL.
//!
//! Statements are split on whitespace (case preserved) and diffed with
//! [`similar`]. Only rows whose strict forms differ are collected, so a
//! prediction that differs in case or surrounding whitespace only is not
//! reported.

use serde::Serialize;
use similar::{ChangeTag, TextDiff};

use crate::{dataset::EvaluationRow, metrics::strict_match};

/// One token of a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "token", rename_all = "snake_case")]
pub enum DiffToken {
    /// Present in both statements
    Same(String),
    /// Present only in the expected statement
    Removed(String),
    /// Present only in the predicted statement
    Added(String)
}

impl DiffToken {
    /// The token text, whatever side it came from.
    pub fn text(&self) -> &str {
        match self {
            Self::Same(t) | Self::Removed(t) | Self::Added(t) => t
        }
    }
}

/// Differences for one mismatching results row.
#[derive(Debug, Clone, Serialize)]
pub struct RowDiff {
    /// Zero-based index of the row in the input table
    pub index:  usize,
    pub input:  String,
    pub tokens: Vec<DiffToken>
}

impl RowDiff {
    /// Number of removed plus added tokens.
    pub fn change_count(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| !matches!(t, DiffToken::Same(_)))
            .count()
    }
}

/// Diff the whitespace tokens of two statements.
pub fn diff_tokens(expected: &str, predicted: &str) -> Vec<DiffToken> {
    let old: Vec<&str> = expected.split_whitespace().collect();
    let new: Vec<&str> = predicted.split_whitespace().collect();
    let diff = TextDiff::from_slices(&old, &new);
    diff.iter_all_changes()
        .map(|change| {
            let token = change.value().to_string();
            match change.tag() {
                ChangeTag::Equal => DiffToken::Same(token),
                ChangeTag::Delete => DiffToken::Removed(token),
                ChangeTag::Insert => DiffToken::Added(token)
            }
        })
        .collect()
}

/// The first `limit` rows whose prediction differs from the reference.
pub fn collect_mismatches(rows: &[EvaluationRow], limit: usize) -> Vec<RowDiff> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| !strict_match(&row.expected_sql, &row.predicted_sql))
        .take(limit)
        .map(|(index, row)| RowDiff {
            index,
            input: row.input.clone(),
            tokens: diff_tokens(&row.expected_sql, &row.predicted_sql)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_has_no_changes() {
        let tokens = diff_tokens("SELECT * FROM t", "SELECT  *  FROM t");
        assert!(tokens.iter().all(|t| matches!(t, DiffToken::Same(_))));
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn test_token_text() {
        assert_eq!(DiffToken::Same("FROM".into()).text(), "FROM");
        assert_eq!(DiffToken::Removed("t;".into()).text(), "t;");
        assert_eq!(DiffToken::Added("s;".into()).text(), "s;");
    }

    #[test]
    fn test_replaced_table() {
        let tokens = diff_tokens("SELECT * FROM t;", "SELECT * FROM s;");
        assert!(tokens.contains(&DiffToken::Removed("t;".into())));
        assert!(tokens.contains(&DiffToken::Added("s;".into())));
    }

    #[test]
    fn test_collect_mismatches_respects_limit() {
        let rows = vec![
            EvaluationRow::new("a", "SELECT 1", "select 1 "),
            EvaluationRow::new("b", "SELECT 1", "SELECT 2"),
            EvaluationRow::new("c", "SELECT 1", "SELECT 3"),
        ];
        let diffs = collect_mismatches(&rows, 1);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].index, 1);
        assert_eq!(diffs[0].change_count(), 2);
    }
}
