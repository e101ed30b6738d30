//! Batch scoring of generated SQL against reference statements.
//!
//! Every row of a results table is scored independently with [`classify`],
//! [`strict_match`], [`bleu`] and a syntax check of the predicted statement.
//! Rows are scored in parallel with [`rayon`]; per-row results keep the input
//! order.
//!
//! # Example
//!
//! ```
//! use nl2sql_eval::{
//!     dataset::EvaluationRow,
//!     evaluation::evaluate,
//!     matcher::MatchKind,
//!     syntax::SqlDialect
//! };
//!
//! let rows = vec![
//!     EvaluationRow::new("q1", "SELECT a, b FROM t;", "SELECT b, a FROM t"),
//!     EvaluationRow::new("q2", "SELECT * FROM t;", "SELECT * FROM s;"),
//! ];
//! let report = evaluate(&rows, SqlDialect::Generic);
//!
//! assert_eq!(report.count(MatchKind::SelectReordered), 1);
//! assert_eq!(report.soft_accuracy(), 50.0);
//! ```

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    dataset::EvaluationRow,
    matcher::{MatchKind, classify},
    metrics::{bleu, strict_match},
    syntax::{SqlDialect, is_valid}
};

/// Number of equal-width BLEU histogram bins over `[0, 1]`.
pub const HISTOGRAM_BINS: usize = 10;

/// Scores of a single results row.
#[derive(Debug, Clone, Serialize)]
pub struct RowResult {
    /// Zero-based index of the row in the input table
    pub index:     usize,
    pub input:     String,
    pub kind:      MatchKind,
    /// Trim + lower-case equality
    pub strict:    bool,
    pub bleu:      f64,
    /// Whether the predicted statement parses
    pub valid_sql: bool
}

/// Aggregated scores over a results table.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub total:          usize,
    /// Rows per match kind, in cascade order
    pub kinds:          IndexMap<MatchKind, usize>,
    pub strict_matches: usize,
    pub valid_sql:      usize,
    pub bleu_histogram: [usize; HISTOGRAM_BINS],
    pub rows:           Vec<RowResult>
}

impl EvaluationReport {
    fn from_rows(rows: Vec<RowResult>) -> Self {
        let mut kinds: IndexMap<MatchKind, usize> =
            MatchKind::ALL.iter().map(|&kind| (kind, 0)).collect();
        let mut bleu_histogram = [0; HISTOGRAM_BINS];
        let mut strict_matches = 0;
        let mut valid_sql = 0;
        for row in &rows {
            *kinds.entry(row.kind).or_insert(0) += 1;
            bleu_histogram[histogram_bin(row.bleu)] += 1;
            strict_matches += usize::from(row.strict);
            valid_sql += usize::from(row.valid_sql);
        }
        Self {
            total: rows.len(),
            kinds,
            strict_matches,
            valid_sql,
            bleu_histogram,
            rows
        }
    }

    /// Rows classified as `kind`.
    pub fn count(&self, kind: MatchKind) -> usize {
        self.kinds.get(&kind).copied().unwrap_or(0)
    }

    /// Rows that soft-match their reference.
    pub fn soft_matches(&self) -> usize {
        self.kinds
            .iter()
            .filter(|(kind, _)| kind.is_match())
            .map(|(_, count)| count)
            .sum()
    }

    /// Percentage of rows equal after normalization.
    pub fn exact_accuracy(&self) -> f64 {
        percent(self.count(MatchKind::Exact), self.total)
    }

    /// Percentage of rows that soft-match.
    pub fn soft_accuracy(&self) -> f64 {
        percent(self.soft_matches(), self.total)
    }

    /// Percentage of rows equal after trim + lower-case.
    pub fn strict_accuracy(&self) -> f64 {
        percent(self.strict_matches, self.total)
    }

    /// Percentage of predicted statements that parse.
    pub fn validity_rate(&self) -> f64 {
        percent(self.valid_sql, self.total)
    }

    /// Mean BLEU over all rows, `0.0` for an empty table.
    pub fn average_bleu(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.rows.iter().map(|r| r.bleu).sum::<f64>() / self.total as f64
    }

    /// Rows that do not soft-match.
    pub fn mismatches(&self) -> impl Iterator<Item = &RowResult> {
        self.rows.iter().filter(|r| !r.kind.is_match())
    }

    /// Whether the soft accuracy reaches `min_percent`.
    pub fn passes(&self, min_percent: f64) -> bool {
        self.soft_accuracy() >= min_percent
    }
}

/// Score one row.
pub fn score_row(index: usize, row: &EvaluationRow, dialect: SqlDialect) -> RowResult {
    RowResult {
        index,
        input: row.input.clone(),
        kind: classify(&row.predicted_sql, &row.expected_sql),
        strict: strict_match(&row.expected_sql, &row.predicted_sql),
        bleu: bleu(&row.expected_sql, &row.predicted_sql),
        valid_sql: is_valid(&row.predicted_sql, dialect)
    }
}

/// Score every row of a results table (parallel).
pub fn evaluate(rows: &[EvaluationRow], dialect: SqlDialect) -> EvaluationReport {
    let results: Vec<RowResult> = rows
        .par_iter()
        .enumerate()
        .map(|(index, row)| score_row(index, row, dialect))
        .collect();
    tracing::debug!("Scored {} rows", results.len());
    EvaluationReport::from_rows(results)
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

fn histogram_bin(score: f64) -> usize {
    let bin = (score.clamp(0.0, 1.0) * HISTOGRAM_BINS as f64) as usize;
    bin.min(HISTOGRAM_BINS - 1)
}
