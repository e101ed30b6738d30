//! Soft equivalence of SQL statements.
//!
//! Generated statements rarely match their references byte for byte. This
//! module decides whether two statements are equivalent up to incidental
//! formatting and the order of commutative clauses:
//!
//! 1. **Exact** - equal after [`normalize`] (case, whitespace, trailing `;`)
//! 2. **SELECT reordering** - equal after [`sort_select_fields`]
//! 3. **WHERE reordering** - equal after [`sort_where_conditions`]
//!
//! The clause recognizers are single-shot structural matches over a small
//! dialect subset, not a SQL parser. Anything they do not recognize passes
//! through unchanged, so every comparison degrades to plain string equality
//! and no input can make it fail.
//!
//! Field and predicate lists are sorted as raw trimmed substrings in codepoint
//! order. Spacing around operators is therefore significant: `x = 1` and
//! `x=1` are different predicates.
//!
//! # Example
//!
//! ```
//! use nl2sql_eval::matcher::{MatchKind, classify, compare_soft};
//!
//! assert!(compare_soft("SELECT a, b FROM t;", "select b, a from t"));
//! assert_eq!(
//!     classify(
//!         "SELECT * FROM t WHERE x = 1 AND y = 2",
//!         "SELECT * FROM t WHERE y = 2 AND x = 1"
//!     ),
//!     MatchKind::WhereReordered
//! );
//! ```

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::Serialize;
use smallvec::SmallVec;

/// `select <fields> from <rest>`, fields being the shortest run before the
/// first ` from `.
static SELECT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(select )(.+?)( from .+)").expect("valid regex"));

/// `<prefix> where <rest>`, split at the first ` where `.
static WHERE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+? where )(.+)").expect("valid regex"));

const ORDER_BY: &str = " order by ";
const AND: &str = " and ";

/// Outcome of comparing a candidate statement with a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Equal after normalization
    Exact,
    /// Equal once SELECT fields are sorted
    SelectReordered,
    /// Equal once WHERE predicates are sorted as well
    WhereReordered,
    /// Not equivalent under any relaxation
    Mismatch
}

impl MatchKind {
    /// All kinds in cascade order.
    pub const ALL: [MatchKind; 4] = [
        Self::Exact,
        Self::SelectReordered,
        Self::WhereReordered,
        Self::Mismatch
    ];

    /// Whether this outcome counts as a soft match.
    pub fn is_match(self) -> bool {
        !matches!(self, Self::Mismatch)
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::SelectReordered => write!(f, "select-reordered"),
            Self::WhereReordered => write!(f, "where-reordered"),
            Self::Mismatch => write!(f, "mismatch")
        }
    }
}

/// Lower-case, collapse whitespace runs and strip the trailing terminator.
///
/// Every trailing `;` is removed together with any whitespace between
/// terminators, which keeps the function idempotent.
pub fn normalize(sql: &str) -> String {
    let lowered = sql.to_lowercase();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_end_matches(|c: char| c == ';' || c.is_whitespace())
        .trim()
        .to_string()
}

/// Compare two statements after [`normalize`].
pub fn compare_exact(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Sort the projection list of a `select ... from ...` statement.
///
/// Returns the input unchanged when the statement does not start with a
/// SELECT list followed by FROM.
pub fn sort_select_fields(sql: &str) -> String {
    let Some(caps) = SELECT_REGEX.captures(sql) else {
        return sql.to_string();
    };
    let mut fields: SmallVec<[&str; 8]> = caps[2].split(',').map(str::trim).collect();
    fields.sort_unstable();
    format!("{}{}{}", &caps[1], fields.join(", "), &caps[3])
}

/// Sort the AND-joined predicates of the WHERE clause.
///
/// An ORDER BY tail is kept verbatim after the sorted predicates. The `and`
/// delimiter is matched in lower case, so the input should already be
/// normalized.
pub fn sort_where_conditions(sql: &str) -> String {
    let Some(caps) = WHERE_REGEX.captures(sql) else {
        return sql.to_string();
    };
    let rest = &caps[2];
    let (predicates, order) = match rest.split_once(ORDER_BY) {
        Some((predicates, tail)) => (predicates, format!("{ORDER_BY}{tail}")),
        None => (rest, String::new())
    };
    let mut conditions: SmallVec<[&str; 8]> = predicates.split(AND).map(str::trim).collect();
    conditions.sort_unstable();
    format!("{}{}{}", &caps[1], conditions.join(AND), order)
}

/// Canonical form: normalized, SELECT fields sorted, WHERE predicates sorted.
pub fn canonicalize(sql: &str) -> String {
    sort_where_conditions(&sort_select_fields(&normalize(sql)))
}

/// Run the comparison cascade and report which stage matched.
pub fn classify(a: &str, b: &str) -> MatchKind {
    let a = normalize(a);
    let b = normalize(b);
    if a == b {
        return MatchKind::Exact;
    }
    let a = sort_select_fields(&a);
    let b = sort_select_fields(&b);
    if a == b {
        return MatchKind::SelectReordered;
    }
    if sort_where_conditions(&a) == sort_where_conditions(&b) {
        MatchKind::WhereReordered
    } else {
        MatchKind::Mismatch
    }
}

/// Soft equivalence: exact, or equal after reordering SELECT fields and
/// WHERE predicates.
pub fn compare_soft(a: &str, b: &str) -> bool {
    classify(a, b).is_match()
}
