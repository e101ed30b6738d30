//! Syntax checks for generated SQL.
//!
//! A generated statement may be equivalent to nothing at all because it does
//! not parse. The evaluation report counts such statements and the
//! interaction log records the outcome in its `sql_valid` column.

use sqlparser::{
    dialect::{
        ClickHouseDialect, Dialect, GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect
    },
    parser::Parser
};

use crate::error::{AppResult, query_parse_error};

/// SQL dialect for parsing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum SqlDialect {
    #[default]
    Generic,
    MySQL,
    PostgreSQL,
    SQLite,
    ClickHouse
}

impl SqlDialect {
    /// Convert to sqlparser dialect for parsing
    pub fn into_parser_dialect(self) -> Box<dyn Dialect> {
        match self {
            Self::Generic => Box::new(GenericDialect {}),
            Self::MySQL => Box::new(MySqlDialect {}),
            Self::PostgreSQL => Box::new(PostgreSqlDialect {}),
            Self::SQLite => Box::new(SQLiteDialect {}),
            Self::ClickHouse => Box::new(ClickHouseDialect {})
        }
    }
}

/// Parse `sql` and return the parser's message for the first syntax error.
///
/// A blank statement is an error: a model that produced nothing did not
/// produce valid SQL.
pub fn syntax_error(sql: &str, dialect: SqlDialect) -> Option<String> {
    let parser_dialect = dialect.into_parser_dialect();
    match Parser::parse_sql(parser_dialect.as_ref(), sql) {
        Ok(statements) if statements.is_empty() => Some(String::from("Empty statement")),
        Ok(_) => None,
        Err(e) => Some(e.to_string())
    }
}

/// Parse `sql`, failing with a positioned parse error.
pub fn check_syntax(sql: &str, dialect: SqlDialect) -> AppResult<()> {
    match syntax_error(sql, dialect) {
        Some(message) => Err(query_parse_error(message)),
        None => Ok(())
    }
}

/// Whether `sql` parses in the given dialect.
pub fn is_valid(sql: &str, dialect: SqlDialect) -> bool {
    syntax_error(sql, dialect).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_select() {
        assert!(is_valid(
            "SELECT ФИО, должность FROM Сотрудники WHERE подразделение = 'Институт химии';",
            SqlDialect::Generic
        ));
    }

    #[test]
    fn test_blank_is_invalid() {
        assert!(!is_valid("   ", SqlDialect::Generic));
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert!(!is_valid("SELECT * FROM", SqlDialect::SQLite));
    }

    #[test]
    fn test_blank_reports_empty_statement() {
        assert_eq!(
            syntax_error("", SqlDialect::Generic).as_deref(),
            Some("Empty statement")
        );
    }

    #[test]
    fn test_check_syntax_rejects_typo() {
        assert!(check_syntax("SELEC * FROM t", SqlDialect::Generic).is_err());
        assert!(check_syntax("SELECT id FROM t", SqlDialect::PostgreSQL).is_ok());
    }
}
