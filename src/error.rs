//! Error types for query evaluation.

use std::fmt;

/// Broad category of a [`QueryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Path,
    Operator,
    Equator,
    MultiQuery,
    Date,
    Type,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Path => write!(f, "path"),
            ErrorKind::Operator => write!(f, "operator"),
            ErrorKind::Equator => write!(f, "equator"),
            ErrorKind::MultiQuery => write!(f, "multi query"),
            ErrorKind::Date => write!(f, "date"),
            ErrorKind::Type => write!(f, "type"),
        }
    }
}

/// A failed query. Every variant carries the full query text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    /// Missing key, sequence followed by a key, or no final result.
    #[error("Path error: {detail} (in {query})")]
    Path { detail: String, query: String },

    /// Unknown operator, or a malformed/missing argument.
    #[error("Operator error: {detail} (in {query})")]
    Operator { detail: String, query: String },

    /// A `filter(...)` expression without a recognised comparator.
    #[error("Equator error: no equator exists for {expression} (in {query})")]
    Equator { expression: String, query: String },

    /// A combinator item resolved to something other than a plain number.
    #[error(
        "Multi query error: only numbers can be returned for multiple query statements, {item} is not a number (in {query})"
    )]
    MultiQuery { item: String, query: String },

    /// Unparseable date or an unknown format token.
    #[error("Date error: {detail} (in {query})")]
    Date { detail: String, query: String },

    /// An operator applied to a value of the wrong type.
    #[error("Type error: {detail} (in {query})")]
    Type { detail: String, query: String },
}

impl QueryError {
    pub fn path(detail: impl Into<String>, query: &str) -> Self {
        QueryError::Path {
            detail: detail.into(),
            query: query.to_string(),
        }
    }

    pub fn operator(detail: impl Into<String>, query: &str) -> Self {
        QueryError::Operator {
            detail: detail.into(),
            query: query.to_string(),
        }
    }

    pub fn equator(expression: impl Into<String>, query: &str) -> Self {
        QueryError::Equator {
            expression: expression.into(),
            query: query.to_string(),
        }
    }

    pub fn multi_query(item: impl Into<String>, query: &str) -> Self {
        QueryError::MultiQuery {
            item: item.into(),
            query: query.to_string(),
        }
    }

    pub fn date(detail: impl Into<String>, query: &str) -> Self {
        QueryError::Date {
            detail: detail.into(),
            query: query.to_string(),
        }
    }

    pub fn type_error(detail: impl Into<String>, query: &str) -> Self {
        QueryError::Type {
            detail: detail.into(),
            query: query.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::Path { .. } => ErrorKind::Path,
            QueryError::Operator { .. } => ErrorKind::Operator,
            QueryError::Equator { .. } => ErrorKind::Equator,
            QueryError::MultiQuery { .. } => ErrorKind::MultiQuery,
            QueryError::Date { .. } => ErrorKind::Date,
            QueryError::Type { .. } => ErrorKind::Type,
        }
    }

    /// The full query text the error was raised for.
    pub fn query(&self) -> &str {
        match self {
            QueryError::Path { query, .. }
            | QueryError::Operator { query, .. }
            | QueryError::Equator { query, .. }
            | QueryError::MultiQuery { query, .. }
            | QueryError::Date { query, .. }
            | QueryError::Type { query, .. } => query,
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_embeds_query() {
        let err = QueryError::path("no object exists at incorrect", "incorrect.map(claims)");
        assert_eq!(
            err.to_string(),
            "Path error: no object exists at incorrect (in incorrect.map(claims))"
        );
        assert_eq!(err.kind(), ErrorKind::Path);
        assert_eq!(err.query(), "incorrect.map(claims)");
    }

    #[test]
    fn test_equator_message() {
        let err = QueryError::equator("code", "a.filter(code)");
        assert!(err.to_string().starts_with("Equator error: no equator exists for code"));
    }
}
