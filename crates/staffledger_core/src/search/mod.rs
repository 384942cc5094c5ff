//! Query/search facade over the registry and the ledger.
//!
//! # Responsibility
//! - Translate filter criteria into registry and ledger lookups.
//! - Keep FTS5 match-expression building inside core.
//!
//! # Invariants
//! - Tombstoned persons are never returned.
//! - Result ordering is deterministic.

pub mod employee_search;
pub mod person_search;

pub use employee_search::{search_employees, EmployeeFilter, EmployeeHit};
pub use person_search::{search_persons, PersonSearchQuery};

use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::model::validation::ValidationError;
use crate::repo::{ErrorKind, RepoError};

/// Default number of rows returned by search and list APIs.
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
/// Upper bound for caller-supplied limits.
pub const MAX_SEARCH_LIMIT: u32 = 100;

pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error for query parsing and storage failures.
#[derive(Debug)]
pub enum SearchError {
    /// Query text rejected by the FTS5 parser.
    InvalidQuery {
        query: String,
        message: String,
    },
    Repo(RepoError),
}

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidQuery { .. } => ErrorKind::InvalidArgument,
            Self::Repo(err) => err.kind(),
        }
    }
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuery { query, message } => {
                write!(f, "invalid full-text query `{query}`: {message}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidQuery { .. } => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for SearchError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ValidationError> for SearchError {
    fn from(value: ValidationError) -> Self {
        Self::Repo(RepoError::Validation(value))
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

/// Clamps a caller-supplied limit into `1..=MAX_SEARCH_LIMIT`.
pub fn normalize_search_limit(limit: Option<u32>) -> u32 {
    match limit {
        None | Some(0) => DEFAULT_SEARCH_LIMIT,
        Some(value) => value.min(MAX_SEARCH_LIMIT),
    }
}

/// Builds an FTS5 expression matching every whitespace-separated term as a
/// prefix. Returns `None` for blank input.
pub(crate) fn prefix_match_expression(text: &str) -> Option<String> {
    let terms = text
        .split_whitespace()
        .map(|term| format!("\"{}\"*", term.replace('"', "\"\"")))
        .collect::<Vec<_>>();
    (!terms.is_empty()).then(|| terms.join(" AND "))
}

pub(crate) fn map_query_error(err: rusqlite::Error, query: &str) -> SearchError {
    if is_match_syntax_error(&err) {
        return SearchError::InvalidQuery {
            query: query.to_string(),
            message: err.to_string(),
        };
    }
    SearchError::from(err)
}

fn is_match_syntax_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            let msg = message.to_lowercase();
            (msg.contains("fts5") && msg.contains("syntax"))
                || msg.contains("malformed match expression")
                || msg.contains("unterminated")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_search_limit, prefix_match_expression, MAX_SEARCH_LIMIT};

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(normalize_search_limit(None), 20);
        assert_eq!(normalize_search_limit(Some(0)), 20);
        assert_eq!(normalize_search_limit(Some(5)), 5);
        assert_eq!(normalize_search_limit(Some(1_000)), MAX_SEARCH_LIMIT);
    }

    #[test]
    fn prefix_expression_quotes_terms() {
        assert_eq!(prefix_match_expression("   "), None);
        assert_eq!(
            prefix_match_expression("ada lov\"e"),
            Some("\"ada\"* AND \"lov\"\"e\"*".to_string())
        );
    }
}
