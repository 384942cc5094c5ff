//! SQL helpers shared by the SQLite repositories.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use uuid::Uuid;

use super::error::{RepoError, RepoResult};

/// Opens a write transaction that takes the database write lock up front, so
/// reads inside it cannot be invalidated by a concurrent writer.
pub(crate) fn immediate_tx(conn: &Connection) -> RepoResult<Transaction<'_>> {
    Ok(Transaction::new_unchecked(
        conn,
        TransactionBehavior::Immediate,
    )?)
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_optional_uuid(
    value: Option<String>,
    column: &'static str,
) -> RepoResult<Option<Uuid>> {
    value.map(|text| parse_uuid(&text, column)).transpose()
}

pub(crate) fn parse_flag(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn exists(conn: &Connection, sql: &str, id: &str) -> RepoResult<bool> {
    let found: i64 = conn.query_row(sql, [id], |row| row.get(0))?;
    Ok(found == 1)
}

/// `exists` variant whose query takes the reference date as `?2`.
pub(crate) fn exists_as_of(
    conn: &Connection,
    sql: &str,
    id: &str,
    as_of: NaiveDate,
) -> RepoResult<bool> {
    let found: i64 = conn.query_row(sql, params![id, as_of], |row| row.get(0))?;
    Ok(found == 1)
}
