//! Filtered employee listing as of one date.
//!
//! # Invariants
//! - Each hit pairs a live person with the employment whose interval
//!   contains `as_of` (at most one per person).
//! - Department and position filters use historical attribution of that
//!   employment and imply it exists.

use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Transaction, TransactionBehavior};
use serde::Serialize;
use uuid::Uuid;

use super::{
    map_query_error, normalize_search_limit, prefix_match_expression, SearchError, SearchResult,
};
use crate::model::directory::{DepartmentId, PositionId};
use crate::model::employment::{DateRange, Employment};
use crate::model::person::Person;
use crate::model::validation::normalize_email;
use crate::repo::employment_repo::load_employment;
use crate::repo::person_repo::load_person;
use crate::repo::{EntityRef, RepoError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeFilter {
    /// Name fragments, prefix-matched like `search_persons`.
    pub name: Option<String>,
    /// Exact email, normalized before comparison.
    pub email: Option<String>,
    pub department_id: Option<DepartmentId>,
    pub position_id: Option<PositionId>,
    /// Only persons with an employment active on `as_of`.
    pub active_only: bool,
    /// Persons with a hire whose start date falls in the range.
    pub hired_between: Option<DateRange>,
    pub as_of: NaiveDate,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl EmployeeFilter {
    /// Unfiltered listing of live persons as of `as_of`.
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            name: None,
            email: None,
            department_id: None,
            position_id: None,
            active_only: false,
            hired_between: None,
            as_of,
            limit: None,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeHit {
    pub person: Person,
    /// Employment active on the filter's `as_of`, if any.
    pub employment: Option<Employment>,
}

/// Runs an employee filter inside one read transaction.
///
/// Ordered by last name, first name, then person id.
pub fn search_employees(conn: &Connection, filter: &EmployeeFilter) -> SearchResult<Vec<EmployeeHit>> {
    let mut sql = String::from(
        "SELECT p.id AS person_id, e.id AS employment_id
         FROM persons p
         LEFT JOIN employments e
           ON e.person_id = p.id
          AND e.start_date <= ?
          AND (e.end_date IS NULL OR e.end_date > ?)
         WHERE p.is_deleted = 0",
    );
    let as_of = Value::Text(filter.as_of.to_string());
    let mut bind_values: Vec<Value> = vec![as_of.clone(), as_of];

    let match_expr = filter.name.as_deref().and_then(prefix_match_expression);
    if let Some(expr) = &match_expr {
        sql.push_str(" AND p.rowid IN (SELECT rowid FROM persons_fts WHERE persons_fts MATCH ?)");
        bind_values.push(Value::Text(expr.clone()));
    }
    if let Some(email) = &filter.email {
        sql.push_str(" AND p.email = ?");
        bind_values.push(Value::Text(normalize_email(email)?));
    }
    if let Some(department_id) = filter.department_id {
        sql.push_str(" AND e.department_id = ?");
        bind_values.push(Value::Text(department_id.to_string()));
    }
    if let Some(position_id) = filter.position_id {
        sql.push_str(" AND e.position_id = ?");
        bind_values.push(Value::Text(position_id.to_string()));
    }
    if filter.active_only {
        sql.push_str(" AND e.id IS NOT NULL");
    }
    if let Some(range) = filter.hired_between {
        sql.push_str(
            " AND EXISTS (
                SELECT 1 FROM employments h
                WHERE h.person_id = p.id
                  AND h.origin = 'hire'
                  AND h.start_date >= ?
                  AND h.start_date <= ?
              )",
        );
        bind_values.push(Value::Text(range.from.to_string()));
        bind_values.push(Value::Text(range.to.to_string()));
    }

    sql.push_str(
        " ORDER BY p.last_name COLLATE NOCASE ASC, p.first_name COLLATE NOCASE ASC, p.id ASC
          LIMIT ? OFFSET ?",
    );
    bind_values.push(Value::Integer(i64::from(normalize_search_limit(filter.limit))));
    bind_values.push(Value::Integer(i64::from(filter.offset)));

    let query_text = match_expr.unwrap_or_default();
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Deferred)?;
    let mut keys = Vec::new();
    {
        let mut stmt = tx.prepare(&sql)?;
        let mut rows = stmt
            .query(params_from_iter(bind_values))
            .map_err(|err| map_query_error(err, &query_text))?;
        while let Some(row) = rows
            .next()
            .map_err(|err| map_query_error(err, &query_text))?
        {
            let person_id: String = row.get("person_id")?;
            let employment_id: Option<String> = row.get("employment_id")?;
            keys.push((person_id, employment_id));
        }
    }

    let mut hits = Vec::with_capacity(keys.len());
    for (person_text, employment_text) in keys {
        hits.push(load_hit(&tx, &person_text, employment_text.as_deref())?);
    }
    tx.commit()?;
    Ok(hits)
}

fn load_hit(
    conn: &Connection,
    person_text: &str,
    employment_text: Option<&str>,
) -> SearchResult<EmployeeHit> {
    let person_id = parse_id(person_text)?;
    let person = load_person(conn, person_id, true)?
        .ok_or(RepoError::NotFound(EntityRef::Person(person_id)))?;
    let employment = match employment_text {
        Some(text) => {
            let employment_id = parse_id(text)?;
            Some(
                load_employment(conn, employment_id)?
                    .ok_or(RepoError::NotFound(EntityRef::Employment(employment_id)))?,
            )
        }
        None => None,
    };
    Ok(EmployeeHit { person, employment })
}

fn parse_id(value: &str) -> Result<Uuid, SearchError> {
    Uuid::parse_str(value)
        .map_err(|_| SearchError::Repo(RepoError::InvalidData(format!("invalid uuid `{value}`"))))
}
