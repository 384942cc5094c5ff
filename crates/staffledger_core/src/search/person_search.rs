//! Person lookup by name fragments over the `persons_fts` index.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use super::{map_query_error, normalize_search_limit, prefix_match_expression, SearchResult};
use crate::model::person::Person;
use crate::repo::person_repo::parse_person_row;

#[derive(Debug, Clone, Default)]
pub struct PersonSearchQuery {
    /// Name fragments; each must prefix-match a first or last name.
    pub text: String,
    pub limit: Option<u32>,
}

impl PersonSearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: None,
        }
    }
}

/// Live persons whose names match every term, best match first.
///
/// Blank queries return an empty list.
pub fn search_persons(conn: &Connection, query: &PersonSearchQuery) -> SearchResult<Vec<Person>> {
    let Some(match_expr) = prefix_match_expression(&query.text) else {
        return Ok(Vec::new());
    };

    let sql = "SELECT
            persons.id AS id,
            persons.first_name AS first_name,
            persons.last_name AS last_name,
            persons.email AS email,
            persons.phone AS phone,
            persons.street AS street,
            persons.city AS city,
            persons.region AS region,
            persons.postal_code AS postal_code,
            persons.country AS country,
            persons.is_deleted AS is_deleted,
            persons.created_at AS created_at,
            persons.updated_at AS updated_at
         FROM persons_fts
         JOIN persons ON persons.rowid = persons_fts.rowid
         WHERE persons_fts MATCH ?
           AND persons.is_deleted = 0
         ORDER BY bm25(persons_fts),
                  persons.last_name COLLATE NOCASE ASC,
                  persons.first_name COLLATE NOCASE ASC,
                  persons.id ASC
         LIMIT ?";
    let bind_values = vec![
        Value::Text(match_expr.clone()),
        Value::Integer(i64::from(normalize_search_limit(query.limit))),
    ];

    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt
        .query(params_from_iter(bind_values))
        .map_err(|err| map_query_error(err, &match_expr))?;
    let mut persons = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|err| map_query_error(err, &match_expr))?
    {
        persons.push(parse_person_row(row)?);
    }
    Ok(persons)
}
