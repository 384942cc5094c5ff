//! Person registry contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `persons` storage.
//! - Enforce email uniqueness and the tombstone delete policy.
//!
//! # Invariants
//! - Write paths normalize input before SQL mutations.
//! - Tombstoned persons are hidden unless explicitly requested and can no
//!   longer be updated.
//! - Delete never removes a row that employment history references.

use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::error::{ConflictReason, EntityRef, RepoError, RepoResult};
use super::sql::{
    bool_to_int, exists, exists_as_of, immediate_tx, parse_flag, parse_uuid,
};
use crate::model::deletion::{DeleteMode, DeleteOutcome};
use crate::model::person::{Address, ContactUpdate, Person, PersonDraft, PersonId};

const PERSON_SELECT_SQL: &str = "SELECT
    id,
    first_name,
    last_name,
    email,
    phone,
    street,
    city,
    region,
    postal_code,
    country,
    is_deleted,
    created_at,
    updated_at
FROM persons";

/// Query options for listing persons.
#[derive(Debug, Clone, Default)]
pub struct PersonListQuery {
    pub include_deleted: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for person registry operations.
pub trait PersonRepository {
    fn create_person(&self, draft: &PersonDraft) -> RepoResult<Person>;
    fn get_person(&self, id: PersonId, include_deleted: bool) -> RepoResult<Option<Person>>;
    /// Exact match on the normalized (trimmed, lowercase) email.
    fn get_person_by_email(&self, email: &str) -> RepoResult<Option<Person>>;
    fn list_persons(&self, query: &PersonListQuery) -> RepoResult<Vec<Person>>;
    /// Replaces every mutable field.
    fn replace_person(&self, id: PersonId, draft: &PersonDraft) -> RepoResult<Person>;
    fn update_contact(&self, id: PersonId, update: &ContactUpdate) -> RepoResult<Person>;
    /// `None` clears the address.
    fn update_address(&self, id: PersonId, address: Option<&Address>) -> RepoResult<Person>;
    /// Blocked while any record is active at or after `as_of`, including a
    /// scheduled termination that has not taken effect yet.
    fn delete_person(
        &self,
        id: PersonId,
        mode: DeleteMode,
        as_of: NaiveDate,
    ) -> RepoResult<DeleteOutcome>;
}

/// SQLite-backed person repository.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn create_person(&self, draft: &PersonDraft) -> RepoResult<Person> {
        let draft = draft.normalized()?;
        let id = Uuid::new_v4();

        let tx = immediate_tx(self.conn)?;
        ensure_email_available(&tx, &draft.email, None)?;
        let address = draft.address.as_ref();
        tx.execute(
            "INSERT INTO persons (
                id,
                first_name,
                last_name,
                email,
                phone,
                street,
                city,
                region,
                postal_code,
                country
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                id.to_string(),
                draft.first_name,
                draft.last_name,
                draft.email,
                draft.phone,
                address.map(|value| value.street.as_str()),
                address.map(|value| value.city.as_str()),
                address.and_then(|value| value.region.as_deref()),
                address.and_then(|value| value.postal_code.as_deref()),
                address.map(|value| value.country.as_str()),
            ],
        )?;
        let person = load_required_person(&tx, id)?;
        tx.commit()?;
        Ok(person)
    }

    fn get_person(&self, id: PersonId, include_deleted: bool) -> RepoResult<Option<Person>> {
        load_person(self.conn, id, include_deleted)
    }

    fn get_person_by_email(&self, email: &str) -> RepoResult<Option<Person>> {
        let normalized = email.trim().to_lowercase();
        let mut stmt = self.conn.prepare(&format!(
            "{PERSON_SELECT_SQL}
             WHERE email = ?1
               AND is_deleted = 0;"
        ))?;
        let mut rows = stmt.query([normalized])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row)?));
        }
        Ok(None)
    }

    fn list_persons(&self, query: &PersonListQuery) -> RepoResult<Vec<Person>> {
        let mut sql = format!("{PERSON_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_deleted {
            sql.push_str(" AND is_deleted = 0");
        }

        sql.push_str(" ORDER BY last_name COLLATE NOCASE ASC, first_name COLLATE NOCASE ASC, id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut persons = Vec::new();
        while let Some(row) = rows.next()? {
            persons.push(parse_person_row(row)?);
        }
        Ok(persons)
    }

    fn replace_person(&self, id: PersonId, draft: &PersonDraft) -> RepoResult<Person> {
        let draft = draft.normalized()?;

        let tx = immediate_tx(self.conn)?;
        load_required_person(&tx, id)?;
        ensure_email_available(&tx, &draft.email, Some(id))?;
        let address = draft.address.as_ref();
        tx.execute(
            "UPDATE persons
             SET
                first_name = ?2,
                last_name = ?3,
                email = ?4,
                phone = ?5,
                street = ?6,
                city = ?7,
                region = ?8,
                postal_code = ?9,
                country = ?10,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND is_deleted = 0;",
            params![
                id.to_string(),
                draft.first_name,
                draft.last_name,
                draft.email,
                draft.phone,
                address.map(|value| value.street.as_str()),
                address.map(|value| value.city.as_str()),
                address.and_then(|value| value.region.as_deref()),
                address.and_then(|value| value.postal_code.as_deref()),
                address.map(|value| value.country.as_str()),
            ],
        )?;
        let person = load_required_person(&tx, id)?;
        tx.commit()?;
        Ok(person)
    }

    fn update_contact(&self, id: PersonId, update: &ContactUpdate) -> RepoResult<Person> {
        let tx = immediate_tx(self.conn)?;
        let current = load_required_person(&tx, id)?;
        let (email, phone) = update.apply_to(&current)?;
        ensure_email_available(&tx, &email, Some(id))?;
        tx.execute(
            "UPDATE persons
             SET
                email = ?2,
                phone = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND is_deleted = 0;",
            params![id.to_string(), email, phone],
        )?;
        let person = load_required_person(&tx, id)?;
        tx.commit()?;
        Ok(person)
    }

    fn update_address(&self, id: PersonId, address: Option<&Address>) -> RepoResult<Person> {
        let address = address.map(Address::normalized).transpose()?;
        let address = address.as_ref();

        let tx = immediate_tx(self.conn)?;
        load_required_person(&tx, id)?;
        tx.execute(
            "UPDATE persons
             SET
                street = ?2,
                city = ?3,
                region = ?4,
                postal_code = ?5,
                country = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND is_deleted = 0;",
            params![
                id.to_string(),
                address.map(|value| value.street.as_str()),
                address.map(|value| value.city.as_str()),
                address.and_then(|value| value.region.as_deref()),
                address.and_then(|value| value.postal_code.as_deref()),
                address.map(|value| value.country.as_str()),
            ],
        )?;
        let person = load_required_person(&tx, id)?;
        tx.commit()?;
        Ok(person)
    }

    fn delete_person(
        &self,
        id: PersonId,
        mode: DeleteMode,
        as_of: NaiveDate,
    ) -> RepoResult<DeleteOutcome> {
        let tx = immediate_tx(self.conn)?;
        load_required_person(&tx, id)?;
        let id_text = id.to_string();

        if exists_as_of(
            &tx,
            "SELECT EXISTS(
                SELECT 1 FROM employments
                WHERE person_id = ?1
                  AND (end_date IS NULL OR end_date > ?2)
            );",
            &id_text,
            as_of,
        )? {
            return Err(RepoError::Conflict(ConflictReason::OpenEmployment(
                EntityRef::Person(id),
            )));
        }

        let has_history = exists(
            &tx,
            "SELECT EXISTS(SELECT 1 FROM employments WHERE person_id = ?1);",
            &id_text,
        )?;
        let outcome = match (has_history, mode) {
            (true, DeleteMode::Block) => {
                return Err(RepoError::Conflict(ConflictReason::HasEmploymentHistory(
                    EntityRef::Person(id),
                )));
            }
            (true, DeleteMode::Cascade) => {
                tx.execute(
                    "UPDATE persons
                     SET
                        is_deleted = 1,
                        updated_at = (strftime('%s', 'now') * 1000)
                     WHERE id = ?1;",
                    [id_text.as_str()],
                )?;
                DeleteOutcome::Tombstoned
            }
            (false, _) => {
                tx.execute("DELETE FROM persons WHERE id = ?1;", [id_text.as_str()])?;
                DeleteOutcome::Removed
            }
        };

        tx.commit()?;
        Ok(outcome)
    }
}

/// Loads one person, optionally including tombstones.
pub(crate) fn load_person(
    conn: &Connection,
    id: PersonId,
    include_deleted: bool,
) -> RepoResult<Option<Person>> {
    let mut stmt = conn.prepare(&format!(
        "{PERSON_SELECT_SQL}
         WHERE id = ?1
           AND (?2 = 1 OR is_deleted = 0);"
    ))?;
    let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_person_row(row)?));
    }
    Ok(None)
}

/// Loads one live person or fails with `NotFound`.
pub(crate) fn load_required_person(conn: &Connection, id: PersonId) -> RepoResult<Person> {
    load_person(conn, id, false)?.ok_or(RepoError::NotFound(EntityRef::Person(id)))
}

fn ensure_email_available(
    conn: &Connection,
    email: &str,
    except: Option<PersonId>,
) -> RepoResult<()> {
    let owner: Option<String> = conn
        .query_row(
            "SELECT id FROM persons WHERE email = ?1;",
            [email],
            |row| row.get(0),
        )
        .optional()?;
    match owner {
        Some(owner) if except.map_or(true, |id| id.to_string() != owner) => Err(
            RepoError::Conflict(ConflictReason::DuplicateEmail(email.to_string())),
        ),
        _ => Ok(()),
    }
}

pub(crate) fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "persons.id")?;

    let address = match row.get::<_, Option<String>>("street")? {
        Some(street) => Some(Address {
            street,
            city: row.get::<_, Option<String>>("city")?.unwrap_or_default(),
            region: row.get("region")?,
            postal_code: row.get("postal_code")?,
            country: row.get::<_, Option<String>>("country")?.unwrap_or_default(),
        }),
        None => None,
    };

    Ok(Person {
        id,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        address,
        is_deleted: parse_flag(row.get("is_deleted")?, "persons.is_deleted")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
