//! Employment ledger contracts and SQLite implementation.
//!
//! # Responsibility
//! - Execute hire/terminate/transfer transitions.
//! - Answer history and as-of queries over employment intervals.
//!
//! # Invariants
//! - Every transition runs in one `BEGIN IMMEDIATE` transaction: the
//!   person's history is loaded, checked with
//!   `model::employment::check_open_interval`, and written under the same
//!   write lock, so two transitions on one person are serialized.
//! - Transfer closes the current record and opens the next one atomically;
//!   a failure between the two writes rolls both back.
//! - Records are never mutated in place except to set the end date.
//! - `department_id` is copied from the position at write time.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::directory_repo::{load_department, load_position, load_required_position};
use super::error::{ConflictReason, EntityRef, InvalidStateReason, RepoError, RepoResult};
use super::person_repo::{load_person, load_required_person};
use super::sql::{immediate_tx, parse_optional_uuid, parse_uuid};
use crate::model::directory::{DepartmentId, PositionId};
use crate::model::employment::{
    check_open_interval, Employment, EmploymentId, EmploymentOrigin, EndReason, HireConflict,
};
use crate::model::person::PersonId;
use crate::model::validation::{require_non_negative_salary, ValidationError};

const EMPLOYMENT_SELECT_SQL: &str = "SELECT
    id,
    person_id,
    position_id,
    department_id,
    start_date,
    end_date,
    salary,
    origin,
    end_reason,
    transferred_from,
    created_at,
    updated_at
FROM employments";

/// Input for the hire transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HireRequest {
    pub person_id: PersonId,
    pub position_id: PositionId,
    pub start_date: NaiveDate,
    pub salary: i64,
}

/// Input for the employee transfer transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub employment_id: EmploymentId,
    pub new_position_id: PositionId,
    pub effective_date: NaiveDate,
    /// Keeps the current salary when `None`.
    pub new_salary: Option<i64>,
}

/// Both records touched by a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub closed: Employment,
    pub opened: Employment,
}

/// Population selector for as-of employee queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmploymentScope {
    All,
    /// Matches the historical attribution, not the position's current owner.
    Department(DepartmentId),
    Position(PositionId),
}

/// Repository interface for the employment ledger.
pub trait EmploymentRepository {
    fn hire(&self, request: &HireRequest) -> RepoResult<Employment>;
    fn terminate(&self, id: EmploymentId, end_date: NaiveDate) -> RepoResult<Employment>;
    fn transfer(&self, request: &TransferRequest) -> RepoResult<TransferOutcome>;
    /// Administrative correction: removes one record.
    fn delete_employment(&self, id: EmploymentId) -> RepoResult<()>;
    fn get_employment(&self, id: EmploymentId) -> RepoResult<Option<Employment>>;
    /// Record whose interval contains `as_of`, if any.
    fn active_employment(
        &self,
        person_id: PersonId,
        as_of: NaiveDate,
    ) -> RepoResult<Option<Employment>>;
    /// All records of one person ordered by `start_date` ascending.
    fn history(&self, person_id: PersonId) -> RepoResult<Vec<Employment>>;
    fn employees_at(
        &self,
        scope: EmploymentScope,
        as_of: NaiveDate,
    ) -> RepoResult<Vec<Employment>>;
}

/// SQLite-backed employment ledger.
pub struct SqliteEmploymentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEmploymentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EmploymentRepository for SqliteEmploymentRepository<'_> {
    fn hire(&self, request: &HireRequest) -> RepoResult<Employment> {
        require_non_negative_salary(request.salary)?;

        let tx = immediate_tx(self.conn)?;
        load_required_person(&tx, request.person_id)?;
        let position = load_required_position(&tx, request.position_id)?;

        let history = load_history(&tx, request.person_id)?;
        check_open_interval(&history, request.start_date)
            .map_err(|conflict| hire_conflict(request.person_id, conflict))?;

        let id = Uuid::new_v4();
        tx.execute(
            "INSERT INTO employments (
                id,
                person_id,
                position_id,
                department_id,
                start_date,
                end_date,
                salary,
                origin,
                end_reason,
                transferred_from
            ) VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, 'hire', NULL, NULL);",
            params![
                id.to_string(),
                request.person_id.to_string(),
                position.id.to_string(),
                position.department_id.to_string(),
                request.start_date,
                request.salary,
            ],
        )?;
        let employment = load_required_employment(&tx, id)?;
        tx.commit()?;
        Ok(employment)
    }

    fn terminate(&self, id: EmploymentId, end_date: NaiveDate) -> RepoResult<Employment> {
        let tx = immediate_tx(self.conn)?;
        let current = load_required_employment(&tx, id)?;
        ensure_open(&current)?;
        if end_date < current.start_date {
            return Err(RepoError::Validation(ValidationError::EndBeforeStart {
                start: current.start_date,
                end: end_date,
            }));
        }

        close_employment(&tx, id, end_date, EndReason::Terminated)?;
        let employment = load_required_employment(&tx, id)?;
        tx.commit()?;
        Ok(employment)
    }

    fn transfer(&self, request: &TransferRequest) -> RepoResult<TransferOutcome> {
        if let Some(salary) = request.new_salary {
            require_non_negative_salary(salary)?;
        }

        let tx = immediate_tx(self.conn)?;
        let current = load_required_employment(&tx, request.employment_id)?;
        ensure_open(&current)?;
        if request.effective_date < current.start_date {
            return Err(RepoError::Validation(
                ValidationError::EffectiveBeforeStart {
                    start: current.start_date,
                    effective: request.effective_date,
                },
            ));
        }
        if request.new_position_id == current.position_id {
            return Err(RepoError::Validation(
                ValidationError::TransferToSamePosition(current.position_id),
            ));
        }
        let target = load_required_position(&tx, request.new_position_id)?;

        let history = load_history(&tx, current.person_id)?
            .into_iter()
            .map(|mut record| {
                if record.id == current.id {
                    record.end_date = Some(request.effective_date);
                }
                record
            })
            .collect::<Vec<_>>();
        check_open_interval(&history, request.effective_date)
            .map_err(|conflict| hire_conflict(current.person_id, conflict))?;

        close_employment(
            &tx,
            current.id,
            request.effective_date,
            EndReason::Transferred,
        )?;

        let opened_id = Uuid::new_v4();
        tx.execute(
            "INSERT INTO employments (
                id,
                person_id,
                position_id,
                department_id,
                start_date,
                end_date,
                salary,
                origin,
                end_reason,
                transferred_from
            ) VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, 'transfer', NULL, ?7);",
            params![
                opened_id.to_string(),
                current.person_id.to_string(),
                target.id.to_string(),
                target.department_id.to_string(),
                request.effective_date,
                request.new_salary.unwrap_or(current.salary),
                current.id.to_string(),
            ],
        )?;

        let outcome = TransferOutcome {
            closed: load_required_employment(&tx, current.id)?,
            opened: load_required_employment(&tx, opened_id)?,
        };
        tx.commit()?;
        Ok(outcome)
    }

    fn delete_employment(&self, id: EmploymentId) -> RepoResult<()> {
        let tx = immediate_tx(self.conn)?;
        load_required_employment(&tx, id)?;
        tx.execute(
            "UPDATE employments
             SET
                transferred_from = NULL,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE transferred_from = ?1;",
            [id.to_string()],
        )?;
        tx.execute("DELETE FROM employments WHERE id = ?1;", [id.to_string()])?;
        tx.commit()?;
        Ok(())
    }

    fn get_employment(&self, id: EmploymentId) -> RepoResult<Option<Employment>> {
        load_employment(self.conn, id)
    }

    fn active_employment(
        &self,
        person_id: PersonId,
        as_of: NaiveDate,
    ) -> RepoResult<Option<Employment>> {
        ensure_person_known(self.conn, person_id)?;
        let mut stmt = self.conn.prepare(&format!(
            "{EMPLOYMENT_SELECT_SQL}
             WHERE person_id = ?1
               AND start_date <= ?2
               AND (end_date IS NULL OR end_date > ?2)
             ORDER BY start_date ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query(params![person_id.to_string(), as_of])?;
        let mut matches = Vec::new();
        while let Some(row) = rows.next()? {
            matches.push(parse_employment_row(row)?);
        }
        if matches.len() > 1 {
            return Err(RepoError::InvalidData(format!(
                "person {person_id} has {} employments active on {as_of}",
                matches.len()
            )));
        }
        Ok(matches.pop())
    }

    fn history(&self, person_id: PersonId) -> RepoResult<Vec<Employment>> {
        ensure_person_known(self.conn, person_id)?;
        load_history(self.conn, person_id)
    }

    fn employees_at(
        &self,
        scope: EmploymentScope,
        as_of: NaiveDate,
    ) -> RepoResult<Vec<Employment>> {
        let (filter, scope_id) = match scope {
            EmploymentScope::All => ("1 = 1", None),
            EmploymentScope::Department(id) => {
                if load_department(self.conn, id, true)?.is_none() {
                    return Err(RepoError::NotFound(EntityRef::Department(id)));
                }
                ("department_id = ?2", Some(id.to_string()))
            }
            EmploymentScope::Position(id) => {
                if load_position(self.conn, id, true)?.is_none() {
                    return Err(RepoError::NotFound(EntityRef::Position(id)));
                }
                ("position_id = ?2", Some(id.to_string()))
            }
        };

        let mut stmt = self.conn.prepare(&format!(
            "{EMPLOYMENT_SELECT_SQL}
             WHERE start_date <= ?1
               AND (end_date IS NULL OR end_date > ?1)
               AND (?2 IS NULL OR {filter})
             ORDER BY start_date ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query(params![as_of, scope_id])?;
        let mut employments = Vec::new();
        while let Some(row) = rows.next()? {
            employments.push(parse_employment_row(row)?);
        }
        Ok(employments)
    }
}

fn hire_conflict(person_id: PersonId, conflict: HireConflict) -> RepoError {
    let reason = match conflict {
        HireConflict::OpenEmployment(employment_id) => ConflictReason::ActiveEmploymentExists {
            person_id,
            employment_id,
        },
        HireConflict::Overlap(employment_id) => ConflictReason::OverlappingEmployment {
            person_id,
            employment_id,
        },
    };
    RepoError::Conflict(reason)
}

fn ensure_open(employment: &Employment) -> RepoResult<()> {
    match employment.end_date {
        Some(end_date) => Err(RepoError::InvalidState(InvalidStateReason::AlreadyClosed {
            employment_id: employment.id,
            end_date,
        })),
        None => Ok(()),
    }
}

fn ensure_person_known(conn: &Connection, person_id: PersonId) -> RepoResult<()> {
    if load_person(conn, person_id, true)?.is_none() {
        return Err(RepoError::NotFound(EntityRef::Person(person_id)));
    }
    Ok(())
}

fn close_employment(
    conn: &Connection,
    id: EmploymentId,
    end_date: NaiveDate,
    reason: EndReason,
) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE employments
         SET
            end_date = ?2,
            end_reason = ?3,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1
           AND end_date IS NULL;",
        params![id.to_string(), end_date, end_reason_to_db(reason)],
    )?;
    if changed == 0 {
        return Err(RepoError::NotFound(EntityRef::Employment(id)));
    }
    Ok(())
}

pub(crate) fn load_employment(
    conn: &Connection,
    id: EmploymentId,
) -> RepoResult<Option<Employment>> {
    let mut stmt = conn.prepare(&format!("{EMPLOYMENT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_employment_row(row)?));
    }
    Ok(None)
}

fn load_required_employment(conn: &Connection, id: EmploymentId) -> RepoResult<Employment> {
    load_employment(conn, id)?.ok_or(RepoError::NotFound(EntityRef::Employment(id)))
}

pub(crate) fn load_history(conn: &Connection, person_id: PersonId) -> RepoResult<Vec<Employment>> {
    let mut stmt = conn.prepare(&format!(
        "{EMPLOYMENT_SELECT_SQL}
         WHERE person_id = ?1
         ORDER BY start_date ASC, rowid ASC;"
    ))?;
    let mut rows = stmt.query([person_id.to_string()])?;
    let mut history = Vec::new();
    while let Some(row) = rows.next()? {
        history.push(parse_employment_row(row)?);
    }
    Ok(history)
}

/// Loads every employment row, ordered by person then start date.
pub(crate) fn load_all_employments(conn: &Connection) -> RepoResult<Vec<Employment>> {
    let mut stmt = conn.prepare(&format!(
        "{EMPLOYMENT_SELECT_SQL} ORDER BY person_id ASC, start_date ASC, rowid ASC;"
    ))?;
    let mut rows = stmt.query([])?;
    let mut employments = Vec::new();
    while let Some(row) = rows.next()? {
        employments.push(parse_employment_row(row)?);
    }
    Ok(employments)
}

pub(crate) fn parse_employment_row(row: &Row<'_>) -> RepoResult<Employment> {
    let id_text: String = row.get("id")?;
    let person_text: String = row.get("person_id")?;
    let position_text: String = row.get("position_id")?;
    let department_text: String = row.get("department_id")?;

    let origin_text: String = row.get("origin")?;
    let origin = parse_origin(&origin_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid origin `{origin_text}` in employments.origin"
        ))
    })?;
    let end_reason = match row.get::<_, Option<String>>("end_reason")? {
        Some(value) => Some(parse_end_reason(&value).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid end reason `{value}` in employments.end_reason"
            ))
        })?),
        None => None,
    };

    let employment = Employment {
        id: parse_uuid(&id_text, "employments.id")?,
        person_id: parse_uuid(&person_text, "employments.person_id")?,
        position_id: parse_uuid(&position_text, "employments.position_id")?,
        department_id: parse_uuid(&department_text, "employments.department_id")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        salary: row.get("salary")?,
        origin,
        end_reason,
        transferred_from: parse_optional_uuid(
            row.get("transferred_from")?,
            "employments.transferred_from",
        )?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    employment
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("employment {}: {err}", employment.id)))?;
    Ok(employment)
}

fn parse_origin(value: &str) -> Option<EmploymentOrigin> {
    match value {
        "hire" => Some(EmploymentOrigin::Hire),
        "transfer" => Some(EmploymentOrigin::Transfer),
        _ => None,
    }
}

fn parse_end_reason(value: &str) -> Option<EndReason> {
    match value {
        "terminated" => Some(EndReason::Terminated),
        "transferred" => Some(EndReason::Transferred),
        _ => None,
    }
}

fn end_reason_to_db(reason: EndReason) -> &'static str {
    match reason {
        EndReason::Terminated => "terminated",
        EndReason::Transferred => "transferred",
    }
}
