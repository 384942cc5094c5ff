//! Directory repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs for departments and positions.
//! - Own position-to-department reassignment.
//! - Apply the block/cascade delete policy inside one transaction.
//!
//! # Invariants
//! - Live department names are unique, case-insensitive.
//! - A position can only be created in, or moved to, a live department.
//! - Reassignment never touches `employments.department_id`.
//! - Referenced rows are tombstoned, unreferenced rows are removed.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::error::{ConflictReason, EntityRef, RepoError, RepoResult};
use super::sql::{
    bool_to_int, exists, exists_as_of, immediate_tx, parse_flag, parse_uuid,
};
use crate::model::deletion::{DeleteMode, DeleteOutcome};
use crate::model::directory::{
    Department, DepartmentDraft, DepartmentId, Position, PositionDetails, PositionId,
};

const DEPARTMENT_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    is_deleted,
    created_at,
    updated_at
FROM departments";

const POSITION_SELECT_SQL: &str = "SELECT
    id,
    department_id,
    title,
    description,
    is_deleted,
    created_at,
    updated_at
FROM positions";

/// Repository interface for directory reference data.
pub trait DirectoryRepository {
    fn create_department(&self, draft: &DepartmentDraft) -> RepoResult<Department>;
    fn get_department(
        &self,
        id: DepartmentId,
        include_deleted: bool,
    ) -> RepoResult<Option<Department>>;
    fn list_departments(&self, include_deleted: bool) -> RepoResult<Vec<Department>>;
    fn update_department(&self, id: DepartmentId, draft: &DepartmentDraft)
        -> RepoResult<Department>;
    fn delete_department(
        &self,
        id: DepartmentId,
        mode: DeleteMode,
        as_of: NaiveDate,
    ) -> RepoResult<DeleteOutcome>;

    fn create_position(
        &self,
        department_id: DepartmentId,
        details: &PositionDetails,
    ) -> RepoResult<Position>;
    fn get_position(&self, id: PositionId, include_deleted: bool) -> RepoResult<Option<Position>>;
    /// Lists positions, optionally restricted to one current department.
    fn list_positions(
        &self,
        department_id: Option<DepartmentId>,
        include_deleted: bool,
    ) -> RepoResult<Vec<Position>>;
    fn update_position(&self, id: PositionId, details: &PositionDetails) -> RepoResult<Position>;
    /// Moves a position to another department going forward.
    fn reassign_position_department(
        &self,
        id: PositionId,
        department_id: DepartmentId,
    ) -> RepoResult<Position>;
    /// Blocked while any record on the position is active at or after `as_of`.
    fn delete_position(
        &self,
        id: PositionId,
        mode: DeleteMode,
        as_of: NaiveDate,
    ) -> RepoResult<DeleteOutcome>;
}

/// SQLite-backed directory repository.
pub struct SqliteDirectoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDirectoryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl DirectoryRepository for SqliteDirectoryRepository<'_> {
    fn create_department(&self, draft: &DepartmentDraft) -> RepoResult<Department> {
        let draft = draft.normalized()?;
        let id = Uuid::new_v4();

        let tx = immediate_tx(self.conn)?;
        ensure_department_name_available(&tx, &draft.name, None)?;
        tx.execute(
            "INSERT INTO departments (id, name, description) VALUES (?1, ?2, ?3);",
            params![id.to_string(), draft.name, draft.description],
        )?;
        let department = load_required_department(&tx, id)?;
        tx.commit()?;
        Ok(department)
    }

    fn get_department(
        &self,
        id: DepartmentId,
        include_deleted: bool,
    ) -> RepoResult<Option<Department>> {
        load_department(self.conn, id, include_deleted)
    }

    fn list_departments(&self, include_deleted: bool) -> RepoResult<Vec<Department>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DEPARTMENT_SELECT_SQL}
             WHERE (?1 = 1 OR is_deleted = 0)
             ORDER BY name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([bool_to_int(include_deleted)])?;
        let mut departments = Vec::new();
        while let Some(row) = rows.next()? {
            departments.push(parse_department_row(row)?);
        }
        Ok(departments)
    }

    fn update_department(
        &self,
        id: DepartmentId,
        draft: &DepartmentDraft,
    ) -> RepoResult<Department> {
        let draft = draft.normalized()?;

        let tx = immediate_tx(self.conn)?;
        load_required_department(&tx, id)?;
        ensure_department_name_available(&tx, &draft.name, Some(id))?;
        tx.execute(
            "UPDATE departments
             SET
                name = ?2,
                description = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND is_deleted = 0;",
            params![id.to_string(), draft.name, draft.description],
        )?;
        let department = load_required_department(&tx, id)?;
        tx.commit()?;
        Ok(department)
    }

    fn delete_department(
        &self,
        id: DepartmentId,
        mode: DeleteMode,
        as_of: NaiveDate,
    ) -> RepoResult<DeleteOutcome> {
        let tx = immediate_tx(self.conn)?;
        load_required_department(&tx, id)?;

        let live_positions = list_positions_in(&tx, Some(id), false)?;
        if mode == DeleteMode::Block && !live_positions.is_empty() {
            return Err(RepoError::Conflict(ConflictReason::DepartmentHasPositions(
                id,
            )));
        }
        for position in &live_positions {
            delete_position_in_tx(&tx, position.id, DeleteMode::Cascade, as_of)?;
        }

        let id_text = id.to_string();
        let referenced = exists(
            &tx,
            "SELECT EXISTS(SELECT 1 FROM positions WHERE department_id = ?1)
                 OR EXISTS(SELECT 1 FROM employments WHERE department_id = ?1);",
            &id_text,
        )?;
        let outcome = match (referenced, mode) {
            (true, DeleteMode::Block) => {
                return Err(RepoError::Conflict(ConflictReason::HasEmploymentHistory(
                    EntityRef::Department(id),
                )));
            }
            (true, DeleteMode::Cascade) => {
                tx.execute(
                    "UPDATE departments
                     SET
                        is_deleted = 1,
                        updated_at = (strftime('%s', 'now') * 1000)
                     WHERE id = ?1;",
                    [id_text.as_str()],
                )?;
                DeleteOutcome::Tombstoned
            }
            (false, _) => {
                tx.execute("DELETE FROM departments WHERE id = ?1;", [id_text.as_str()])?;
                DeleteOutcome::Removed
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn create_position(
        &self,
        department_id: DepartmentId,
        details: &PositionDetails,
    ) -> RepoResult<Position> {
        let details = details.normalized()?;
        let id = Uuid::new_v4();

        let tx = immediate_tx(self.conn)?;
        load_required_department(&tx, department_id)?;
        tx.execute(
            "INSERT INTO positions (id, department_id, title, description)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                id.to_string(),
                department_id.to_string(),
                details.title,
                details.description,
            ],
        )?;
        let position = load_required_position(&tx, id)?;
        tx.commit()?;
        Ok(position)
    }

    fn get_position(&self, id: PositionId, include_deleted: bool) -> RepoResult<Option<Position>> {
        load_position(self.conn, id, include_deleted)
    }

    fn list_positions(
        &self,
        department_id: Option<DepartmentId>,
        include_deleted: bool,
    ) -> RepoResult<Vec<Position>> {
        list_positions_in(self.conn, department_id, include_deleted)
    }

    fn update_position(&self, id: PositionId, details: &PositionDetails) -> RepoResult<Position> {
        let details = details.normalized()?;

        let tx = immediate_tx(self.conn)?;
        load_required_position(&tx, id)?;
        tx.execute(
            "UPDATE positions
             SET
                title = ?2,
                description = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND is_deleted = 0;",
            params![id.to_string(), details.title, details.description],
        )?;
        let position = load_required_position(&tx, id)?;
        tx.commit()?;
        Ok(position)
    }

    fn reassign_position_department(
        &self,
        id: PositionId,
        department_id: DepartmentId,
    ) -> RepoResult<Position> {
        let tx = immediate_tx(self.conn)?;
        let current = load_required_position(&tx, id)?;
        load_required_department(&tx, department_id)?;
        if current.department_id == department_id {
            return Ok(current);
        }

        tx.execute(
            "UPDATE positions
             SET
                department_id = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND is_deleted = 0;",
            params![id.to_string(), department_id.to_string()],
        )?;
        let position = load_required_position(&tx, id)?;
        tx.commit()?;
        Ok(position)
    }

    fn delete_position(
        &self,
        id: PositionId,
        mode: DeleteMode,
        as_of: NaiveDate,
    ) -> RepoResult<DeleteOutcome> {
        let tx = immediate_tx(self.conn)?;
        let outcome = delete_position_in_tx(&tx, id, mode, as_of)?;
        tx.commit()?;
        Ok(outcome)
    }
}

fn delete_position_in_tx(
    conn: &Connection,
    id: PositionId,
    mode: DeleteMode,
    as_of: NaiveDate,
) -> RepoResult<DeleteOutcome> {
    load_required_position(conn, id)?;
    let id_text = id.to_string();

    if exists_as_of(
        conn,
        "SELECT EXISTS(
            SELECT 1 FROM employments
            WHERE position_id = ?1
              AND (end_date IS NULL OR end_date > ?2)
        );",
        &id_text,
        as_of,
    )? {
        return Err(RepoError::Conflict(ConflictReason::OpenEmployment(
            EntityRef::Position(id),
        )));
    }

    let has_history = exists(
        conn,
        "SELECT EXISTS(SELECT 1 FROM employments WHERE position_id = ?1);",
        &id_text,
    )?;
    match (has_history, mode) {
        (true, DeleteMode::Block) => Err(RepoError::Conflict(
            ConflictReason::HasEmploymentHistory(EntityRef::Position(id)),
        )),
        (true, DeleteMode::Cascade) => {
            conn.execute(
                "UPDATE positions
                 SET
                    is_deleted = 1,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                [id_text.as_str()],
            )?;
            Ok(DeleteOutcome::Tombstoned)
        }
        (false, _) => {
            conn.execute("DELETE FROM positions WHERE id = ?1;", [id_text.as_str()])?;
            Ok(DeleteOutcome::Removed)
        }
    }
}

fn ensure_department_name_available(
    conn: &Connection,
    name: &str,
    except: Option<DepartmentId>,
) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "SELECT id
         FROM departments
         WHERE name = ?1 COLLATE NOCASE
           AND is_deleted = 0;",
    )?;
    let mut rows = stmt.query([name])?;
    while let Some(row) = rows.next()? {
        let owner_text: String = row.get(0)?;
        let owner = parse_uuid(&owner_text, "departments.id")?;
        if Some(owner) != except {
            return Err(RepoError::Conflict(
                ConflictReason::DuplicateDepartmentName(name.to_string()),
            ));
        }
    }
    Ok(())
}

pub(crate) fn load_department(
    conn: &Connection,
    id: DepartmentId,
    include_deleted: bool,
) -> RepoResult<Option<Department>> {
    let mut stmt = conn.prepare(&format!(
        "{DEPARTMENT_SELECT_SQL}
         WHERE id = ?1
           AND (?2 = 1 OR is_deleted = 0);"
    ))?;
    let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_department_row(row)?));
    }
    Ok(None)
}

pub(crate) fn load_required_department(
    conn: &Connection,
    id: DepartmentId,
) -> RepoResult<Department> {
    load_department(conn, id, false)?.ok_or(RepoError::NotFound(EntityRef::Department(id)))
}

pub(crate) fn load_position(
    conn: &Connection,
    id: PositionId,
    include_deleted: bool,
) -> RepoResult<Option<Position>> {
    let mut stmt = conn.prepare(&format!(
        "{POSITION_SELECT_SQL}
         WHERE id = ?1
           AND (?2 = 1 OR is_deleted = 0);"
    ))?;
    let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_position_row(row)?));
    }
    Ok(None)
}

pub(crate) fn load_required_position(conn: &Connection, id: PositionId) -> RepoResult<Position> {
    load_position(conn, id, false)?.ok_or(RepoError::NotFound(EntityRef::Position(id)))
}

pub(crate) fn list_positions_in(
    conn: &Connection,
    department_id: Option<DepartmentId>,
    include_deleted: bool,
) -> RepoResult<Vec<Position>> {
    let mut stmt = conn.prepare(&format!(
        "{POSITION_SELECT_SQL}
         WHERE (?1 IS NULL OR department_id = ?1)
           AND (?2 = 1 OR is_deleted = 0)
         ORDER BY title COLLATE NOCASE ASC, id ASC;"
    ))?;
    let mut rows = stmt.query(params![
        department_id.map(|id| id.to_string()),
        bool_to_int(include_deleted),
    ])?;
    let mut positions = Vec::new();
    while let Some(row) = rows.next()? {
        positions.push(parse_position_row(row)?);
    }
    Ok(positions)
}

fn parse_department_row(row: &Row<'_>) -> RepoResult<Department> {
    let id_text: String = row.get("id")?;
    Ok(Department {
        id: parse_uuid(&id_text, "departments.id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        is_deleted: parse_flag(row.get("is_deleted")?, "departments.is_deleted")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_position_row(row: &Row<'_>) -> RepoResult<Position> {
    let id_text: String = row.get("id")?;
    let department_text: String = row.get("department_id")?;
    Ok(Position {
        id: parse_uuid(&id_text, "positions.id")?,
        department_id: parse_uuid(&department_text, "positions.department_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        is_deleted: parse_flag(row.get("is_deleted")?, "positions.is_deleted")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
