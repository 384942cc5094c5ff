//! Repository error type and its caller-facing classification.

use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::db::DbError;
use crate::model::directory::{DepartmentId, PositionId};
use crate::model::employment::EmploymentId;
use crate::model::person::PersonId;
use crate::model::validation::ValidationError;

pub type RepoResult<T> = Result<T, RepoError>;

/// Caller-facing error classification.
///
/// API collaborators translate these to their own status vocabulary; the
/// kinds must stay distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidArgument,
    InvalidState,
    Unavailable,
    /// Storage failure or corrupt persisted data.
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::InvalidArgument => "invalid_argument",
            Self::InvalidState => "invalid_state",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
        }
    }
}

/// Reference to a stored entity, used in not-found and conflict reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Person(PersonId),
    Department(DepartmentId),
    Position(PositionId),
    Employment(EmploymentId),
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Person(id) => write!(f, "person {id}"),
            Self::Department(id) => write!(f, "department {id}"),
            Self::Position(id) => write!(f, "position {id}"),
            Self::Employment(id) => write!(f, "employment {id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
    DuplicateEmail(String),
    DuplicateDepartmentName(String),
    /// Person already holds an open-ended employment.
    ActiveEmploymentExists {
        person_id: PersonId,
        employment_id: EmploymentId,
    },
    /// Requested interval overlaps an existing record of the person.
    OverlappingEmployment {
        person_id: PersonId,
        employment_id: EmploymentId,
    },
    /// Department still owns live positions.
    DepartmentHasPositions(DepartmentId),
    /// Delete without cascade on an entity that history references.
    HasEmploymentHistory(EntityRef),
    /// Delete of an entity an open employment still points at.
    OpenEmployment(EntityRef),
    /// A storage constraint rejected the write.
    Constraint(String),
}

impl Display for ConflictReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateEmail(email) => write!(f, "email already registered: {email}"),
            Self::DuplicateDepartmentName(name) => {
                write!(f, "department name already in use: {name}")
            }
            Self::ActiveEmploymentExists {
                person_id,
                employment_id,
            } => write!(
                f,
                "person {person_id} already has active employment {employment_id}"
            ),
            Self::OverlappingEmployment {
                person_id,
                employment_id,
            } => write!(
                f,
                "interval overlaps employment {employment_id} of person {person_id}"
            ),
            Self::DepartmentHasPositions(id) => {
                write!(f, "department {id} still owns positions")
            }
            Self::HasEmploymentHistory(entity) => {
                write!(f, "{entity} is referenced by employment history")
            }
            Self::OpenEmployment(entity) => {
                write!(f, "{entity} is referenced by an open employment")
            }
            Self::Constraint(message) => write!(f, "constraint violation: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidStateReason {
    /// Employment already has an end date.
    AlreadyClosed {
        employment_id: EmploymentId,
        end_date: NaiveDate,
    },
}

impl Display for InvalidStateReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyClosed {
                employment_id,
                end_date,
            } => write!(f, "employment {employment_id} already ended on {end_date}"),
        }
    }
}

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    NotFound(EntityRef),
    Conflict(ConflictReason),
    InvalidState(InvalidStateReason),
    /// Lock not acquired within the busy timeout.
    Unavailable(DbError),
    Db(DbError),
    InvalidData(String),
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::InvalidArgument,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Unavailable(_) => ErrorKind::Unavailable,
            Self::Db(_) | Self::InvalidData(_) => ErrorKind::Internal,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(entity) => write!(f, "{entity} not found"),
            Self::Conflict(reason) => write!(f, "{reason}"),
            Self::InvalidState(reason) => write!(f, "{reason}"),
            Self::Unavailable(err) => write!(f, "storage unavailable: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Unavailable(err) | Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::Conflict(_) | Self::InvalidState(_) | Self::InvalidData(_) => {
                None
            }
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        if value.is_busy() {
            return Self::Unavailable(value);
        }
        if value.is_constraint_violation() {
            return Self::Conflict(ConflictReason::Constraint(value.to_string()));
        }
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::from(DbError::Sqlite(value))
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, RepoError};
    use rusqlite::ffi;

    fn sqlite_failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(code), None)
    }

    #[test]
    fn busy_and_locked_map_to_unavailable() {
        let busy = RepoError::from(sqlite_failure(ffi::SQLITE_BUSY));
        let locked = RepoError::from(sqlite_failure(ffi::SQLITE_LOCKED));
        assert_eq!(busy.kind(), ErrorKind::Unavailable);
        assert_eq!(locked.kind(), ErrorKind::Unavailable);
    }

    #[test]
    fn constraint_violation_maps_to_conflict() {
        let err = RepoError::from(sqlite_failure(ffi::SQLITE_CONSTRAINT_UNIQUE));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn other_sqlite_errors_are_internal() {
        let err = RepoError::from(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
