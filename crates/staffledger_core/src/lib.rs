//! Core domain logic for StaffLedger, an HR system of record.
//! This crate is the single source of truth for employment invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod stats;

pub use db::{open_db, open_db_in_memory, open_db_with_options, DbError, DbOptions};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::deletion::{DeleteMode, DeleteOutcome};
pub use model::directory::{
    Department, DepartmentDraft, DepartmentId, Position, PositionDetails, PositionId,
};
pub use model::employment::{
    DateRange, Employment, EmploymentId, EmploymentOrigin, EmploymentStatus, EndReason,
};
pub use model::person::{Address, ContactUpdate, Person, PersonDraft, PersonId};
pub use model::validation::ValidationError;
pub use repo::directory_repo::{DirectoryRepository, SqliteDirectoryRepository};
pub use repo::employment_repo::{
    EmploymentRepository, EmploymentScope, HireRequest, SqliteEmploymentRepository,
    TransferOutcome, TransferRequest,
};
pub use repo::person_repo::{PersonListQuery, PersonRepository, SqlitePersonRepository};
pub use repo::{ConflictReason, EntityRef, ErrorKind, InvalidStateReason, RepoError, RepoResult};
pub use search::{
    search_employees, search_persons, EmployeeFilter, EmployeeHit, PersonSearchQuery,
    SearchError, SearchResult,
};
pub use service::directory_service::DirectoryService;
pub use service::ledger_service::LedgerService;
pub use service::person_service::{PersonPage, PersonService};
pub use service::stats_service::StatsService;
pub use stats::{Granularity, SalaryGrouping};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
