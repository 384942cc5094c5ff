//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//! - Run every check-and-act sequence inside one immediate transaction.
//!
//! # Invariants
//! - Write paths validate input before SQL mutations.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`,
//!   `InvalidState`) in addition to DB transport errors.

pub mod directory_repo;
pub mod employment_repo;
pub mod error;
pub mod person_repo;
mod sql;

pub use error::{ConflictReason, EntityRef, ErrorKind, InvalidStateReason, RepoError, RepoResult};
