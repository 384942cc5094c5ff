//! Domain model for organizational structure, people and employment history.
//!
//! # Responsibility
//! - Define canonical records shared by repositories, services and statistics.
//! - Keep pure invariant checks (validation, interval overlap) next to the
//!   types they protect.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID.
//! - Referenced entities are tombstoned, never silently removed, once history
//!   points at them.
//! - Employment status is derived from dates, never stored.

pub mod deletion;
pub mod directory;
pub mod employment;
pub mod person;
pub mod validation;
