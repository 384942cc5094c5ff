//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Emit one metadata-only log line per mutating call.
//!
//! # Invariants
//! - Services never bypass repository validation or transaction contracts.
//! - Log lines carry ids, dates and error kinds only; never names, emails
//!   or salaries.

pub mod directory_service;
pub mod ledger_service;
pub mod person_service;
pub mod stats_service;

use log::{info, warn};
use std::time::Instant;

use crate::repo::RepoResult;

/// Logs the outcome of one use-case call and passes the result through.
pub(crate) fn log_outcome<T>(
    event: &'static str,
    module: &'static str,
    started: Instant,
    subject: &dyn std::fmt::Display,
    result: RepoResult<T>,
) -> RepoResult<T> {
    let duration_ms = started.elapsed().as_millis();
    match &result {
        Ok(_) => info!(
            "event={event} module={module} status=ok subject={subject} duration_ms={duration_ms}"
        ),
        Err(err) => warn!(
            "event={event} module={module} status=error subject={subject} error_kind={} duration_ms={duration_ms}",
            err.kind().as_str()
        ),
    }
    result
}
