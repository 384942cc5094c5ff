//! Employment ledger use-case service.
//!
//! # Responsibility
//! - Expose hire, terminate and transfer as the only ways to change an
//!   employment.
//! - Answer history and as-of queries.
//!
//! # Invariants
//! - All interval checks run inside the repository's write transaction.

use chrono::NaiveDate;
use std::time::Instant;

use super::log_outcome;
use crate::model::employment::{Employment, EmploymentId};
use crate::model::person::PersonId;
use crate::repo::employment_repo::{
    EmploymentRepository, EmploymentScope, HireRequest, TransferOutcome, TransferRequest,
};
use crate::repo::{EntityRef, RepoError, RepoResult};

const MODULE: &str = "ledger";

pub struct LedgerService<R: EmploymentRepository> {
    repo: R,
}

impl<R: EmploymentRepository> LedgerService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Opens an open-ended employment for a person with none covering
    /// `start_date` or later.
    pub fn hire(&self, request: &HireRequest) -> RepoResult<Employment> {
        let started = Instant::now();
        let result = self.repo.hire(request);
        log_outcome("employment_hire", MODULE, started, &request.person_id, result)
    }

    /// Sets the end date of an open employment.
    pub fn terminate(&self, id: EmploymentId, end_date: NaiveDate) -> RepoResult<Employment> {
        let started = Instant::now();
        let result = self.repo.terminate(id, end_date);
        log_outcome("employment_terminate", MODULE, started, &id, result)
    }

    /// Closes the current employment and opens one in the new position
    /// starting the same day.
    pub fn transfer(&self, request: &TransferRequest) -> RepoResult<TransferOutcome> {
        let started = Instant::now();
        let result = self.repo.transfer(request);
        log_outcome(
            "employment_transfer",
            MODULE,
            started,
            &request.employment_id,
            result,
        )
    }

    /// Administrative correction; removes one record outright.
    pub fn delete_employment(&self, id: EmploymentId) -> RepoResult<()> {
        let started = Instant::now();
        let result = self.repo.delete_employment(id);
        log_outcome("employment_delete", MODULE, started, &id, result)
    }

    pub fn get_employment(&self, id: EmploymentId) -> RepoResult<Employment> {
        self.repo
            .get_employment(id)?
            .ok_or(RepoError::NotFound(EntityRef::Employment(id)))
    }

    pub fn active_employment(
        &self,
        person_id: PersonId,
        as_of: NaiveDate,
    ) -> RepoResult<Option<Employment>> {
        self.repo.active_employment(person_id, as_of)
    }

    pub fn history(&self, person_id: PersonId) -> RepoResult<Vec<Employment>> {
        self.repo.history(person_id)
    }

    pub fn employees_at(
        &self,
        scope: EmploymentScope,
        as_of: NaiveDate,
    ) -> RepoResult<Vec<Employment>> {
        self.repo.employees_at(scope, as_of)
    }
}
