//! Person registry use-case service.
//!
//! # Responsibility
//! - Register and maintain persons independent of employment.
//! - Apply list pagination defaults.
//!
//! # Invariants
//! - Email uniqueness is enforced by the repository inside its write
//!   transaction; the service never pre-checks.

use std::time::Instant;

use chrono::NaiveDate;

use super::log_outcome;
use crate::model::deletion::{DeleteMode, DeleteOutcome};
use crate::model::person::{Address, ContactUpdate, Person, PersonDraft, PersonId};
use crate::repo::person_repo::{PersonListQuery, PersonRepository};
use crate::repo::{EntityRef, RepoError, RepoResult};
use crate::search::normalize_search_limit;

const MODULE: &str = "person";

/// Page of persons plus the limit actually applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonPage {
    pub items: Vec<Person>,
    pub applied_limit: u32,
}

/// Person registry facade over repository implementations.
pub struct PersonService<R: PersonRepository> {
    repo: R,
}

impl<R: PersonRepository> PersonService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn register(&self, draft: &PersonDraft) -> RepoResult<Person> {
        let started = Instant::now();
        let result = self.repo.create_person(draft);
        let subject = result
            .as_ref()
            .map(|person| person.id.to_string())
            .unwrap_or_else(|_| "new".to_string());
        log_outcome("person_register", MODULE, started, &subject, result)
    }

    /// Live person by id; `NotFound` for unknown or tombstoned ids.
    pub fn get(&self, id: PersonId) -> RepoResult<Person> {
        self.repo
            .get_person(id, false)?
            .ok_or(RepoError::NotFound(EntityRef::Person(id)))
    }

    /// Person by id including tombstones, for historical display.
    pub fn get_any(&self, id: PersonId) -> RepoResult<Option<Person>> {
        self.repo.get_person(id, true)
    }

    pub fn find_by_email(&self, email: &str) -> RepoResult<Option<Person>> {
        self.repo.get_person_by_email(email)
    }

    pub fn list(&self, limit: Option<u32>, offset: u32) -> RepoResult<PersonPage> {
        let applied_limit = normalize_search_limit(limit);
        let items = self.repo.list_persons(&PersonListQuery {
            include_deleted: false,
            limit: Some(applied_limit),
            offset,
        })?;
        Ok(PersonPage {
            items,
            applied_limit,
        })
    }

    /// Full replacement of every mutable field.
    pub fn replace(&self, id: PersonId, draft: &PersonDraft) -> RepoResult<Person> {
        let started = Instant::now();
        let result = self.repo.replace_person(id, draft);
        log_outcome("person_replace", MODULE, started, &id, result)
    }

    pub fn update_contact(&self, id: PersonId, update: &ContactUpdate) -> RepoResult<Person> {
        let started = Instant::now();
        let result = self.repo.update_contact(id, update);
        log_outcome("person_update_contact", MODULE, started, &id, result)
    }

    /// Sets or clears (`None`) the postal address.
    pub fn update_address(&self, id: PersonId, address: Option<&Address>) -> RepoResult<Person> {
        let started = Instant::now();
        let result = self.repo.update_address(id, address);
        log_outcome("person_update_address", MODULE, started, &id, result)
    }

    /// Deletion is blocked while an employment is active at `as_of` or later.
    pub fn delete(
        &self,
        id: PersonId,
        mode: DeleteMode,
        as_of: NaiveDate,
    ) -> RepoResult<DeleteOutcome> {
        let started = Instant::now();
        let result = self.repo.delete_person(id, mode, as_of);
        log_outcome("person_delete", MODULE, started, &id, result)
    }
}
