//! Consistent in-memory view of the ledger for one statistics request.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::model::directory::{Department, Position};
use crate::model::employment::Employment;
use crate::model::person::{Person, PersonId};
use crate::repo::directory_repo::{DirectoryRepository, SqliteDirectoryRepository};
use crate::repo::employment_repo::load_all_employments;
use crate::repo::person_repo::{PersonListQuery, PersonRepository, SqlitePersonRepository};
use crate::repo::RepoResult;

/// All rows, tombstones included, read under a single read transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub departments: Vec<Department>,
    pub positions: Vec<Position>,
    pub persons: Vec<Person>,
    /// Ordered by person, then start date.
    pub employments: Vec<Employment>,
}

impl LedgerSnapshot {
    pub fn employments_of(&self, person_id: PersonId) -> impl Iterator<Item = &Employment> {
        self.employments
            .iter()
            .filter(move |employment| employment.person_id == person_id)
    }

    pub fn has_person(&self, person_id: PersonId) -> bool {
        self.persons.iter().any(|person| person.id == person_id)
    }
}

/// Reads the whole ledger inside one deferred transaction so an aggregate
/// never mixes pre- and post-mutation rows.
pub fn load_snapshot(conn: &Connection) -> RepoResult<LedgerSnapshot> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Deferred)?;
    let directory = SqliteDirectoryRepository::new(&tx);
    let persons = SqlitePersonRepository::new(&tx).list_persons(&PersonListQuery {
        include_deleted: true,
        ..PersonListQuery::default()
    })?;
    let snapshot = LedgerSnapshot {
        departments: directory.list_departments(true)?,
        positions: directory.list_positions(None, true)?,
        persons,
        employments: load_all_employments(&tx)?,
    };
    tx.commit()?;
    Ok(snapshot)
}
