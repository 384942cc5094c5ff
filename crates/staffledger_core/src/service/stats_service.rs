//! Statistics use-case service.
//!
//! # Responsibility
//! - Load one consistent ledger snapshot per request and run the pure
//!   aggregators in `crate::stats` over it.
//!
//! # Invariants
//! - Statistics never write.
//! - One request never mixes rows from before and after a concurrent
//!   mutation.

use chrono::NaiveDate;
use log::debug;
use rusqlite::Connection;
use std::time::Instant;

use crate::model::employment::DateRange;
use crate::model::person::PersonId;
use crate::repo::{EntityRef, RepoError, RepoResult};
use crate::stats::{
    self, load_snapshot, Granularity, HeadcountReport, LedgerSnapshot, Overview, PersonTenure,
    SalaryGroup, SalaryGrouping, TenureDistribution, TrendBucket,
};

pub struct StatsService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> StatsService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn overview(&self, as_of: NaiveDate) -> RepoResult<Overview> {
        let snapshot = self.snapshot("overview")?;
        Ok(stats::overview(&snapshot, as_of))
    }

    pub fn headcount(&self, as_of: NaiveDate) -> RepoResult<HeadcountReport> {
        let snapshot = self.snapshot("headcount")?;
        Ok(stats::headcount(&snapshot, as_of))
    }

    /// `NotFound` when the person was never registered.
    pub fn person_tenure(&self, person_id: PersonId, as_of: NaiveDate) -> RepoResult<PersonTenure> {
        let snapshot = self.snapshot("person_tenure")?;
        if !snapshot.has_person(person_id) {
            return Err(RepoError::NotFound(EntityRef::Person(person_id)));
        }
        Ok(stats::person_tenure(
            person_id,
            snapshot.employments_of(person_id),
            as_of,
        ))
    }

    pub fn tenure_distribution(&self, as_of: NaiveDate) -> RepoResult<TenureDistribution> {
        let snapshot = self.snapshot("tenure_distribution")?;
        Ok(stats::tenure_distribution(&snapshot, as_of))
    }

    pub fn salary_statistics(
        &self,
        as_of: NaiveDate,
        grouping: SalaryGrouping,
    ) -> RepoResult<Vec<SalaryGroup>> {
        let snapshot = self.snapshot("salary_statistics")?;
        Ok(stats::salary_statistics(&snapshot, as_of, grouping))
    }

    /// `InvalidArgument` when `from > to`.
    pub fn hiring_trends(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        granularity: Granularity,
    ) -> RepoResult<Vec<TrendBucket>> {
        let range = DateRange::new(from, to)?;
        let snapshot = self.snapshot("hiring_trends")?;
        Ok(stats::hiring_trends(&snapshot.employments, range, granularity))
    }

    fn snapshot(&self, report: &'static str) -> RepoResult<LedgerSnapshot> {
        let started = Instant::now();
        let snapshot = load_snapshot(self.conn)?;
        debug!(
            "event=stats_snapshot module=stats status=ok report={report} employments={} duration_ms={}",
            snapshot.employments.len(),
            started.elapsed().as_millis()
        );
        Ok(snapshot)
    }
}
