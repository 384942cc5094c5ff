//! Employment model: the temporal join between a person and a position.
//!
//! # Responsibility
//! - Define the employment record and its derived status.
//! - Provide the interval checks the ledger runs inside its write
//!   transaction.
//!
//! # Invariants
//! - Intervals are half-open `[start_date, end_date)`; a missing end is +inf.
//! - For one person no two records overlap.
//! - `start_date <= end_date` whenever `end_date` is set.
//! - `department_id` is the attribution captured when the record was
//!   created; it never follows later position reassignments.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::directory::{DepartmentId, PositionId};
use super::person::PersonId;
use super::validation::ValidationError;

pub type EmploymentId = Uuid;

/// Which transition created a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentOrigin {
    Hire,
    Transfer,
}

/// Which transition closed a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Terminated,
    Transferred,
}

/// Status derived from `end_date` relative to a reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    Active,
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employment {
    pub id: EmploymentId,
    pub person_id: PersonId,
    pub position_id: PositionId,
    /// Historical attribution snapshot.
    pub department_id: DepartmentId,
    pub start_date: NaiveDate,
    /// `None` means open-ended.
    pub end_date: Option<NaiveDate>,
    pub salary: i64,
    pub origin: EmploymentOrigin,
    pub end_reason: Option<EndReason>,
    /// Record closed by the transfer that opened this one.
    pub transferred_from: Option<EmploymentId>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Employment {
    /// `Active` iff the record has no end date or ends after `now`.
    pub fn status(&self, now: NaiveDate) -> EmploymentStatus {
        match self.end_date {
            Some(end) if end <= now => EmploymentStatus::Terminated,
            _ => EmploymentStatus::Active,
        }
    }

    /// Interval containment: `start_date <= at < end_date`.
    pub fn is_active_at(&self, at: NaiveDate) -> bool {
        self.start_date <= at && self.end_date.map_or(true, |end| at < end)
    }

    pub fn overlaps(&self, start: NaiveDate, end: Option<NaiveDate>) -> bool {
        intervals_overlap(self.start_date, self.end_date, start, end)
    }

    /// Whole days served up to `as_of`, clipped to the record's interval.
    pub fn days_served(&self, as_of: NaiveDate) -> i64 {
        let end = match self.end_date {
            Some(end) if end < as_of => end,
            _ => as_of,
        };
        (end - self.start_date).num_days().max(0)
    }

    /// Checks the date and salary invariants of a single record.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.salary < 0 {
            return Err(ValidationError::NegativeSalary(self.salary));
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(ValidationError::EndBeforeStart {
                    start: self.start_date,
                    end,
                });
            }
        }
        Ok(())
    }
}

/// Reason a new open-ended interval cannot start for a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HireConflict {
    /// The person already holds an open-ended record.
    OpenEmployment(EmploymentId),
    /// An existing closed record ends after the requested start.
    Overlap(EmploymentId),
}

/// Half-open interval overlap with `None` treated as +inf.
///
/// Empty intervals (`start == end`) share no instant with anything.
pub fn intervals_overlap(
    a_start: NaiveDate,
    a_end: Option<NaiveDate>,
    b_start: NaiveDate,
    b_end: Option<NaiveDate>,
) -> bool {
    if a_end == Some(a_start) || b_end == Some(b_start) {
        return false;
    }
    let a_before_b_end = b_end.map_or(true, |end| a_start < end);
    let b_before_a_end = a_end.map_or(true, |end| b_start < end);
    a_before_b_end && b_before_a_end
}

/// Checks that an open-ended record starting at `start` fits after every
/// record in `history` (one person's records, any order).
pub fn check_open_interval(history: &[Employment], start: NaiveDate) -> Result<(), HireConflict> {
    if let Some(open) = history.iter().find(|record| record.end_date.is_none()) {
        return Err(HireConflict::OpenEmployment(open.id));
    }
    // Zero-length records never overlap, so the end date is compared too.
    let conflicting = history.iter().find(|record| {
        record.overlaps(start, None) || record.end_date.map_or(false, |end| start < end)
    });
    match conflicting {
        Some(existing) => Err(HireConflict::Overlap(existing.id)),
        None => Ok(()),
    }
}

/// Inclusive calendar range used by trend and search filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, ValidationError> {
        if from > to {
            return Err(ValidationError::InvertedRange { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

#[cfg(test)]
mod tests {
    use super::{
        check_open_interval, intervals_overlap, Employment, EmploymentOrigin, EmploymentStatus,
        EndReason, HireConflict,
    };
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(start: NaiveDate, end: Option<NaiveDate>) -> Employment {
        Employment {
            id: Uuid::new_v4(),
            person_id: Uuid::new_v4(),
            position_id: Uuid::new_v4(),
            department_id: Uuid::new_v4(),
            start_date: start,
            end_date: end,
            salary: 1_000,
            origin: EmploymentOrigin::Hire,
            end_reason: end.map(|_| EndReason::Terminated),
            transferred_from: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn adjacent_intervals_do_not_overlap() {
        let jan = date(2024, 1, 1);
        let jun = date(2024, 6, 1);
        assert!(!intervals_overlap(jan, Some(jun), jun, None));
        assert!(intervals_overlap(jan, Some(jun), date(2024, 5, 31), None));
        assert!(intervals_overlap(jan, None, date(2030, 1, 1), Some(date(2031, 1, 1))));
    }

    #[test]
    fn empty_interval_overlaps_nothing() {
        let day = date(2024, 3, 1);
        assert!(!intervals_overlap(day, Some(day), date(2024, 1, 1), None));
    }

    #[test]
    fn status_is_derived_from_end_date() {
        let now = date(2024, 6, 1);
        assert_eq!(
            record(date(2024, 1, 1), None).status(now),
            EmploymentStatus::Active
        );
        assert_eq!(
            record(date(2024, 1, 1), Some(date(2024, 7, 1))).status(now),
            EmploymentStatus::Active
        );
        assert_eq!(
            record(date(2024, 1, 1), Some(now)).status(now),
            EmploymentStatus::Terminated
        );
    }

    #[test]
    fn open_interval_check_reports_open_record_first() {
        let open = record(date(2024, 1, 1), None);
        let closed = record(date(2023, 1, 1), Some(date(2023, 12, 31)));
        let history = vec![closed, open.clone()];
        assert_eq!(
            check_open_interval(&history, date(2024, 3, 1)),
            Err(HireConflict::OpenEmployment(open.id))
        );
    }

    #[test]
    fn open_interval_check_rejects_start_before_prior_end() {
        let closed = record(date(2023, 1, 1), Some(date(2023, 12, 31)));
        let history = vec![closed.clone()];
        assert_eq!(
            check_open_interval(&history, date(2023, 6, 1)),
            Err(HireConflict::Overlap(closed.id))
        );
        assert_eq!(check_open_interval(&history, date(2023, 12, 31)), Ok(()));
    }

    #[test]
    fn open_interval_check_rejects_start_before_zero_length_record() {
        let day = date(2024, 3, 1);
        let empty = record(day, Some(day));
        let history = vec![empty.clone()];
        assert_eq!(
            check_open_interval(&history, date(2024, 1, 1)),
            Err(HireConflict::Overlap(empty.id))
        );
        assert_eq!(check_open_interval(&history, day), Ok(()));
    }

    #[test]
    fn days_served_clips_to_as_of() {
        let employment = record(date(2024, 1, 1), Some(date(2024, 4, 10)));
        assert_eq!(employment.days_served(date(2024, 12, 31)), 100);
        assert_eq!(employment.days_served(date(2024, 1, 11)), 10);
        assert_eq!(employment.days_served(date(2023, 12, 1)), 0);
    }
}
