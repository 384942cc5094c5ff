//! Tenure: days served per record and per person.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::salary::median_of_sorted;
use super::snapshot::LedgerSnapshot;
use crate::model::directory::{DepartmentId, PositionId};
use crate::model::employment::{Employment, EmploymentId};
use crate::model::person::PersonId;

/// One record's contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenurePeriod {
    pub employment_id: EmploymentId,
    pub position_id: PositionId,
    pub department_id: DepartmentId,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub days: i64,
}

/// Per-position periods and their sum for one person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonTenure {
    pub person_id: PersonId,
    pub as_of: NaiveDate,
    pub total_days: i64,
    pub periods: Vec<TenurePeriod>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PersonTenureTotal {
    pub person_id: PersonId,
    pub total_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaysSummary {
    pub count: usize,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenureDistribution {
    pub as_of: NaiveDate,
    /// Sorted by total days descending, then person id.
    pub persons: Vec<PersonTenureTotal>,
    pub summary: DaysSummary,
}

/// Tenure of one person; records starting after `as_of` are skipped and open
/// or future-ended records are clipped at `as_of`.
pub fn person_tenure<'a>(
    person_id: PersonId,
    employments: impl IntoIterator<Item = &'a Employment>,
    as_of: NaiveDate,
) -> PersonTenure {
    let mut periods = employments
        .into_iter()
        .filter(|employment| employment.person_id == person_id && employment.start_date <= as_of)
        .map(|employment| TenurePeriod {
            employment_id: employment.id,
            position_id: employment.position_id,
            department_id: employment.department_id,
            start_date: employment.start_date,
            end_date: employment.end_date,
            days: employment.days_served(as_of),
        })
        .collect::<Vec<_>>();
    periods.sort_by_key(|period| period.start_date);

    PersonTenure {
        person_id,
        as_of,
        total_days: periods.iter().map(|period| period.days).sum(),
        periods,
    }
}

pub fn tenure_distribution(snapshot: &LedgerSnapshot, as_of: NaiveDate) -> TenureDistribution {
    let mut totals: BTreeMap<PersonId, i64> = BTreeMap::new();
    for employment in snapshot
        .employments
        .iter()
        .filter(|employment| employment.start_date <= as_of)
    {
        *totals.entry(employment.person_id).or_default() += employment.days_served(as_of);
    }

    let mut persons = totals
        .into_iter()
        .map(|(person_id, total_days)| PersonTenureTotal {
            person_id,
            total_days,
        })
        .collect::<Vec<_>>();
    persons.sort_by(|a, b| {
        b.total_days
            .cmp(&a.total_days)
            .then(a.person_id.cmp(&b.person_id))
    });

    let mut days = persons.iter().map(|p| p.total_days).collect::<Vec<_>>();
    days.sort_unstable();

    TenureDistribution {
        as_of,
        persons,
        summary: summarize_days(&days),
    }
}

fn summarize_days(sorted: &[i64]) -> DaysSummary {
    let count = sorted.len();
    let mean = (count > 0).then(|| sorted.iter().sum::<i64>() as f64 / count as f64);
    DaysSummary {
        count,
        min: sorted.first().copied(),
        max: sorted.last().copied(),
        mean,
        median: median_of_sorted(sorted),
    }
}

#[cfg(test)]
mod tests {
    use super::{person_tenure, tenure_distribution};
    use crate::model::employment::{Employment, EmploymentOrigin, EndReason};
    use crate::stats::snapshot::LedgerSnapshot;
    use chrono::{Days, NaiveDate};
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn period(person_id: Uuid, start: NaiveDate, days: Option<u64>) -> Employment {
        let end = days.map(|days| start.checked_add_days(Days::new(days)).unwrap());
        Employment {
            id: Uuid::new_v4(),
            person_id,
            position_id: Uuid::new_v4(),
            department_id: Uuid::new_v4(),
            start_date: start,
            end_date: end,
            salary: 50_000,
            origin: EmploymentOrigin::Hire,
            end_reason: end.map(|_| EndReason::Terminated),
            transferred_from: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn non_contiguous_periods_sum_to_total() {
        let person = Uuid::new_v4();
        let records = vec![
            period(person, date(2022, 1, 1), Some(100)),
            period(person, date(2023, 1, 1), Some(50)),
        ];

        let tenure = person_tenure(person, &records, date(2024, 1, 1));
        assert_eq!(tenure.total_days, 150);
        let days = tenure.periods.iter().map(|p| p.days).collect::<Vec<_>>();
        assert_eq!(days, vec![100, 50]);
    }

    #[test]
    fn open_period_counts_until_as_of_and_future_period_is_skipped() {
        let person = Uuid::new_v4();
        let records = vec![
            period(person, date(2024, 1, 1), None),
            period(Uuid::new_v4(), date(2024, 1, 1), None),
        ];
        let tenure = person_tenure(person, &records, date(2024, 1, 31));
        assert_eq!(tenure.total_days, 30);
        assert_eq!(tenure.periods.len(), 1);

        let before_start = person_tenure(person, &records, date(2023, 12, 1));
        assert_eq!(before_start.total_days, 0);
        assert!(before_start.periods.is_empty());
    }

    #[test]
    fn distribution_orders_by_total_and_summarizes() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let snapshot = LedgerSnapshot {
            employments: vec![
                period(a, date(2020, 1, 1), Some(10)),
                period(b, date(2020, 1, 1), Some(30)),
            ],
            ..LedgerSnapshot::default()
        };

        let distribution = tenure_distribution(&snapshot, date(2021, 1, 1));
        assert_eq!(distribution.persons[0].person_id, b);
        assert_eq!(distribution.summary.count, 2);
        assert_eq!(distribution.summary.min, Some(10));
        assert_eq!(distribution.summary.max, Some(30));
        assert_eq!(distribution.summary.median, Some(20.0));
    }

    #[test]
    fn empty_distribution_has_no_summary_values() {
        let distribution = tenure_distribution(&LedgerSnapshot::default(), date(2021, 1, 1));
        assert!(distribution.persons.is_empty());
        assert_eq!(distribution.summary.count, 0);
        assert_eq!(distribution.summary.mean, None);
    }
}
