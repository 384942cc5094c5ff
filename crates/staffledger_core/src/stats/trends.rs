//! Hiring trends bucketed by calendar granularity.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::employment::{DateRange, Employment, EmploymentOrigin, EndReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Day,
    Month,
    Year,
}

/// Transition counts for one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendBucket {
    /// First calendar day of the bucket (may precede `range.from`).
    pub bucket_start: NaiveDate,
    pub hires: usize,
    pub transfers: usize,
    pub terminations: usize,
}

impl TrendBucket {
    fn empty(bucket_start: NaiveDate) -> Self {
        Self {
            bucket_start,
            hires: 0,
            transfers: 0,
            terminations: 0,
        }
    }
}

/// Start of the bucket containing `date`.
pub fn bucket_start(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Day => date,
        Granularity::Month => date.with_day(1).unwrap_or(date),
        Granularity::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
    }
}

fn next_bucket(start: NaiveDate, granularity: Granularity) -> Option<NaiveDate> {
    match granularity {
        Granularity::Day => start.succ_opt(),
        Granularity::Month if start.month() == 12 => NaiveDate::from_ymd_opt(start.year() + 1, 1, 1),
        Granularity::Month => NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1),
        Granularity::Year => NaiveDate::from_ymd_opt(start.year() + 1, 1, 1),
    }
}

/// Counts hires, transfers and terminations whose effective date falls in
/// `range` (inclusive), one zero-filled bucket per period.
pub fn hiring_trends<'a>(
    employments: impl IntoIterator<Item = &'a Employment>,
    range: DateRange,
    granularity: Granularity,
) -> Vec<TrendBucket> {
    let mut buckets = BTreeMap::new();
    let mut cursor = Some(bucket_start(range.from, granularity));
    while let Some(start) = cursor.filter(|start| *start <= range.to) {
        buckets.insert(start, TrendBucket::empty(start));
        cursor = next_bucket(start, granularity);
    }

    for employment in employments {
        if range.contains(employment.start_date) {
            let key = bucket_start(employment.start_date, granularity);
            if let Some(bucket) = buckets.get_mut(&key) {
                match employment.origin {
                    EmploymentOrigin::Hire => bucket.hires += 1,
                    EmploymentOrigin::Transfer => bucket.transfers += 1,
                }
            }
        }
        if let (Some(end), Some(EndReason::Terminated)) = (employment.end_date, employment.end_reason)
        {
            if range.contains(end) {
                if let Some(bucket) = buckets.get_mut(&bucket_start(end, granularity)) {
                    bucket.terminations += 1;
                }
            }
        }
    }

    buckets.into_values().collect()
}
