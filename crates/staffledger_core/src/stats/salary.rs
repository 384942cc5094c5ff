//! Salary distribution over active employments.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::snapshot::LedgerSnapshot;
use crate::model::directory::{DepartmentId, PositionId};

/// Grouping dimension for salary statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryGrouping {
    #[default]
    Overall,
    Department,
    Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum SalaryGroupKey {
    Overall,
    Department(DepartmentId),
    Position(PositionId),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryStats {
    pub count: usize,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub p25: Option<f64>,
    pub p75: Option<f64>,
    pub p90: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryGroup {
    pub key: SalaryGroupKey,
    /// Department name or position title; empty for the overall group.
    pub label: String,
    pub stats: SalaryStats,
}

/// Summary of one salary sample. Input order does not matter.
pub fn summarize_salaries(values: &[i64]) -> SalaryStats {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let count = sorted.len();
    let mean = (count > 0).then(|| sorted.iter().map(|v| *v as f64).sum::<f64>() / count as f64);

    SalaryStats {
        count,
        min: sorted.first().copied(),
        max: sorted.last().copied(),
        mean,
        median: median_of_sorted(&sorted),
        p25: percentile(&sorted, 25.0),
        p75: percentile(&sorted, 75.0),
        p90: percentile(&sorted, 90.0),
    }
}

/// Percentile `p` (0..=100) of an ascending sample using linear
/// interpolation between closest ranks.
pub fn percentile(sorted: &[i64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=100.0).contains(&p) {
        return None;
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let low = sorted[lower] as f64;
    let high = sorted[upper] as f64;
    Some(low + (high - low) * (rank - lower as f64))
}

pub(crate) fn median_of_sorted(sorted: &[i64]) -> Option<f64> {
    percentile(sorted, 50.0)
}

/// Statistics over salaries of employments active on `as_of`.
///
/// `Overall` always yields exactly one group (possibly with `count == 0`);
/// the other groupings yield one group per department/position that has at
/// least one active employment, ordered by label.
pub fn salary_statistics(
    snapshot: &LedgerSnapshot,
    as_of: NaiveDate,
    grouping: SalaryGrouping,
) -> Vec<SalaryGroup> {
    let active = snapshot
        .employments
        .iter()
        .filter(|employment| employment.is_active_at(as_of));

    if grouping == SalaryGrouping::Overall {
        let values = active.map(|employment| employment.salary).collect::<Vec<_>>();
        return vec![SalaryGroup {
            key: SalaryGroupKey::Overall,
            label: String::new(),
            stats: summarize_salaries(&values),
        }];
    }

    let mut samples: BTreeMap<Uuid, Vec<i64>> = BTreeMap::new();
    for employment in active {
        let key = match grouping {
            SalaryGrouping::Department => employment.department_id,
            _ => employment.position_id,
        };
        samples.entry(key).or_default().push(employment.salary);
    }

    let mut groups = samples
        .into_iter()
        .map(|(id, values)| {
            let (key, label) = match grouping {
                SalaryGrouping::Department => (
                    SalaryGroupKey::Department(id),
                    snapshot
                        .departments
                        .iter()
                        .find(|department| department.id == id)
                        .map(|department| department.name.clone())
                        .unwrap_or_default(),
                ),
                _ => (
                    SalaryGroupKey::Position(id),
                    snapshot
                        .positions
                        .iter()
                        .find(|position| position.id == id)
                        .map(|position| position.title.clone())
                        .unwrap_or_default(),
                ),
            };
            SalaryGroup {
                key,
                label,
                stats: summarize_salaries(&values),
            }
        })
        .collect::<Vec<_>>();
    groups.sort_by(|a, b| a.label.cmp(&b.label));
    groups
}

#[cfg(test)]
mod tests {
    use super::{percentile, summarize_salaries};

    #[test]
    fn percentile_interpolates_between_ranks() {
        let sorted = [10, 20, 30, 40];
        assert_eq!(percentile(&sorted, 0.0), Some(10.0));
        assert_eq!(percentile(&sorted, 50.0), Some(25.0));
        assert_eq!(percentile(&sorted, 100.0), Some(40.0));
        assert_eq!(percentile(&sorted, 150.0), None);
    }

    #[test]
    fn summary_of_unsorted_sample() {
        let stats = summarize_salaries(&[90_000, 50_000, 70_000]);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, Some(50_000));
        assert_eq!(stats.max, Some(90_000));
        assert_eq!(stats.mean, Some(70_000.0));
        assert_eq!(stats.median, Some(70_000.0));
        assert_eq!(stats.p25, Some(60_000.0));
    }

    #[test]
    fn empty_sample_has_only_a_zero_count() {
        let stats = summarize_salaries(&[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.min, None);
        assert_eq!(stats.mean, None);
        assert_eq!(stats.p90, None);
    }
}
