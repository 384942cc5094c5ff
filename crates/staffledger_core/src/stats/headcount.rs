//! Headcount and registry overview.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use super::snapshot::LedgerSnapshot;
use crate::model::directory::{DepartmentId, PositionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentHeadcount {
    pub department_id: DepartmentId,
    pub name: String,
    pub is_deleted: bool,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionHeadcount {
    pub position_id: PositionId,
    pub title: String,
    /// Current owning department of the position.
    pub department_id: DepartmentId,
    pub is_deleted: bool,
    pub count: usize,
}

/// Active employments as of one date, grouped two ways.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadcountReport {
    pub as_of: NaiveDate,
    pub total: usize,
    /// Grouped by historical attribution. Live departments appear even when
    /// empty; tombstones only when they still count someone.
    pub by_department: Vec<DepartmentHeadcount>,
    pub by_position: Vec<PositionHeadcount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub as_of: NaiveDate,
    pub persons: usize,
    pub departments: usize,
    pub positions: usize,
    pub active_employments: usize,
    /// Live persons without an employment active on `as_of`.
    pub unemployed_persons: usize,
    pub employment_records: usize,
}

pub fn headcount(snapshot: &LedgerSnapshot, as_of: NaiveDate) -> HeadcountReport {
    let mut by_department_counts: BTreeMap<DepartmentId, usize> = BTreeMap::new();
    let mut by_position_counts: BTreeMap<PositionId, usize> = BTreeMap::new();
    let mut total = 0;

    for employment in snapshot
        .employments
        .iter()
        .filter(|employment| employment.is_active_at(as_of))
    {
        total += 1;
        *by_department_counts
            .entry(employment.department_id)
            .or_default() += 1;
        *by_position_counts.entry(employment.position_id).or_default() += 1;
    }

    let mut by_department = snapshot
        .departments
        .iter()
        .filter_map(|department| {
            let count = by_department_counts
                .get(&department.id)
                .copied()
                .unwrap_or(0);
            (!department.is_deleted || count > 0).then(|| DepartmentHeadcount {
                department_id: department.id,
                name: department.name.clone(),
                is_deleted: department.is_deleted,
                count,
            })
        })
        .collect::<Vec<_>>();
    by_department.sort_by(|a, b| a.name.cmp(&b.name).then(a.department_id.cmp(&b.department_id)));

    let mut by_position = snapshot
        .positions
        .iter()
        .filter_map(|position| {
            let count = by_position_counts.get(&position.id).copied().unwrap_or(0);
            (!position.is_deleted || count > 0).then(|| PositionHeadcount {
                position_id: position.id,
                title: position.title.clone(),
                department_id: position.department_id,
                is_deleted: position.is_deleted,
                count,
            })
        })
        .collect::<Vec<_>>();
    by_position.sort_by(|a, b| a.title.cmp(&b.title).then(a.position_id.cmp(&b.position_id)));

    HeadcountReport {
        as_of,
        total,
        by_department,
        by_position,
    }
}

pub fn overview(snapshot: &LedgerSnapshot, as_of: NaiveDate) -> Overview {
    let active = snapshot
        .employments
        .iter()
        .filter(|employment| employment.is_active_at(as_of))
        .collect::<Vec<_>>();
    let employed = active
        .iter()
        .map(|employment| employment.person_id)
        .collect::<HashSet<_>>();
    let live_persons = snapshot
        .persons
        .iter()
        .filter(|person| !person.is_deleted)
        .collect::<Vec<_>>();

    Overview {
        as_of,
        persons: live_persons.len(),
        departments: snapshot
            .departments
            .iter()
            .filter(|department| !department.is_deleted)
            .count(),
        positions: snapshot
            .positions
            .iter()
            .filter(|position| !position.is_deleted)
            .count(),
        active_employments: active.len(),
        unemployed_persons: live_persons
            .iter()
            .filter(|person| !employed.contains(&person.id))
            .count(),
        employment_records: snapshot.employments.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::{headcount, overview};
    use crate::stats::snapshot::LedgerSnapshot;
    use chrono::NaiveDate;

    #[test]
    fn empty_snapshot_reports_zeroes() {
        let as_of = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let snapshot = LedgerSnapshot::default();

        let report = headcount(&snapshot, as_of);
        assert_eq!(report.total, 0);
        assert!(report.by_department.is_empty());
        assert!(report.by_position.is_empty());

        let overview = overview(&snapshot, as_of);
        assert_eq!(overview.persons, 0);
        assert_eq!(overview.active_employments, 0);
        assert_eq!(overview.unemployed_persons, 0);
    }
}
