//! Read-side statistics over the employment ledger.
//!
//! # Responsibility
//! - Load one consistent `LedgerSnapshot` per request.
//! - Derive headcount, tenure, salary and trend views with pure functions.
//!
//! # Invariants
//! - Nothing here mutates storage or caches results across calls.
//! - Every computation takes its reference date as a parameter.
//! - Empty or partial stores yield zero/empty results, never errors.

pub mod headcount;
pub mod salary;
pub mod snapshot;
pub mod tenure;
pub mod trends;

pub use headcount::{
    headcount, overview, DepartmentHeadcount, HeadcountReport, Overview, PositionHeadcount,
};
pub use salary::{
    percentile, salary_statistics, summarize_salaries, SalaryGroup, SalaryGroupKey,
    SalaryGrouping, SalaryStats,
};
pub use snapshot::{load_snapshot, LedgerSnapshot};
pub use tenure::{
    person_tenure, tenure_distribution, DaysSummary, PersonTenure, PersonTenureTotal,
    TenureDistribution, TenurePeriod,
};
pub use trends::{bucket_start, hiring_trends, Granularity, TrendBucket};
