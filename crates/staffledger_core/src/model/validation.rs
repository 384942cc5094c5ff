//! Input validation errors shared by every write path.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

use super::directory::PositionId;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Malformed or out-of-range input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is blank after trim.
    BlankField(&'static str),
    /// Email does not look like `local@domain.tld`.
    InvalidEmail(String),
    /// Salary amounts must not be negative.
    NegativeSalary(i64),
    /// `end_date` precedes `start_date`.
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    /// Transfer effective date precedes the current record start.
    EffectiveBeforeStart {
        start: NaiveDate,
        effective: NaiveDate,
    },
    /// Transfer target equals the current position.
    TransferToSamePosition(PositionId),
    /// Date range whose `from` is after `to`.
    InvertedRange { from: NaiveDate, to: NaiveDate },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "field `{field}` must not be blank"),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::NegativeSalary(value) => write!(f, "salary must not be negative, got {value}"),
            Self::EndBeforeStart { start, end } => {
                write!(f, "end date {end} is before start date {start}")
            }
            Self::EffectiveBeforeStart { start, effective } => write!(
                f,
                "effective date {effective} is before current start date {start}"
            ),
            Self::TransferToSamePosition(id) => {
                write!(f, "transfer target is the current position: {id}")
            }
            Self::InvertedRange { from, to } => {
                write!(f, "date range start {from} is after end {to}")
            }
        }
    }
}

impl Error for ValidationError {}

/// Trims a required text field, rejecting blank input.
pub fn require_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional text field; blank values collapse to `None`.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Normalizes an email address to its stored form (trimmed, lowercase).
pub fn normalize_email(value: &str) -> Result<String, ValidationError> {
    let normalized = value.trim().to_lowercase();
    if !EMAIL_RE.is_match(&normalized) {
        return Err(ValidationError::InvalidEmail(value.trim().to_string()));
    }
    Ok(normalized)
}

pub fn require_non_negative_salary(salary: i64) -> Result<i64, ValidationError> {
    if salary < 0 {
        return Err(ValidationError::NegativeSalary(salary));
    }
    Ok(salary)
}
