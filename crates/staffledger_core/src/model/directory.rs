//! Directory reference data: departments and the positions they own.
//!
//! # Invariants
//! - Live department names are unique (case-insensitive).
//! - A position belongs to exactly one department at a time; reassignment
//!   never rewrites employment attribution.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{optional_text, require_text, ValidationError};

pub type DepartmentId = Uuid;
pub type PositionId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub description: Option<String>,
    pub is_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    /// Current owning department.
    pub department_id: DepartmentId,
    pub title: String,
    pub description: Option<String>,
    pub is_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Write model for department create/update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentDraft {
    pub name: String,
    pub description: Option<String>,
}

impl DepartmentDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn normalized(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: require_text("name", &self.name)?,
            description: optional_text(self.description.as_deref()),
        })
    }
}

/// Title/description of a position. Department ownership changes only via
/// an explicit reassignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionDetails {
    pub title: String,
    pub description: Option<String>,
}

impl PositionDetails {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn normalized(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            title: require_text("title", &self.title)?,
            description: optional_text(self.description.as_deref()),
        })
    }
}
