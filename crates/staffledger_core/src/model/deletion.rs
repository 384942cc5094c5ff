//! Delete policy shared by departments, positions and persons.

use serde::{Deserialize, Serialize};

/// How a delete request treats existing references.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteMode {
    /// Fail with a conflict when anything references the entity.
    #[default]
    Block,
    /// Tombstone the entity when only historical references exist.
    Cascade,
}

/// What a successful delete did to the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// Row had no references and was physically removed.
    Removed,
    /// Row is kept as a tombstone for historical integrity.
    Tombstoned,
}
