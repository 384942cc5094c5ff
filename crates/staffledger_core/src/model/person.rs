//! Person registry model.
//!
//! # Responsibility
//! - Define identity, contact and address data for registered people.
//! - Normalize write input before it reaches persistence.
//!
//! # Invariants
//! - `email` is stored trimmed and lowercase, and is unique across all rows
//!   (tombstones included).
//! - A person carries no employment state; see `model::employment`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{normalize_email, optional_text, require_text, ValidationError};

/// Stable identifier for a registered person.
pub type PersonId = Uuid;

/// Postal address. Stored inline on the person row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
}

impl Address {
    /// Returns a trimmed copy, rejecting blank required parts.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            street: require_text("address.street", &self.street)?,
            city: require_text("address.city", &self.city)?,
            region: optional_text(self.region.as_deref()),
            postal_code: optional_text(self.postal_code.as_deref()),
            country: require_text("address.country", &self.country)?,
        })
    }
}

/// Persisted person record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<Address>,
    /// Tombstone marker; history may still reference this person.
    pub is_deleted: bool,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Write model for registration and full replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

impl PersonDraft {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: None,
            address: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Returns the stored form of this draft.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            first_name: require_text("first_name", &self.first_name)?,
            last_name: require_text("last_name", &self.last_name)?,
            email: normalize_email(&self.email)?,
            phone: optional_text(self.phone.as_deref()),
            address: self.address.as_ref().map(Address::normalized).transpose()?,
        })
    }
}

/// Partial contact update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactUpdate {
    pub email: Option<String>,
    /// `Some(None)` clears the phone number.
    pub phone: Option<Option<String>>,
}

impl ContactUpdate {
    /// Applies the update on top of `person`'s current contact fields.
    pub fn apply_to(&self, person: &Person) -> Result<(String, Option<String>), ValidationError> {
        let email = match self.email.as_deref() {
            Some(value) => normalize_email(value)?,
            None => person.email.clone(),
        };
        let phone = match &self.phone {
            Some(value) => optional_text(value.as_deref()),
            None => person.phone.clone(),
        };
        Ok((email, phone))
    }
}
