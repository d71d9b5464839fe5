//! Spy cat domain model.
//!
//! # Responsibility
//! - Define the persisted cat record and its create/update inputs.
//! - Normalize free-text fields before they reach storage.
//!
//! # Invariants
//! - `breed` holds the catalog spelling accepted at create/update time.
//! - `mission_id` is only written by the assignment engine.
//! - `salary` is finite and non-negative.

use super::mission::MissionId;
use super::validation::{require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a spy cat.
pub type CatId = Uuid;

/// Persisted spy cat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cat {
    pub id: CatId,
    pub name: String,
    pub experience_years: u32,
    pub breed: String,
    pub salary: f64,
    /// Active mission, if any. At most one per cat.
    pub mission_id: Option<MissionId>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl Cat {
    /// Returns whether the cat currently holds a mission.
    pub fn is_on_mission(&self) -> bool {
        self.mission_id.is_some()
    }
}

/// Input for registering a new spy cat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCat {
    pub name: String,
    pub experience_years: u32,
    pub breed: String,
    pub salary: f64,
}

impl NewCat {
    pub fn new(
        name: impl Into<String>,
        experience_years: u32,
        breed: impl Into<String>,
        salary: f64,
    ) -> Self {
        Self {
            name: name.into(),
            experience_years,
            breed: breed.into(),
            salary,
        }
    }

    /// Returns a trimmed copy, or the first field that fails validation.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: require_text("name", &self.name)?,
            experience_years: self.experience_years,
            breed: require_text("breed", &self.breed)?,
            salary: check_salary(self.salary)?,
        })
    }
}

/// Partial update for a spy cat. `None` leaves the field unchanged.
///
/// The mission link is not patchable; only assignment writes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatPatch {
    pub name: Option<String>,
    pub experience_years: Option<u32>,
    pub breed: Option<String>,
    pub salary: Option<f64>,
}

impl CatPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.experience_years.is_none()
            && self.breed.is_none()
            && self.salary.is_none()
    }

    /// Returns a trimmed copy, or the first field that fails validation.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyUpdate);
        }
        Ok(Self {
            name: self
                .name
                .as_deref()
                .map(|value| require_text("name", value))
                .transpose()?,
            experience_years: self.experience_years,
            breed: self
                .breed
                .as_deref()
                .map(|value| require_text("breed", value))
                .transpose()?,
            salary: self.salary.map(check_salary).transpose()?,
        })
    }

    /// Returns the requested breed when it differs from `current`.
    ///
    /// Comparison ignores ASCII case, matching catalog lookup semantics.
    pub fn breed_change<'a>(&'a self, current: &str) -> Option<&'a str> {
        self.breed
            .as_deref()
            .filter(|breed| !breed.eq_ignore_ascii_case(current))
    }

    /// Applies the patch onto `cat` in place.
    pub fn apply_to(&self, cat: &mut Cat) {
        if let Some(name) = &self.name {
            cat.name = name.clone();
        }
        if let Some(experience_years) = self.experience_years {
            cat.experience_years = experience_years;
        }
        if let Some(breed) = &self.breed {
            cat.breed = breed.clone();
        }
        if let Some(salary) = self.salary {
            cat.salary = salary;
        }
    }
}

fn check_salary(salary: f64) -> Result<f64, ValidationError> {
    if !salary.is_finite() {
        return Err(ValidationError::OutOfRange {
            field: "salary",
            reason: "must be a finite number",
        });
    }
    if salary < 0.0 {
        return Err(ValidationError::OutOfRange {
            field: "salary",
            reason: "must not be negative",
        });
    }
    Ok(salary)
}
