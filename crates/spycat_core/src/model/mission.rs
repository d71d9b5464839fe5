//! Mission and target domain model.
//!
//! # Responsibility
//! - Define mission/target records and mission status state machine values.
//! - Normalize mission creation and target inputs.
//!
//! # Invariants
//! - A mission owns at least one target from creation onwards.
//! - `status == Assigned` iff `assigned_cat_id.is_some()`.
//! - `status == Completed` implies every owned target is completed.
//! - A target's `mission_id` never changes.

use super::cat::CatId;
use super::validation::{optional_text, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a mission.
pub type MissionId = Uuid;

/// Stable identifier for a mission target.
pub type TargetId = Uuid;

/// Mission lifecycle state.
///
/// Transitions: `Unassigned -> Assigned` (assign), `Assigned -> Unassigned`
/// (unassign), `Assigned -> Completed` (last target completed).
/// `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    Unassigned,
    Assigned,
    Completed,
}

impl MissionStatus {
    /// Stable storage value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unassigned => "unassigned",
            Self::Assigned => "assigned",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unassigned" => Some(Self::Unassigned),
            "assigned" => Some(Self::Assigned),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Persisted mission with its owned targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    pub id: MissionId,
    pub description: String,
    pub status: MissionStatus,
    pub assigned_cat_id: Option<CatId>,
    /// Owned targets in insertion order.
    pub targets: Vec<Target>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Mission {
    pub fn is_completed(&self) -> bool {
        self.status == MissionStatus::Completed
    }

    /// Returns whether every owned target is marked completed.
    ///
    /// Vacuously true for a mission without targets, which storage never
    /// produces.
    pub fn all_targets_completed(&self) -> bool {
        self.targets.iter().all(|target| target.is_completed)
    }
}

/// Persisted mission target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    /// Owning mission, fixed at creation.
    pub mission_id: MissionId,
    pub name: String,
    pub country: String,
    pub notes: Option<String>,
    /// Monotonic: once `true`, never reverts.
    pub is_completed: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for one target, either at mission creation or when added later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTarget {
    pub name: String,
    pub country: String,
    pub notes: Option<String>,
}

impl NewTarget {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Returns a trimmed copy; blank notes collapse to `None`.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: require_text("target.name", &self.name)?,
            country: require_text("target.country", &self.country)?,
            notes: optional_text(self.notes.as_deref()),
        })
    }
}

/// Input for creating a mission together with its targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMission {
    pub description: String,
    pub targets: Vec<NewTarget>,
}

impl NewMission {
    pub fn new(description: impl Into<String>, targets: Vec<NewTarget>) -> Self {
        Self {
            description: description.into(),
            targets,
        }
    }

    /// Returns a normalized copy.
    ///
    /// # Errors
    /// - `MissingTargets` when `targets` is empty.
    /// - The first target field that fails validation.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        if self.targets.is_empty() {
            return Err(ValidationError::MissingTargets);
        }
        let targets = self
            .targets
            .iter()
            .map(NewTarget::normalized)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            description: self.description.trim().to_string(),
            targets,
        })
    }
}

/// Descriptive mission fields a caller may change.
///
/// Status and target completion are derived and cannot be set here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionUpdate {
    pub description: Option<String>,
}

impl MissionUpdate {
    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
        }
    }

    /// Returns a trimmed copy.
    ///
    /// # Errors
    /// - `EmptyUpdate` when no field is set.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        match &self.description {
            Some(description) => Ok(Self {
                description: Some(description.trim().to_string()),
            }),
            None => Err(ValidationError::EmptyUpdate),
        }
    }
}
