//! Input validation errors shared by cat and mission inputs.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input rejected before any persistence work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty after trim.
    Blank { field: &'static str },
    /// Numeric field is outside its accepted range.
    OutOfRange {
        field: &'static str,
        reason: &'static str,
    },
    /// Mission creation requires at least one target.
    MissingTargets,
    /// Breed is absent from the breed catalog.
    BreedNotRecognized(String),
    /// Update request carries no fields.
    EmptyUpdate,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank { field } => write!(f, "`{field}` must not be blank"),
            Self::OutOfRange { field, reason } => write!(f, "`{field}` {reason}"),
            Self::MissingTargets => write!(f, "mission requires at least one target"),
            Self::BreedNotRecognized(breed) => write!(f, "breed `{breed}` is not recognized"),
            Self::EmptyUpdate => write!(f, "update request has no fields to change"),
        }
    }
}

impl Error for ValidationError {}

/// Trims `value` and rejects it when nothing remains.
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Blank { field });
    }
    Ok(trimmed.to_string())
}

/// Trims optional free text, mapping blank input to `None`.
pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
}
