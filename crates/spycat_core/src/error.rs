//! Core error taxonomy.
//!
//! # Responsibility
//! - Give every service failure one stable `ErrorKind` the request layer can
//!   map to a response category.
//! - Keep state-machine conflicts and missing entities precise enough for
//!   diagnostics.
//!
//! # Invariants
//! - Only `ErrorKind::ExternalLookup` is retryable.
//! - A returned error means no write of the failed operation was committed.

use crate::breed::BreedLookupError;
use crate::model::cat::CatId;
use crate::model::mission::{MissionId, TargetId};
use crate::model::validation::ValidationError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CoreResult<T> = Result<T, CoreError>;

/// Reference to one persisted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Cat(CatId),
    Mission(MissionId),
    Target(TargetId),
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cat(id) => write!(f, "cat {id}"),
            Self::Mission(id) => write!(f, "mission {id}"),
            Self::Target(id) => write!(f, "target {id}"),
        }
    }
}

/// Violated state-machine precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateConflict {
    /// Cat already holds another mission.
    CatAlreadyAssigned {
        cat_id: CatId,
        mission_id: MissionId,
    },
    /// Mission is already held by a cat.
    MissionAlreadyAssigned {
        mission_id: MissionId,
        cat_id: CatId,
    },
    /// Mission is completed and therefore frozen.
    MissionAlreadyCompleted(MissionId),
    /// Unassign requested on a mission nobody holds.
    MissionNotAssigned(MissionId),
    /// Mission deletion blocked while a cat is linked.
    MissionHasAssignedCat {
        mission_id: MissionId,
        cat_id: CatId,
    },
    /// Cat deletion blocked while it holds a mission.
    CatHasActiveMission {
        cat_id: CatId,
        mission_id: MissionId,
    },
    /// Notes of a completed target are frozen.
    TargetAlreadyCompleted(TargetId),
    /// Stored breed changed between breed validation and the write.
    CatBreedChanged(CatId),
}

impl Display for StateConflict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CatAlreadyAssigned { cat_id, mission_id } => {
                write!(f, "cat {cat_id} already has active mission {mission_id}")
            }
            Self::MissionAlreadyAssigned { mission_id, cat_id } => {
                write!(f, "mission {mission_id} is already assigned to cat {cat_id}")
            }
            Self::MissionAlreadyCompleted(id) => write!(f, "mission {id} is already completed"),
            Self::MissionNotAssigned(id) => write!(f, "mission {id} is not assigned"),
            Self::MissionHasAssignedCat { mission_id, cat_id } => write!(
                f,
                "mission {mission_id} cannot be deleted while assigned to cat {cat_id}"
            ),
            Self::CatHasActiveMission { cat_id, mission_id } => write!(
                f,
                "cat {cat_id} cannot be deleted while holding mission {mission_id}"
            ),
            Self::TargetAlreadyCompleted(id) => write!(f, "target {id} is already completed"),
            Self::CatBreedChanged(id) => {
                write!(f, "breed of cat {id} changed during update; retry with fresh data")
            }
        }
    }
}

/// Stable failure category exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    ExternalLookup,
    Storage,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::ExternalLookup => "external_lookup",
            Self::Storage => "storage",
        }
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::ExternalLookup)
    }
}

/// Error returned by every core service operation.
#[derive(Debug)]
pub enum CoreError {
    NotFound(EntityRef),
    Validation(ValidationError),
    Conflict(StateConflict),
    /// Breed catalog unreachable or answered with an unusable payload.
    ExternalLookup(BreedLookupError),
    /// Database failure or corrupted persisted data.
    Storage(RepoError),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::ExternalLookup(_) => ErrorKind::ExternalLookup,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(entity) => write!(f, "{entity} not found"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Conflict(conflict) => write!(f, "{conflict}"),
            Self::ExternalLookup(err) => write!(f, "breed lookup failed: {err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::ExternalLookup(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::NotFound(_) | Self::Conflict(_) => None,
        }
    }
}

impl From<ValidationError> for CoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<BreedLookupError> for CoreError {
    fn from(value: BreedLookupError) -> Self {
        Self::ExternalLookup(value)
    }
}

impl From<StateConflict> for CoreError {
    fn from(value: StateConflict) -> Self {
        Self::Conflict(value)
    }
}

impl From<RepoError> for CoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(entity) => Self::NotFound(entity),
            RepoError::Conflict(conflict) => Self::Conflict(conflict),
            other => Self::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreError, EntityRef, ErrorKind, StateConflict};
    use crate::breed::BreedLookupError;
    use crate::repo::RepoError;
    use uuid::Uuid;

    #[test]
    fn repo_semantic_errors_keep_their_kind() {
        let id = Uuid::new_v4();
        let err = CoreError::from(RepoError::NotFound(EntityRef::Mission(id)));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = CoreError::from(RepoError::Conflict(StateConflict::MissionAlreadyCompleted(
            id,
        )));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = CoreError::from(RepoError::InvalidData("bad status".to_string()));
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[test]
    fn only_external_lookup_is_retryable() {
        let err = CoreError::from(BreedLookupError::Unreachable("timeout".to_string()));
        assert!(err.is_retryable());
        for kind in [
            ErrorKind::NotFound,
            ErrorKind::Validation,
            ErrorKind::Conflict,
            ErrorKind::Storage,
        ] {
            assert!(!kind.is_retryable(), "{} must not be retryable", kind.as_str());
        }
    }
}
