//! Core domain logic for the Spy Cat Agency.
//! This crate is the single source of truth for mission assignment and
//! completion invariants.

pub mod breed;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use breed::{
    BreedCatalog, BreedLookup, BreedLookupError, BreedValidator, BreedVerdict, HttpBreedCatalog,
    StaticBreedCatalog,
};
pub use config::{BreedCatalogConfig, ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use error::{CoreError, CoreResult, EntityRef, ErrorKind, StateConflict};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::cat::{Cat, CatId, CatPatch, NewCat};
pub use model::mission::{
    Mission, MissionId, MissionStatus, MissionUpdate, NewMission, NewTarget, Target, TargetId,
};
pub use model::validation::ValidationError;
pub use repo::assignment_repo::{Assignment, AssignmentRepository, SqliteAssignmentRepository};
pub use repo::cat_repo::{CatRepository, SqliteCatRepository};
pub use repo::mission_repo::{MissionRepository, SqliteMissionRepository};
pub use repo::target_repo::{SqliteTargetRepository, TargetCompletion, TargetRepository};
pub use repo::{ListQuery, RepoError, RepoResult};
pub use service::assignment_service::AssignmentCoordinator;
pub use service::cat_service::CatService;
pub use service::mission_service::MissionLifecycle;
pub use service::target_service::TargetLedger;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
