//! Mission lifecycle use-case service.
//!
//! # Responsibility
//! - Create missions atomically with their targets.
//! - Expose descriptive updates, deletion and completion recomputation.
//!
//! # Invariants
//! - Missions are never created without targets.
//! - Completed missions reject descriptive updates.
//! - Deleting a mission removes its targets; assigned missions are kept.

use crate::error::{CoreError, CoreResult, EntityRef};
use crate::logging::log_failure;
use crate::model::mission::{Mission, MissionId, MissionUpdate, NewMission};
use crate::repo::mission_repo::MissionRepository;
use crate::repo::ListQuery;
use log::info;

/// Mission lifecycle facade over a `MissionRepository`.
pub struct MissionLifecycle<R: MissionRepository> {
    repo: R,
}

impl<R: MissionRepository> MissionLifecycle<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one `unassigned` mission with all of its targets.
    ///
    /// # Errors
    /// - `Validation(MissingTargets)` for an empty target list.
    /// - `Validation(Blank)` for a blank target name or country.
    pub fn create_mission(&self, mission: &NewMission) -> CoreResult<Mission> {
        self.try_create_mission(mission)
            .inspect_err(|err| log_failure("mission_create", "mission", err))
    }

    pub fn get_mission(&self, id: MissionId) -> CoreResult<Mission> {
        self.repo
            .get_mission(id)?
            .ok_or(CoreError::NotFound(EntityRef::Mission(id)))
    }

    /// Lists missions in creation order, each with its targets.
    pub fn list_missions(&self, query: &ListQuery) -> CoreResult<Vec<Mission>> {
        Ok(self.repo.list_missions(query)?)
    }

    /// Updates descriptive fields of a non-completed mission.
    pub fn update_mission(&self, id: MissionId, update: &MissionUpdate) -> CoreResult<Mission> {
        self.try_update_mission(id, update)
            .inspect_err(|err| log_failure("mission_update", "mission", err))
    }

    /// Deletes an unlinked mission together with its targets.
    ///
    /// # Errors
    /// - `Conflict(MissionHasAssignedCat)` while a cat is linked.
    pub fn delete_mission(&self, id: MissionId) -> CoreResult<()> {
        self.repo
            .delete_mission(id)
            .map_err(CoreError::from)
            .inspect_err(|err| log_failure("mission_delete", "mission", err))?;
        info!("event=mission_delete module=mission status=ok mission_id={id}");
        Ok(())
    }

    /// Re-derives mission status from its targets.
    ///
    /// A no-op unless the mission is `assigned` and every target is done.
    pub fn recompute_completion(&self, id: MissionId) -> CoreResult<Mission> {
        self.repo
            .recompute_completion(id)
            .map_err(CoreError::from)
            .inspect_err(|err| log_failure("mission_recompute", "mission", err))
    }

    fn try_create_mission(&self, mission: &NewMission) -> CoreResult<Mission> {
        let normalized = mission.normalized()?;
        let created = self.repo.create_mission(&normalized)?;
        info!(
            "event=mission_create module=mission status=ok mission_id={} targets={}",
            created.id,
            created.targets.len()
        );
        Ok(created)
    }

    fn try_update_mission(&self, id: MissionId, update: &MissionUpdate) -> CoreResult<Mission> {
        let normalized = update.normalized()?;
        let description = normalized.description.unwrap_or_default();
        let updated = self.repo.update_description(id, &description)?;
        info!("event=mission_update module=mission status=ok mission_id={id}");
        Ok(updated)
    }
}
