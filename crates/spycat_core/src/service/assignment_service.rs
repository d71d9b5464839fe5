//! Assignment coordination use-case service.
//!
//! # Invariants
//! - A cat holds at most one mission and a mission at most one cat.
//! - Both sides of the link change in one transaction.

use crate::error::{CoreError, CoreResult};
use crate::logging::log_failure;
use crate::model::cat::CatId;
use crate::model::mission::MissionId;
use crate::repo::assignment_repo::{Assignment, AssignmentRepository};
use log::info;

/// Assignment facade over an `AssignmentRepository`.
pub struct AssignmentCoordinator<R: AssignmentRepository> {
    repo: R,
}

impl<R: AssignmentRepository> AssignmentCoordinator<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Assigns a free cat to an `unassigned` mission.
    ///
    /// A mission whose targets are already all completed completes in the
    /// same transaction and the cat is released again. `Ok` therefore does
    /// not imply `assigned`: callers must read `assignment.mission.status`
    /// (and `assignment.cat.mission_id`) for the resulting state.
    ///
    /// # Errors
    /// Checked in order: `NotFound(Cat)`, `NotFound(Mission)`,
    /// `Conflict(CatAlreadyAssigned)`, then `Conflict(MissionAlreadyAssigned)`
    /// or `Conflict(MissionAlreadyCompleted)`.
    pub fn assign(&self, cat_id: CatId, mission_id: MissionId) -> CoreResult<Assignment> {
        let assignment = self
            .repo
            .assign(cat_id, mission_id)
            .map_err(CoreError::from)
            .inspect_err(|err| log_failure("mission_assign", "assignment", err))?;
        info!(
            "event=mission_assign module=assignment status=ok cat_id={cat_id} mission_id={mission_id} mission_status={}",
            assignment.mission.status.as_str()
        );
        Ok(assignment)
    }

    /// Releases an `assigned` mission and its cat.
    pub fn unassign(&self, mission_id: MissionId) -> CoreResult<Assignment> {
        let assignment = self
            .repo
            .unassign(mission_id)
            .map_err(CoreError::from)
            .inspect_err(|err| log_failure("mission_unassign", "assignment", err))?;
        info!(
            "event=mission_unassign module=assignment status=ok cat_id={} mission_id={mission_id}",
            assignment.cat.id
        );
        Ok(assignment)
    }
}
