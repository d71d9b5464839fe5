//! Target ledger use-case service.
//!
//! # Responsibility
//! - Add, list and complete mission targets.
//! - Keep target notes editable until the target or mission is done.
//!
//! # Invariants
//! - Completion is monotonic and idempotent.
//! - Completing the last pending target of an assigned mission completes the
//!   mission in the same transaction.

use crate::error::{CoreError, CoreResult, EntityRef};
use crate::logging::log_failure;
use crate::model::mission::{MissionId, NewTarget, Target, TargetId};
use crate::model::validation::optional_text;
use crate::repo::target_repo::TargetRepository;
use log::info;

/// Target ledger facade over a `TargetRepository`.
pub struct TargetLedger<R: TargetRepository> {
    repo: R,
}

impl<R: TargetRepository> TargetLedger<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Appends a target to a mission that is not completed.
    pub fn add_target(&self, mission_id: MissionId, target: &NewTarget) -> CoreResult<Target> {
        self.try_add_target(mission_id, target)
            .inspect_err(|err| log_failure("target_add", "target", err))
    }

    pub fn get_target(&self, id: TargetId) -> CoreResult<Target> {
        self.repo
            .get_target(id)?
            .ok_or(CoreError::NotFound(EntityRef::Target(id)))
    }

    /// Lists mission targets in insertion order.
    pub fn list_targets(&self, mission_id: MissionId) -> CoreResult<Vec<Target>> {
        Ok(self.repo.list_targets(mission_id)?)
    }

    /// Marks a target completed.
    ///
    /// Repeating the call on a completed target returns it unchanged.
    pub fn mark_complete(&self, id: TargetId) -> CoreResult<Target> {
        let completion = self
            .repo
            .mark_target_complete(id)
            .map_err(CoreError::from)
            .inspect_err(|err| log_failure("target_complete", "target", err))?;
        if completion.changed {
            info!(
                "event=target_complete module=target status=ok target_id={id} mission_status={}",
                completion.mission_status.as_str()
            );
        }
        Ok(completion.target)
    }

    /// Replaces target notes; blank input clears them.
    ///
    /// # Errors
    /// - `Conflict(TargetAlreadyCompleted)` or
    ///   `Conflict(MissionAlreadyCompleted)` once notes are frozen.
    pub fn update_target_notes(&self, id: TargetId, notes: Option<&str>) -> CoreResult<Target> {
        let notes = optional_text(notes);
        let updated = self
            .repo
            .update_target_notes(id, notes.as_deref())
            .map_err(CoreError::from)
            .inspect_err(|err| log_failure("target_notes_update", "target", err))?;
        info!("event=target_notes_update module=target status=ok target_id={id}");
        Ok(updated)
    }

    fn try_add_target(&self, mission_id: MissionId, target: &NewTarget) -> CoreResult<Target> {
        let normalized = target.normalized()?;
        let created = self.repo.add_target(mission_id, &normalized)?;
        info!(
            "event=target_add module=target status=ok mission_id={mission_id} target_id={}",
            created.id
        );
        Ok(created)
    }
}
