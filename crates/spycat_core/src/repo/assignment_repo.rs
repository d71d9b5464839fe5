//! Cat/mission assignment link persistence.
//!
//! # Responsibility
//! - Link and unlink a cat and a mission in one write transaction.
//! - Check assignment preconditions under the write lock, in a fixed order.
//!
//! # Invariants
//! - `cats.mission_id` and `missions.assigned_cat_id` are always written
//!   together and never observed half-updated.
//! - Only `unassigned` missions and mission-free cats are linked.

use super::cat_repo::load_cat;
use super::mission_repo::{load_required_mission, load_required_state, recompute_completion_in};
use super::{begin_write, RepoError, RepoResult};
use crate::db::ensure_schema_ready;
use crate::error::{EntityRef, StateConflict};
use crate::model::cat::{Cat, CatId};
use crate::model::mission::{Mission, MissionId, MissionStatus};
use rusqlite::{params, Connection};

/// Both sides of an assignment link after a write.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub cat: Cat,
    pub mission: Mission,
}

/// Repository interface for the cat/mission link.
pub trait AssignmentRepository {
    /// Links `cat_id` and `mission_id`.
    ///
    /// Preconditions are checked in order: cat exists, mission exists, cat
    /// has no mission, mission is `unassigned`.
    fn assign(&self, cat_id: CatId, mission_id: MissionId) -> RepoResult<Assignment>;
    /// Releases an `assigned` mission back to `unassigned`.
    fn unassign(&self, mission_id: MissionId) -> RepoResult<Assignment>;
}

/// SQLite-backed assignment repository.
pub struct SqliteAssignmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAssignmentRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl AssignmentRepository for SqliteAssignmentRepository<'_> {
    fn assign(&self, cat_id: CatId, mission_id: MissionId) -> RepoResult<Assignment> {
        let tx = begin_write(self.conn)?;

        let cat = load_cat(&tx, cat_id)?.ok_or(RepoError::NotFound(EntityRef::Cat(cat_id)))?;
        let state = load_required_state(&tx, mission_id)?;
        if let Some(current) = cat.mission_id {
            return Err(StateConflict::CatAlreadyAssigned {
                cat_id,
                mission_id: current,
            }
            .into());
        }
        match (state.status, state.assigned_cat_id) {
            (MissionStatus::Unassigned, _) => {}
            (MissionStatus::Assigned, Some(holder)) => {
                return Err(StateConflict::MissionAlreadyAssigned {
                    mission_id,
                    cat_id: holder,
                }
                .into());
            }
            (MissionStatus::Assigned, None) => {
                return Err(RepoError::InvalidData(format!(
                    "mission {mission_id} is assigned without a cat"
                )));
            }
            (MissionStatus::Completed, _) => {
                return Err(StateConflict::MissionAlreadyCompleted(mission_id).into());
            }
        }

        tx.execute(
            "UPDATE missions
             SET status = 'assigned',
                 assigned_cat_id = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![mission_id.to_string(), cat_id.to_string()],
        )?;
        tx.execute(
            "UPDATE cats
             SET mission_id = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![cat_id.to_string(), mission_id.to_string()],
        )?;
        // Targets may all have been completed while the mission sat unassigned.
        recompute_completion_in(&tx, mission_id)?;

        let assignment = load_assignment(&tx, cat_id, mission_id)?;
        tx.commit()?;
        Ok(assignment)
    }

    fn unassign(&self, mission_id: MissionId) -> RepoResult<Assignment> {
        let tx = begin_write(self.conn)?;

        let state = load_required_state(&tx, mission_id)?;
        let cat_id = match (state.status, state.assigned_cat_id) {
            (MissionStatus::Assigned, Some(cat_id)) => cat_id,
            (MissionStatus::Completed, _) => {
                return Err(StateConflict::MissionAlreadyCompleted(mission_id).into());
            }
            _ => return Err(StateConflict::MissionNotAssigned(mission_id).into()),
        };

        tx.execute(
            "UPDATE missions
             SET status = 'unassigned',
                 assigned_cat_id = NULL,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [mission_id.to_string()],
        )?;
        let released = tx.execute(
            "UPDATE cats
             SET mission_id = NULL,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND mission_id = ?2;",
            params![cat_id.to_string(), mission_id.to_string()],
        )?;
        if released != 1 {
            return Err(RepoError::InvalidData(format!(
                "cat {cat_id} does not point back at mission {mission_id}"
            )));
        }

        let assignment = load_assignment(&tx, cat_id, mission_id)?;
        tx.commit()?;
        Ok(assignment)
    }
}

fn load_assignment(
    conn: &Connection,
    cat_id: CatId,
    mission_id: MissionId,
) -> RepoResult<Assignment> {
    let cat = load_cat(conn, cat_id)?.ok_or(RepoError::NotFound(EntityRef::Cat(cat_id)))?;
    let mission = load_required_mission(conn, mission_id)?;
    Ok(Assignment { cat, mission })
}
