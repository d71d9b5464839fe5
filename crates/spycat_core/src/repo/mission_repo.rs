//! Mission repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist missions together with their owned targets.
//! - Derive mission completion from target state.
//!
//! # Invariants
//! - A mission and its initial targets are written in one transaction.
//! - Completion only moves `assigned -> completed`, and releases the cat in
//!   the same transaction.
//! - Missions linked to a cat are never deleted.

use super::target_repo::{insert_target, load_targets};
use super::{begin_write, parse_optional_uuid, parse_uuid, ListQuery, RepoError, RepoResult};
use crate::db::ensure_schema_ready;
use crate::error::{EntityRef, StateConflict};
use crate::model::cat::CatId;
use crate::model::mission::{Mission, MissionId, MissionStatus, NewMission};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const MISSION_SELECT_SQL: &str = "SELECT
    id,
    description,
    status,
    assigned_cat_id,
    created_at,
    updated_at
FROM missions";

/// Status columns of one mission, read without its targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MissionState {
    pub status: MissionStatus,
    pub assigned_cat_id: Option<CatId>,
}

/// Repository interface for missions.
pub trait MissionRepository {
    /// Creates one `unassigned` mission and all of its targets atomically.
    fn create_mission(&self, mission: &NewMission) -> RepoResult<Mission>;
    fn get_mission(&self, id: MissionId) -> RepoResult<Option<Mission>>;
    fn list_missions(&self, query: &ListQuery) -> RepoResult<Vec<Mission>>;
    /// Replaces the description of a non-completed mission.
    fn update_description(&self, id: MissionId, description: &str) -> RepoResult<Mission>;
    /// Deletes a mission and its targets unless a cat is linked.
    fn delete_mission(&self, id: MissionId) -> RepoResult<()>;
    /// Re-derives completion from target state and returns the mission.
    fn recompute_completion(&self, id: MissionId) -> RepoResult<Mission>;
    fn count_missions(&self) -> RepoResult<u64>;
}

/// SQLite-backed mission repository.
pub struct SqliteMissionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMissionRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl MissionRepository for SqliteMissionRepository<'_> {
    fn create_mission(&self, mission: &NewMission) -> RepoResult<Mission> {
        let id = Uuid::new_v4();
        let tx = begin_write(self.conn)?;
        tx.execute(
            "INSERT INTO missions (id, description, status, assigned_cat_id)
             VALUES (?1, ?2, 'unassigned', NULL);",
            params![id.to_string(), mission.description.as_str()],
        )?;
        for (seq, target) in mission.targets.iter().enumerate() {
            insert_target(&tx, id, seq as i64, target)?;
        }

        let created = load_required_mission(&tx, id)?;
        tx.commit()?;
        Ok(created)
    }

    fn get_mission(&self, id: MissionId) -> RepoResult<Option<Mission>> {
        load_mission(self.conn, id)
    }

    fn list_missions(&self, query: &ListQuery) -> RepoResult<Vec<Mission>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MISSION_SELECT_SQL}
             ORDER BY created_at ASC, rowid ASC
             LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![
            i64::from(query.applied_limit()),
            i64::from(query.offset)
        ])?;

        let mut missions = Vec::new();
        while let Some(row) = rows.next()? {
            missions.push(parse_mission_row(row)?);
        }
        drop(rows);

        for mission in &mut missions {
            mission.targets = load_targets(self.conn, mission.id)?;
        }
        Ok(missions)
    }

    fn update_description(&self, id: MissionId, description: &str) -> RepoResult<Mission> {
        let tx = begin_write(self.conn)?;
        let state = load_required_state(&tx, id)?;
        if state.status == MissionStatus::Completed {
            return Err(StateConflict::MissionAlreadyCompleted(id).into());
        }

        tx.execute(
            "UPDATE missions
             SET description = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), description],
        )?;

        let updated = load_required_mission(&tx, id)?;
        tx.commit()?;
        Ok(updated)
    }

    fn delete_mission(&self, id: MissionId) -> RepoResult<()> {
        let tx = begin_write(self.conn)?;
        let state = load_required_state(&tx, id)?;
        if let Some(cat_id) = state.assigned_cat_id {
            return Err(StateConflict::MissionHasAssignedCat {
                mission_id: id,
                cat_id,
            }
            .into());
        }

        // Owned targets go with the mission through ON DELETE CASCADE.
        tx.execute("DELETE FROM missions WHERE id = ?1;", [id.to_string()])?;
        tx.commit()?;
        Ok(())
    }

    fn recompute_completion(&self, id: MissionId) -> RepoResult<Mission> {
        let tx = begin_write(self.conn)?;
        recompute_completion_in(&tx, id)?;
        let mission = load_required_mission(&tx, id)?;
        tx.commit()?;
        Ok(mission)
    }

    fn count_missions(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM missions;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative mission count `{count}`")))
    }
}

/// Derives mission completion inside an open write transaction.
///
/// An `assigned` mission whose targets are all completed becomes
/// `completed`, and both sides of the cat link are cleared. Any other state
/// is returned unchanged.
pub(crate) fn recompute_completion_in(
    conn: &Connection,
    id: MissionId,
) -> RepoResult<MissionStatus> {
    let state = load_required_state(conn, id)?;
    let cat_id = match (state.status, state.assigned_cat_id) {
        (MissionStatus::Assigned, Some(cat_id)) => cat_id,
        (MissionStatus::Assigned, None) => {
            return Err(RepoError::InvalidData(format!(
                "mission {id} is assigned without a cat"
            )));
        }
        (status, _) => return Ok(status),
    };

    let (total, pending): (i64, i64) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(CASE WHEN is_completed = 0 THEN 1 ELSE 0 END), 0)
         FROM targets
         WHERE mission_id = ?1;",
        [id.to_string()],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    if total == 0 || pending > 0 {
        return Ok(MissionStatus::Assigned);
    }

    conn.execute(
        "UPDATE missions
         SET status = 'completed',
             assigned_cat_id = NULL,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1;",
        [id.to_string()],
    )?;
    conn.execute(
        "UPDATE cats
         SET mission_id = NULL,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1
           AND mission_id = ?2;",
        params![cat_id.to_string(), id.to_string()],
    )?;

    info!("event=mission_complete module=mission status=ok mission_id={id} cat_id={cat_id}");
    Ok(MissionStatus::Completed)
}

pub(crate) fn load_state(conn: &Connection, id: MissionId) -> RepoResult<Option<MissionState>> {
    let row: Option<(String, Option<String>)> = conn
        .query_row(
            "SELECT status, assigned_cat_id FROM missions WHERE id = ?1;",
            [id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    row.map(|(status, assigned_cat_id)| {
        Ok(MissionState {
            status: parse_status(&status)?,
            assigned_cat_id: parse_optional_uuid(assigned_cat_id, "missions.assigned_cat_id")?,
        })
    })
    .transpose()
}

pub(crate) fn load_required_state(conn: &Connection, id: MissionId) -> RepoResult<MissionState> {
    load_state(conn, id)?.ok_or(RepoError::NotFound(EntityRef::Mission(id)))
}

/// Loads one mission with its targets on any connection or open transaction.
pub(crate) fn load_mission(conn: &Connection, id: MissionId) -> RepoResult<Option<Mission>> {
    let mission = {
        let mut stmt = conn.prepare(&format!("{MISSION_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => parse_mission_row(row)?,
            None => return Ok(None),
        }
    };

    Ok(Some(Mission {
        targets: load_targets(conn, id)?,
        ..mission
    }))
}

pub(crate) fn load_required_mission(conn: &Connection, id: MissionId) -> RepoResult<Mission> {
    load_mission(conn, id)?.ok_or(RepoError::NotFound(EntityRef::Mission(id)))
}

fn parse_mission_row(row: &Row<'_>) -> RepoResult<Mission> {
    let id_text: String = row.get("id")?;
    let status_text: String = row.get("status")?;

    Ok(Mission {
        id: parse_uuid(&id_text, "missions.id")?,
        description: row.get("description")?,
        status: parse_status(&status_text)?,
        assigned_cat_id: parse_optional_uuid(
            row.get("assigned_cat_id")?,
            "missions.assigned_cat_id",
        )?,
        targets: Vec::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_status(value: &str) -> RepoResult<MissionStatus> {
    MissionStatus::parse(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid mission status `{value}` in missions.status"))
    })
}
