//! Target repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Add, read and complete targets of a mission.
//! - Cascade target completion into mission completion atomically.
//!
//! # Invariants
//! - Targets are listed in insertion order (`seq ASC`).
//! - Completion is monotonic; re-completing is a read-only no-op.
//! - No API deletes a single target.

use super::mission_repo::{load_required_state, recompute_completion_in};
use super::{begin_write, parse_flag, parse_uuid, RepoError, RepoResult};
use crate::db::ensure_schema_ready;
use crate::error::{EntityRef, StateConflict};
use crate::model::mission::{MissionId, MissionStatus, NewTarget, Target, TargetId};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const TARGET_SELECT_SQL: &str = "SELECT
    id,
    mission_id,
    name,
    country,
    notes,
    is_completed,
    created_at,
    updated_at
FROM targets";

/// Outcome of marking one target complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetCompletion {
    pub target: Target,
    /// Owning mission status after the cascade.
    pub mission_status: MissionStatus,
    /// `false` when the target was already completed and nothing was written.
    pub changed: bool,
}

/// Repository interface for mission targets.
pub trait TargetRepository {
    /// Appends one target to a non-completed mission.
    fn add_target(&self, mission_id: MissionId, target: &NewTarget) -> RepoResult<Target>;
    fn get_target(&self, id: TargetId) -> RepoResult<Option<Target>>;
    /// Lists targets of an existing mission in insertion order.
    fn list_targets(&self, mission_id: MissionId) -> RepoResult<Vec<Target>>;
    /// Marks one target completed and recomputes mission completion.
    fn mark_target_complete(&self, id: TargetId) -> RepoResult<TargetCompletion>;
    /// Replaces notes of a target that is not completed.
    fn update_target_notes(&self, id: TargetId, notes: Option<&str>) -> RepoResult<Target>;
}

/// SQLite-backed target repository.
pub struct SqliteTargetRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTargetRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TargetRepository for SqliteTargetRepository<'_> {
    fn add_target(&self, mission_id: MissionId, target: &NewTarget) -> RepoResult<Target> {
        let tx = begin_write(self.conn)?;
        let state = load_required_state(&tx, mission_id)?;
        if state.status == MissionStatus::Completed {
            return Err(StateConflict::MissionAlreadyCompleted(mission_id).into());
        }

        let seq: i64 = tx.query_row(
            "SELECT COALESCE(MAX(seq), -1) + 1
             FROM targets
             WHERE mission_id = ?1;",
            [mission_id.to_string()],
            |row| row.get(0),
        )?;
        let id = insert_target(&tx, mission_id, seq, target)?;
        tx.execute(
            "UPDATE missions
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [mission_id.to_string()],
        )?;

        let created = load_required_target(&tx, id)?;
        tx.commit()?;
        Ok(created)
    }

    fn get_target(&self, id: TargetId) -> RepoResult<Option<Target>> {
        load_target(self.conn, id)
    }

    fn list_targets(&self, mission_id: MissionId) -> RepoResult<Vec<Target>> {
        load_required_state(self.conn, mission_id)?;
        load_targets(self.conn, mission_id)
    }

    fn mark_target_complete(&self, id: TargetId) -> RepoResult<TargetCompletion> {
        let tx = begin_write(self.conn)?;
        let target = load_required_target(&tx, id)?;
        if target.is_completed {
            let state = load_required_state(&tx, target.mission_id)?;
            return Ok(TargetCompletion {
                target,
                mission_status: state.status,
                changed: false,
            });
        }

        tx.execute(
            "UPDATE targets
             SET is_completed = 1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [id.to_string()],
        )?;
        let mission_status = recompute_completion_in(&tx, target.mission_id)?;

        let target = load_required_target(&tx, id)?;
        tx.commit()?;
        Ok(TargetCompletion {
            target,
            mission_status,
            changed: true,
        })
    }

    fn update_target_notes(&self, id: TargetId, notes: Option<&str>) -> RepoResult<Target> {
        let tx = begin_write(self.conn)?;
        let target = load_required_target(&tx, id)?;
        if target.is_completed {
            return Err(StateConflict::TargetAlreadyCompleted(id).into());
        }
        let state = load_required_state(&tx, target.mission_id)?;
        if state.status == MissionStatus::Completed {
            return Err(StateConflict::MissionAlreadyCompleted(target.mission_id).into());
        }

        tx.execute(
            "UPDATE targets
             SET notes = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), notes],
        )?;

        let updated = load_required_target(&tx, id)?;
        tx.commit()?;
        Ok(updated)
    }
}

/// Inserts one incomplete target; the caller owns the transaction.
pub(crate) fn insert_target(
    conn: &Connection,
    mission_id: MissionId,
    seq: i64,
    target: &NewTarget,
) -> RepoResult<TargetId> {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO targets (
            id,
            mission_id,
            seq,
            name,
            country,
            notes,
            is_completed
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0);",
        params![
            id.to_string(),
            mission_id.to_string(),
            seq,
            target.name.as_str(),
            target.country.as_str(),
            target.notes.as_deref(),
        ],
    )?;
    Ok(id)
}

pub(crate) fn load_targets(conn: &Connection, mission_id: MissionId) -> RepoResult<Vec<Target>> {
    let mut stmt = conn.prepare(&format!(
        "{TARGET_SELECT_SQL}
         WHERE mission_id = ?1
         ORDER BY seq ASC;"
    ))?;
    let mut rows = stmt.query([mission_id.to_string()])?;

    let mut targets = Vec::new();
    while let Some(row) = rows.next()? {
        targets.push(parse_target_row(row)?);
    }
    Ok(targets)
}

fn load_target(conn: &Connection, id: TargetId) -> RepoResult<Option<Target>> {
    let mut stmt = conn.prepare(&format!("{TARGET_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_target_row(row)?));
    }
    Ok(None)
}

fn load_required_target(conn: &Connection, id: TargetId) -> RepoResult<Target> {
    load_target(conn, id)?.ok_or(RepoError::NotFound(EntityRef::Target(id)))
}

fn parse_target_row(row: &Row<'_>) -> RepoResult<Target> {
    let id_text: String = row.get("id")?;
    let mission_text: String = row.get("mission_id")?;

    Ok(Target {
        id: parse_uuid(&id_text, "targets.id")?,
        mission_id: parse_uuid(&mission_text, "targets.mission_id")?,
        name: row.get("name")?,
        country: row.get("country")?,
        notes: row.get("notes")?,
        is_completed: parse_flag(row.get("is_completed")?, "targets.is_completed")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
