//! Cat repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `cats` table.
//! - Block deletion of cats that hold a mission.
//!
//! # Invariants
//! - `cats.mission_id` is never written here; assignment owns it.
//! - Inputs are expected to be normalized by the service layer.

use super::{begin_write, parse_optional_uuid, parse_uuid, ListQuery, RepoError, RepoResult};
use crate::db::ensure_schema_ready;
use crate::error::{EntityRef, StateConflict};
use crate::model::cat::{Cat, CatId, CatPatch, NewCat};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const CAT_SELECT_SQL: &str = "SELECT
    id,
    name,
    experience_years,
    breed,
    salary,
    mission_id,
    created_at,
    updated_at
FROM cats";

/// Repository interface for spy cat records.
pub trait CatRepository {
    /// Inserts one cat; `cat.breed` must already be the accepted spelling.
    fn create_cat(&self, cat: &NewCat) -> RepoResult<Cat>;
    fn get_cat(&self, id: CatId) -> RepoResult<Option<Cat>>;
    fn list_cats(&self, query: &ListQuery) -> RepoResult<Vec<Cat>>;
    /// Applies a normalized patch and returns the updated record.
    ///
    /// `observed_breed` is the breed the caller validated against; a
    /// different stored breed aborts with `CatBreedChanged`.
    fn update_cat(&self, id: CatId, patch: &CatPatch, observed_breed: &str) -> RepoResult<Cat>;
    /// Deletes one cat unless it holds a mission.
    fn delete_cat(&self, id: CatId) -> RepoResult<()>;
    fn count_cats(&self) -> RepoResult<u64>;
}

/// SQLite-backed cat repository.
pub struct SqliteCatRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CatRepository for SqliteCatRepository<'_> {
    fn create_cat(&self, cat: &NewCat) -> RepoResult<Cat> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO cats (
                id,
                name,
                experience_years,
                breed,
                salary,
                mission_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, NULL);",
            params![
                id.to_string(),
                cat.name.as_str(),
                i64::from(cat.experience_years),
                cat.breed.as_str(),
                cat.salary,
            ],
        )?;
        load_cat(self.conn, id)?.ok_or(RepoError::NotFound(EntityRef::Cat(id)))
    }

    fn get_cat(&self, id: CatId) -> RepoResult<Option<Cat>> {
        load_cat(self.conn, id)
    }

    fn list_cats(&self, query: &ListQuery) -> RepoResult<Vec<Cat>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CAT_SELECT_SQL}
             ORDER BY created_at ASC, rowid ASC
             LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![
            i64::from(query.applied_limit()),
            i64::from(query.offset)
        ])?;

        let mut cats = Vec::new();
        while let Some(row) = rows.next()? {
            cats.push(parse_cat_row(row)?);
        }
        Ok(cats)
    }

    fn update_cat(&self, id: CatId, patch: &CatPatch, observed_breed: &str) -> RepoResult<Cat> {
        let tx = begin_write(self.conn)?;
        let mut cat = load_cat(&tx, id)?.ok_or(RepoError::NotFound(EntityRef::Cat(id)))?;
        if cat.breed != observed_breed {
            return Err(StateConflict::CatBreedChanged(id).into());
        }
        patch.apply_to(&mut cat);

        tx.execute(
            "UPDATE cats
             SET name = ?2,
                 experience_years = ?3,
                 breed = ?4,
                 salary = ?5,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                id.to_string(),
                cat.name.as_str(),
                i64::from(cat.experience_years),
                cat.breed.as_str(),
                cat.salary,
            ],
        )?;

        let updated = load_cat(&tx, id)?.ok_or(RepoError::NotFound(EntityRef::Cat(id)))?;
        tx.commit()?;
        Ok(updated)
    }

    fn delete_cat(&self, id: CatId) -> RepoResult<()> {
        let tx = begin_write(self.conn)?;
        let cat = load_cat(&tx, id)?.ok_or(RepoError::NotFound(EntityRef::Cat(id)))?;
        if let Some(mission_id) = cat.mission_id {
            return Err(StateConflict::CatHasActiveMission {
                cat_id: id,
                mission_id,
            }
            .into());
        }

        tx.execute("DELETE FROM cats WHERE id = ?1;", [id.to_string()])?;
        tx.commit()?;
        Ok(())
    }

    fn count_cats(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM cats;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative cat count `{count}`")))
    }
}

/// Loads one cat on any connection or open transaction.
pub(crate) fn load_cat(conn: &Connection, id: CatId) -> RepoResult<Option<Cat>> {
    let mut stmt = conn.prepare(&format!("{CAT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_cat_row(row)?));
    }
    Ok(None)
}

fn parse_cat_row(row: &Row<'_>) -> RepoResult<Cat> {
    let id_text: String = row.get("id")?;
    let experience: i64 = row.get("experience_years")?;
    let experience_years = u32::try_from(experience).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid experience `{experience}` in cats.experience_years"
        ))
    })?;

    Ok(Cat {
        id: parse_uuid(&id_text, "cats.id")?,
        name: row.get("name")?,
        experience_years,
        breed: row.get("breed")?,
        salary: row.get("salary")?,
        mission_id: parse_optional_uuid(row.get("mission_id")?, "cats.mission_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
