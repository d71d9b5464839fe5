//! Cat registry use-case service.
//!
//! # Responsibility
//! - Provide create/get/list/update/delete entry points for spy cats.
//! - Gate breed writes on the breed catalog.
//!
//! # Invariants
//! - Breed is validated on create, and on update only when it changes
//!   (ASCII case-insensitive).
//! - Stored breed uses the catalog spelling.
//! - Catalog outages surface as `ExternalLookup`, never as an invalid breed.

use crate::breed::{BreedCatalog, BreedValidator};
use crate::error::{CoreError, CoreResult, EntityRef};
use crate::logging::log_failure;
use crate::model::cat::{Cat, CatId, CatPatch, NewCat};
use crate::repo::cat_repo::CatRepository;
use crate::repo::ListQuery;
use log::info;

/// Cat registry facade over a repository and a breed catalog.
pub struct CatService<R: CatRepository, C: BreedCatalog> {
    repo: R,
    validator: BreedValidator<C>,
}

impl<R: CatRepository, C: BreedCatalog> CatService<R, C> {
    pub fn new(repo: R, catalog: C) -> Self {
        Self {
            repo,
            validator: BreedValidator::new(catalog),
        }
    }

    /// Registers a new cat after validating its breed.
    ///
    /// # Errors
    /// - `Validation` for blank name/breed, bad salary or unknown breed.
    /// - `ExternalLookup` when the catalog cannot answer.
    pub fn create_cat(&self, cat: &NewCat) -> CoreResult<Cat> {
        self.try_create_cat(cat)
            .inspect_err(|err| log_failure("cat_create", "cat", err))
    }

    /// Loads one cat.
    pub fn get_cat(&self, id: CatId) -> CoreResult<Cat> {
        self.repo
            .get_cat(id)?
            .ok_or(CoreError::NotFound(EntityRef::Cat(id)))
    }

    /// Lists cats in creation order.
    pub fn list_cats(&self, query: &ListQuery) -> CoreResult<Vec<Cat>> {
        Ok(self.repo.list_cats(query)?)
    }

    /// Applies a partial update.
    ///
    /// The catalog is consulted only when the requested breed differs from
    /// the stored one; an unchanged breed keeps the stored spelling.
    ///
    /// The comparison runs on a read taken before the catalog call. The write
    /// re-checks the stored breed inside its transaction and fails with
    /// `Conflict(CatBreedChanged)` when another writer changed it meanwhile.
    pub fn update_cat(&self, id: CatId, patch: &CatPatch) -> CoreResult<Cat> {
        self.try_update_cat(id, patch)
            .inspect_err(|err| log_failure("cat_update", "cat", err))
    }

    /// Deletes a cat that holds no mission.
    pub fn delete_cat(&self, id: CatId) -> CoreResult<()> {
        self.repo
            .delete_cat(id)
            .map_err(CoreError::from)
            .inspect_err(|err| log_failure("cat_delete", "cat", err))?;
        info!("event=cat_delete module=cat status=ok cat_id={id}");
        Ok(())
    }

    fn try_create_cat(&self, cat: &NewCat) -> CoreResult<Cat> {
        let mut normalized = cat.normalized()?;
        normalized.breed = self.validator.require_valid(&normalized.breed)?;

        let created = self.repo.create_cat(&normalized)?;
        info!(
            "event=cat_create module=cat status=ok cat_id={}",
            created.id
        );
        Ok(created)
    }

    fn try_update_cat(&self, id: CatId, patch: &CatPatch) -> CoreResult<Cat> {
        let mut normalized = patch.normalized()?;
        let current = self.get_cat(id)?;

        let breed_changed = match normalized.breed_change(&current.breed) {
            Some(requested) => {
                let canonical = self.validator.require_valid(requested)?;
                normalized.breed = Some(canonical);
                true
            }
            None => {
                normalized.breed = None;
                false
            }
        };
        if normalized.is_empty() {
            return Ok(current);
        }

        let updated = self.repo.update_cat(id, &normalized, &current.breed)?;
        info!("event=cat_update module=cat status=ok cat_id={id} breed_changed={breed_changed}");
        Ok(updated)
    }
}
