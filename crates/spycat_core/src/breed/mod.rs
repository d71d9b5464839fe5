//! Breed catalog lookup and validation.
//!
//! # Responsibility
//! - Abstract the external breed catalog behind `BreedCatalog`.
//! - Map raw catalog payloads to `BreedLookup` at the boundary.
//! - Gate cat writes on breed validity through `BreedValidator`.
//!
//! # Invariants
//! - Lookups are never cached; each validation asks the catalog.
//! - An unreachable or malformed catalog is an error, never "not found".

mod catalog;
mod validator;

pub use catalog::{
    parse_breed_names, BreedCatalog, BreedLookup, BreedLookupError, HttpBreedCatalog,
    StaticBreedCatalog,
};
pub use validator::{BreedValidator, BreedVerdict};
