//! Breed validation gate used before cat writes.

use super::catalog::BreedCatalog;
use crate::error::{CoreError, CoreResult};
use crate::model::validation::{require_text, ValidationError};
use log::{info, warn};
use std::time::Instant;

/// Result of validating one breed name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreedVerdict {
    pub valid: bool,
    /// Catalog spelling when `valid`.
    pub canonical_name: Option<String>,
}

/// Validates breed names against a `BreedCatalog`, one lookup per call.
pub struct BreedValidator<C: BreedCatalog> {
    catalog: C,
}

impl<C: BreedCatalog> BreedValidator<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    /// Asks the catalog whether `breed` exists.
    ///
    /// # Errors
    /// - `Validation` when `breed` is blank; the catalog is not called.
    /// - `ExternalLookup` when the catalog is unreachable or malformed.
    pub fn validate(&self, breed: &str) -> CoreResult<BreedVerdict> {
        let breed = require_text("breed", breed)?;
        let started_at = Instant::now();

        match self.catalog.lookup_breed(&breed) {
            Ok(lookup) => {
                info!(
                    "event=breed_lookup module=breed status=ok found={} duration_ms={}",
                    lookup.found,
                    started_at.elapsed().as_millis()
                );
                Ok(BreedVerdict {
                    valid: lookup.found,
                    canonical_name: lookup.canonical_name.filter(|_| lookup.found),
                })
            }
            Err(err) => {
                warn!(
                    "event=breed_lookup module=breed status=error retryable=true duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(CoreError::ExternalLookup(err))
            }
        }
    }

    /// Validates `breed` and returns the spelling to persist.
    ///
    /// Falls back to the trimmed input when the catalog confirms the breed
    /// without a canonical name.
    ///
    /// # Errors
    /// - `Validation(BreedNotRecognized)` when the catalog does not know it.
    /// - Everything `validate` returns.
    pub fn require_valid(&self, breed: &str) -> CoreResult<String> {
        let verdict = self.validate(breed)?;
        if !verdict.valid {
            return Err(ValidationError::BreedNotRecognized(breed.trim().to_string()).into());
        }
        Ok(verdict
            .canonical_name
            .unwrap_or_else(|| breed.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::BreedValidator;
    use crate::breed::{BreedCatalog, BreedLookup, BreedLookupError, StaticBreedCatalog};
    use crate::error::{CoreError, ErrorKind};
    use crate::model::validation::ValidationError;
    use std::cell::Cell;

    struct CountingCatalog {
        calls: Cell<u32>,
    }

    impl BreedCatalog for CountingCatalog {
        fn lookup_breed(&self, _name: &str) -> Result<BreedLookup, BreedLookupError> {
            self.calls.set(self.calls.get() + 1);
            Ok(BreedLookup::missing())
        }
    }

    struct DownCatalog;

    impl BreedCatalog for DownCatalog {
        fn lookup_breed(&self, _name: &str) -> Result<BreedLookup, BreedLookupError> {
            Err(BreedLookupError::UnexpectedStatus(503))
        }
    }

    #[test]
    fn known_breed_returns_canonical_spelling() {
        let validator = BreedValidator::new(StaticBreedCatalog::new(["Maine Coon"]));
        let verdict = validator.validate("maine coon").unwrap();
        assert!(verdict.valid);
        assert_eq!(verdict.canonical_name.as_deref(), Some("Maine Coon"));
        assert_eq!(validator.require_valid(" MAINE COON ").unwrap(), "Maine Coon");
    }

    #[test]
    fn unknown_breed_is_invalid_not_an_error() {
        let validator = BreedValidator::new(StaticBreedCatalog::new(["Maine Coon"]));
        let verdict = validator.validate("Dragon").unwrap();
        assert!(!verdict.valid);
        assert_eq!(verdict.canonical_name, None);

        let err = validator.require_valid("Dragon").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::BreedNotRecognized(ref breed)) if breed == "Dragon"
        ));
    }

    #[test]
    fn catalog_outage_surfaces_as_retryable_error() {
        let validator = BreedValidator::new(DownCatalog);
        let err = validator.validate("Siamese").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalLookup);
        assert!(err.is_retryable());
    }

    #[test]
    fn every_call_hits_the_catalog_and_blank_skips_it() {
        let catalog = CountingCatalog {
            calls: Cell::new(0),
        };
        let validator = BreedValidator::new(&catalog);
        validator.validate("Siamese").unwrap();
        validator.validate("Siamese").unwrap();
        assert_eq!(catalog.calls.get(), 2);

        let err = validator.validate("   ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(catalog.calls.get(), 2);
    }
}
