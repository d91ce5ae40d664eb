//! Trait definitions for the catalog module.

use async_trait::async_trait;

use super::error::CatalogError;
use super::types::{CatalogLocation, CatalogSnapshot, RemovalOutcome};

/// Source of truth for which creations are installed.
///
/// Implementations are the only component allowed to mutate the catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Loads the catalog for a location.
    ///
    /// A missing catalog file yields an empty snapshot rather than an error.
    async fn load(&self, location: &CatalogLocation) -> Result<CatalogSnapshot, CatalogError>;

    /// Removes the given manifest keys, backing up the original first.
    ///
    /// Does not write anything when none of the keys are present.
    async fn remove_entries(
        &self,
        location: &CatalogLocation,
        keys: &[String],
    ) -> Result<RemovalOutcome, CatalogError>;
}
