//! Host registry traits.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::creation::ImportResult;

/// Errors reported by host registries.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Registry operation failed: {0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The host's record of downloaded archives.
#[async_trait]
pub trait DownloadRegistry: Send + Sync {
    /// Moves an archive into the downloads directory, returning its new
    /// path.
    async fn move_artifact(
        &self,
        temp_path: &Path,
        destination_dir: &Path,
    ) -> Result<PathBuf, RegistryError>;

    /// Registers a local archive as a download of a product.
    async fn register_local_artifact(
        &self,
        id: &str,
        product_key: &str,
        file_name: &str,
        size_bytes: u64,
    ) -> Result<(), RegistryError>;

    /// Sets one metadata field of a registered download.
    async fn set_artifact_metadata(
        &self,
        id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), RegistryError>;
}

/// The host's record of installed mods.
#[async_trait]
pub trait ModRegistry: Send + Sync {
    async fn add_mod_record(
        &self,
        product_key: &str,
        result: &ImportResult,
    ) -> Result<(), RegistryError>;

    async fn set_mod_enabled(
        &self,
        profile_id: &str,
        mod_id: &str,
        enabled: bool,
    ) -> Result<(), RegistryError>;

    /// Flags that the product's mods must be deployed again.
    async fn mark_deployment_required(&self, product_key: &str) -> Result<(), RegistryError>;
}
