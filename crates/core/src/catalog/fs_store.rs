//! File system catalog store implementation.

use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::config::CatalogConfig;
use super::error::CatalogError;
use super::product::product_directory;
use super::store::CatalogStore;
use super::types::{CatalogLocation, CatalogSnapshot, RemovalOutcome};

/// Catalog store backed by the vendor's JSON catalog file.
pub struct FsCatalogStore {
    config: CatalogConfig,
}

impl FsCatalogStore {
    /// Creates a new catalog store with the given configuration.
    pub fn new(config: CatalogConfig) -> Self {
        Self { config }
    }

    /// Creates a catalog store with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(CatalogConfig::default())
    }

    /// Resolves the catalog file path for a location.
    pub fn catalog_path(&self, location: &CatalogLocation) -> Result<PathBuf, CatalogError> {
        let dir = product_directory(&self.config, &location.product_key).ok_or_else(|| {
            CatalogError::UnsupportedProduct {
                product_key: location.product_key.clone(),
            }
        })?;
        Ok(location
            .platform_data_root
            .join(dir)
            .join(&self.config.file_name))
    }

    /// Reads and parses the catalog, returning the raw text alongside.
    async fn read_snapshot(&self, path: &Path) -> Result<(String, CatalogSnapshot), CatalogError> {
        let text = match fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CatalogError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => return Err(CatalogError::io(path.to_path_buf(), e)),
        };

        let snapshot = CatalogSnapshot::parse(&text, &self.config.header_key).map_err(|reason| {
            CatalogError::CorruptCatalog {
                path: path.to_path_buf(),
                reason,
            }
        })?;

        Ok((text, snapshot))
    }

    /// Writes a timestamped copy of the original catalog text next to it.
    async fn write_backup(&self, path: &Path, original: &str) -> Result<PathBuf, CatalogError> {
        let stamp = Utc::now().format("%Y%m%d-%H%M%S%3f").to_string();
        self.write_backup_stamped(path, original, &stamp).await
    }

    /// Never overwrites an existing backup; a taken name gets a `-N` suffix.
    async fn write_backup_stamped(
        &self,
        path: &Path,
        original: &str,
        stamp: &str,
    ) -> Result<PathBuf, CatalogError> {
        let mut attempt = 0u32;
        loop {
            let name = if attempt == 0 {
                format!("{}.{}.bak", self.config.file_name, stamp)
            } else {
                format!("{}.{}-{}.bak", self.config.file_name, stamp, attempt)
            };
            let backup_path = path.with_file_name(name);

            let mut file = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&backup_path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    attempt += 1;
                    continue;
                }
                Err(e) => return Err(CatalogError::io(backup_path, e)),
            };

            file.write_all(original.as_bytes())
                .await
                .map_err(|e| CatalogError::io(backup_path.clone(), e))?;
            file.flush()
                .await
                .map_err(|e| CatalogError::io(backup_path.clone(), e))?;
            return Ok(backup_path);
        }
    }

    /// Replaces the catalog by writing a sibling temp file and renaming it over.
    async fn write_atomic(&self, path: &Path, contents: &str) -> Result<(), CatalogError> {
        let tmp_path = path.with_file_name(format!("{}.tmp", self.config.file_name));
        fs::write(&tmp_path, contents)
            .await
            .map_err(|e| CatalogError::io(tmp_path.clone(), e))?;

        if let Err(e) = fs::rename(&tmp_path, path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(CatalogError::io(path.to_path_buf(), e));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for FsCatalogStore {
    async fn load(&self, location: &CatalogLocation) -> Result<CatalogSnapshot, CatalogError> {
        let path = self.catalog_path(location)?;
        match self.read_snapshot(&path).await {
            Ok((_, snapshot)) => {
                debug!("Loaded {} catalog entries from {}", snapshot.len(), path.display());
                Ok(snapshot)
            }
            Err(CatalogError::NotFound { path }) => {
                info!("No catalog at {}, treating as empty", path.display());
                Ok(CatalogSnapshot::default())
            }
            Err(e) => Err(e),
        }
    }

    async fn remove_entries(
        &self,
        location: &CatalogLocation,
        keys: &[String],
    ) -> Result<RemovalOutcome, CatalogError> {
        let path = self.catalog_path(location)?;
        let (original_text, mut snapshot) = match self.read_snapshot(&path).await {
            Ok(read) => read,
            Err(CatalogError::NotFound { path }) => {
                warn!(
                    "Catalog {} vanished before removal, nothing to update",
                    path.display()
                );
                return Ok(RemovalOutcome {
                    missing: keys.to_vec(),
                    ..Default::default()
                });
            }
            Err(e) => return Err(e),
        };

        let original_len = snapshot.len();
        let mut outcome = RemovalOutcome::default();

        for key in keys {
            if snapshot.entries.shift_remove(key).is_some() {
                debug!(key = %key, catalog = %path.display(), "Removed catalog entry");
                outcome.removed.push(key.clone());
            } else {
                debug!(key = %key, catalog = %path.display(), "Catalog entry not found, skipping");
                outcome.missing.push(key.clone());
            }
        }

        if snapshot.len() == original_len {
            debug!("Catalog {} unchanged, not rewriting", path.display());
            return Ok(outcome);
        }

        let rendered = snapshot
            .render(&self.config.header_key)
            .map_err(|e| CatalogError::CorruptCatalog {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let backup_path = self.write_backup(&path, &original_text).await?;
        self.write_atomic(&path, &rendered).await?;

        info!(
            "Removed {} entries from {} (backup at {})",
            outcome.removed.len(),
            path.display(),
            backup_path.display()
        );
        outcome.backup_path = Some(backup_path);
        Ok(outcome)
    }
}
