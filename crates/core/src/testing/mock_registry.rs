//! In-memory host registries for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::creation::ImportResult;
use crate::host::{DownloadRegistry, ModRegistry, RegistryError};

/// A registry call recorded for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    MoveArtifact {
        temp_path: PathBuf,
        destination_dir: PathBuf,
    },
    RegisterArtifact {
        id: String,
        product_key: String,
        file_name: String,
        size_bytes: u64,
    },
    SetArtifactMetadata {
        id: String,
        key: String,
        value: String,
    },
    AddModRecord {
        product_key: String,
        mod_id: String,
    },
    SetModEnabled {
        profile_id: String,
        mod_id: String,
        enabled: bool,
    },
    MarkDeploymentRequired {
        product_key: String,
    },
}

/// Implements both host registries in memory. Nothing touches the disk.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    calls: Arc<RwLock<Vec<RegistryCall>>>,
    mods: Arc<RwLock<Vec<ImportResult>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn calls(&self) -> Vec<RegistryCall> {
        self.calls.read().await.clone()
    }

    /// Mod records added so far.
    pub async fn mods(&self) -> Vec<ImportResult> {
        self.mods.read().await.clone()
    }

    /// Metadata set on one download, in call order.
    pub async fn artifact_metadata(&self, artifact_id: &str) -> Vec<(String, String)> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|call| match call {
                RegistryCall::SetArtifactMetadata { id, key, value } if id == artifact_id => {
                    Some((key.clone(), value.clone()))
                }
                _ => None,
            })
            .collect()
    }

    async fn record(&self, call: RegistryCall) {
        self.calls.write().await.push(call);
    }
}

#[async_trait]
impl DownloadRegistry for InMemoryRegistry {
    async fn move_artifact(
        &self,
        temp_path: &Path,
        destination_dir: &Path,
    ) -> Result<PathBuf, RegistryError> {
        self.record(RegistryCall::MoveArtifact {
            temp_path: temp_path.to_path_buf(),
            destination_dir: destination_dir.to_path_buf(),
        })
        .await;
        let file_name = temp_path
            .file_name()
            .ok_or_else(|| RegistryError::Failed("archive path has no file name".to_string()))?;
        Ok(destination_dir.join(file_name))
    }

    async fn register_local_artifact(
        &self,
        id: &str,
        product_key: &str,
        file_name: &str,
        size_bytes: u64,
    ) -> Result<(), RegistryError> {
        self.record(RegistryCall::RegisterArtifact {
            id: id.to_string(),
            product_key: product_key.to_string(),
            file_name: file_name.to_string(),
            size_bytes,
        })
        .await;
        Ok(())
    }

    async fn set_artifact_metadata(
        &self,
        id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), RegistryError> {
        self.record(RegistryCall::SetArtifactMetadata {
            id: id.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        })
        .await;
        Ok(())
    }
}

#[async_trait]
impl ModRegistry for InMemoryRegistry {
    async fn add_mod_record(
        &self,
        product_key: &str,
        result: &ImportResult,
    ) -> Result<(), RegistryError> {
        self.record(RegistryCall::AddModRecord {
            product_key: product_key.to_string(),
            mod_id: result.id.clone(),
        })
        .await;
        self.mods.write().await.push(result.clone());
        Ok(())
    }

    async fn set_mod_enabled(
        &self,
        profile_id: &str,
        mod_id: &str,
        enabled: bool,
    ) -> Result<(), RegistryError> {
        self.record(RegistryCall::SetModEnabled {
            profile_id: profile_id.to_string(),
            mod_id: mod_id.to_string(),
            enabled,
        })
        .await;
        Ok(())
    }

    async fn mark_deployment_required(&self, product_key: &str) -> Result<(), RegistryError> {
        self.record(RegistryCall::MarkDeploymentRequired {
            product_key: product_key.to_string(),
        })
        .await;
        Ok(())
    }
}
