//! Applies worker events to the host registries.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::protocol::PipelineEvent;

use super::traits::{DownloadRegistry, ModRegistry, RegistryError};

/// Where dispatched events land in the host.
#[derive(Debug, Clone)]
pub struct HostContext {
    pub product_key: String,
    /// Profile the imported mods are enabled in.
    pub profile_id: String,
    pub downloads_root: PathBuf,
}

/// Turns `register-archive`, `importedmod` and `importcomplete` events into
/// registry calls. Other events are ignored.
pub struct HostDispatcher {
    context: HostContext,
    downloads: Arc<dyn DownloadRegistry>,
    mods: Arc<dyn ModRegistry>,
}

impl HostDispatcher {
    pub fn new(
        context: HostContext,
        downloads: Arc<dyn DownloadRegistry>,
        mods: Arc<dyn ModRegistry>,
    ) -> Self {
        Self {
            context,
            downloads,
            mods,
        }
    }

    /// Applies one event.
    pub async fn apply(&self, event: &PipelineEvent) -> Result<(), RegistryError> {
        let ctx = &self.context;
        match event {
            PipelineEvent::RegisterArchive {
                id,
                file_name,
                path,
                size,
                display_name,
                display_version,
            } => {
                let moved = self
                    .downloads
                    .move_artifact(path, &ctx.downloads_root)
                    .await?;
                debug!("Moved archive {} to {}", id, moved.display());
                self.downloads
                    .register_local_artifact(id, &ctx.product_key, file_name, *size)
                    .await?;
                self.downloads
                    .set_artifact_metadata(id, "name", display_name)
                    .await?;
                self.downloads
                    .set_artifact_metadata(id, "version", display_version)
                    .await?;
                self.downloads
                    .set_artifact_metadata(id, "game", &ctx.product_key)
                    .await?;
            }
            PipelineEvent::ImportedMod { result } => {
                self.mods.add_mod_record(&ctx.product_key, result).await?;
                self.mods
                    .set_mod_enabled(&ctx.profile_id, &result.id, true)
                    .await?;
                info!("Added imported mod {}", result.id);
            }
            PipelineEvent::ImportComplete { succeeded, .. } if *succeeded > 0 => {
                self.mods.mark_deployment_required(&ctx.product_key).await?;
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, InMemoryRegistry, RegistryCall};

    fn dispatcher(registry: Arc<InMemoryRegistry>) -> HostDispatcher {
        HostDispatcher::new(
            HostContext {
                product_key: "skyrimse".to_string(),
                profile_id: "profile-1".to_string(),
                downloads_root: PathBuf::from("/downloads"),
            },
            registry.clone(),
            registry,
        )
    }

    #[tokio::test]
    async fn test_register_archive_moves_and_tags_download() {
        let registry = Arc::new(InMemoryRegistry::new());
        let host = dispatcher(registry.clone());

        host.apply(&PipelineEvent::RegisterArchive {
            id: "0011223344556677".to_string(),
            file_name: "bethesdanet-1001-1.zip".to_string(),
            path: PathBuf::from("/staging/bethesdanet-1001-1/bethesdanet-1001-1.zip"),
            size: 10,
            display_name: "Alpha".to_string(),
            display_version: "1".to_string(),
        })
        .await
        .unwrap();

        let calls = registry.calls().await;
        assert_eq!(
            calls[0],
            RegistryCall::MoveArtifact {
                temp_path: PathBuf::from("/staging/bethesdanet-1001-1/bethesdanet-1001-1.zip"),
                destination_dir: PathBuf::from("/downloads"),
            }
        );
        assert!(calls.contains(&RegistryCall::RegisterArtifact {
            id: "0011223344556677".to_string(),
            product_key: "skyrimse".to_string(),
            file_name: "bethesdanet-1001-1.zip".to_string(),
            size_bytes: 10,
        }));
        assert_eq!(
            registry.artifact_metadata("0011223344556677").await,
            vec![
                ("name".to_string(), "Alpha".to_string()),
                ("version".to_string(), "1".to_string()),
                ("game".to_string(), "skyrimse".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_imported_mod_added_and_enabled() {
        let registry = Arc::new(InMemoryRegistry::new());
        let host = dispatcher(registry.clone());
        let result = fixtures::import_result("bethesdanet-1001-1", "Alpha");

        host.apply(&PipelineEvent::ImportedMod {
            result: result.clone(),
        })
        .await
        .unwrap();

        assert_eq!(registry.mods().await, vec![result]);
        assert_eq!(
            registry.calls().await.last(),
            Some(&RegistryCall::SetModEnabled {
                profile_id: "profile-1".to_string(),
                mod_id: "bethesdanet-1001-1".to_string(),
                enabled: true,
            })
        );
    }

    #[tokio::test]
    async fn test_import_complete_marks_deployment_only_with_successes() {
        let registry = Arc::new(InMemoryRegistry::new());
        let host = dispatcher(registry.clone());

        host.apply(&PipelineEvent::ImportComplete {
            total: 1,
            succeeded: 0,
            errors: vec!["e".to_string()],
            cancelled: false,
        })
        .await
        .unwrap();
        assert!(registry.calls().await.is_empty());

        host.apply(&PipelineEvent::ImportComplete {
            total: 1,
            succeeded: 1,
            errors: vec![],
            cancelled: false,
        })
        .await
        .unwrap();
        assert_eq!(
            registry.calls().await,
            vec![RegistryCall::MarkDeploymentRequired {
                product_key: "skyrimse".to_string()
            }]
        );
    }
}
