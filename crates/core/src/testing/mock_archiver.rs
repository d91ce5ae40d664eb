//! Mock archiver for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use crate::archiver::{ArchiveError, Archiver, ArtifactInfo};
use crate::creation::StagedCreation;

const MOCK_ARCHIVE: &[u8] = b"mock archive";

/// Mock implementation of the Archiver trait.
///
/// Writes a small placeholder file instead of a real zip and records the
/// managed id of every creation it was asked to archive.
#[derive(Debug, Default)]
pub struct MockArchiver {
    archived: Arc<RwLock<Vec<String>>>,
    fail_ids: Arc<RwLock<Vec<String>>>,
}

impl MockArchiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Managed ids passed to `archive`, in call order.
    pub async fn archived(&self) -> Vec<String> {
        self.archived.read().await.clone()
    }

    /// Always fail for the given creation id.
    pub async fn fail_for(&self, creation_id: &str) {
        self.fail_ids.write().await.push(creation_id.to_string());
    }
}

#[async_trait]
impl Archiver for MockArchiver {
    async fn archive(
        &self,
        staged: &StagedCreation,
        downloads_root: &Path,
        progress: Option<mpsc::Sender<String>>,
    ) -> Result<ArtifactInfo, ArchiveError> {
        self.archived.write().await.push(staged.managed_id.clone());

        if self.fail_ids.read().await.contains(&staged.creation.id) {
            return Err(ArchiveError::failed("mock archive failure"));
        }

        if let Some(tx) = progress {
            let _ = tx.try_send("Creating archive".to_string());
        }

        let file_name = format!("{}.zip", staged.managed_id);
        let temp_path = staged.staging_path.join(&file_name);
        tokio::fs::write(&temp_path, MOCK_ARCHIVE)
            .await
            .map_err(|e| ArchiveError::failed(e.to_string()))?;

        Ok(ArtifactInfo {
            archive_id: format!("{:016x}", self.archived.read().await.len()),
            destination_path: downloads_root.join(&file_name),
            file_name,
            temp_path,
            size_bytes: MOCK_ARCHIVE.len() as u64,
            content_hash: format!("{:x}", md5::compute(MOCK_ARCHIVE)),
        })
    }
}
