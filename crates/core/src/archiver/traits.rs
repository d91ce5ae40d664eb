//! Archiver trait definition.

use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;

use crate::creation::StagedCreation;

use super::error::ArchiveError;
use super::types::ArtifactInfo;

/// Packs a staged creation into a single archive file.
#[async_trait]
pub trait Archiver: Send + Sync {
    /// Archives every file under the staging directory of `staged`.
    ///
    /// `progress` receives human readable detail lines. On failure any
    /// partial archive is removed and the staged files are left untouched.
    async fn archive(
        &self,
        staged: &StagedCreation,
        downloads_root: &Path,
        progress: Option<mpsc::Sender<String>>,
    ) -> Result<ArtifactInfo, ArchiveError>;
}
