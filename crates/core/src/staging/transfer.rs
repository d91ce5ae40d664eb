//! File system stager implementation.

use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::creation::{safe_relative_path, CreationEntry, StagedCreation};

use super::config::TransferConfig;
use super::error::{FileErrors, StagingError};
use super::mover::{is_cross_device, FileMover, TokioFileMover};
use super::types::{TransferMethod, TransferProgress, TransferredFile};

/// Moves a creation's files from the source data root into its own
/// staging directory.
pub struct FsStager {
    config: TransferConfig,
    mover: Arc<dyn FileMover>,
}

impl FsStager {
    /// Creates a new stager with the given configuration.
    pub fn new(config: TransferConfig) -> Self {
        Self {
            config,
            mover: Arc::new(TokioFileMover),
        }
    }

    /// Creates a stager with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TransferConfig::default())
    }

    /// Replaces the rename implementation.
    pub fn with_mover(mut self, mover: Arc<dyn FileMover>) -> Self {
        self.mover = mover;
        self
    }

    /// Stages every file of `creation` into `staging_root/<managed_id>`.
    ///
    /// All files are attempted even after a failure. If any file fails, the
    /// files already moved are put back at their source and the staging
    /// directory is removed.
    pub async fn stage(
        &self,
        creation: &CreationEntry,
        managed_id: &str,
        source_root: &Path,
        staging_root: &Path,
        progress_tx: Option<mpsc::Sender<TransferProgress>>,
    ) -> Result<StagedCreation, StagingError> {
        let staging_path = staging_root.join(managed_id);

        if fs::try_exists(&staging_path).await.unwrap_or(false) {
            debug!("Removing stale staging directory {}", staging_path.display());
            fs::remove_dir_all(&staging_path)
                .await
                .map_err(|e| StagingError::Io {
                    path: staging_path.clone(),
                    source: e,
                })?;
        }
        fs::create_dir_all(&staging_path)
            .await
            .map_err(|e| StagingError::Io {
                path: staging_path.clone(),
                source: e,
            })?;

        let total_files = creation.files.len();
        let progress_tx = progress_tx.as_ref();

        let pending: Vec<_> = creation
            .files
            .iter()
            .enumerate()
            .map(|(idx, file)| {
                self.stage_one(
                    creation,
                    idx,
                    total_files,
                    file,
                    source_root,
                    &staging_path,
                    progress_tx,
                )
            })
            .collect();
        let outcomes: Vec<(String, Result<TransferredFile, String>)> = stream::iter(pending)
            .buffered(self.config.max_parallel_file_ops.max(1))
            .collect()
            .await;

        let mut transferred = Vec::with_capacity(total_files);
        let mut file_errors = FileErrors::new();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(file) => transferred.push(file),
                Err(e) => {
                    warn!(creation = %creation.id, file = %name, "Failed to stage file: {}", e);
                    file_errors.insert(name, e);
                }
            }
        }

        if !file_errors.is_empty() {
            let kept_staging = self.rollback(&transferred, &staging_path).await;
            return Err(StagingError::StagingFailed {
                file_errors,
                kept_staging,
            });
        }

        debug!(
            "Staged {} files for {} into {}",
            transferred.len(),
            creation.id,
            staging_path.display()
        );
        Ok(StagedCreation::new(
            creation.clone(),
            managed_id.to_string(),
            staging_path,
        ))
    }

    /// Reports progress for one file and transfers it. Errors are keyed by
    /// the file's catalog path.
    #[allow(clippy::too_many_arguments)]
    async fn stage_one(
        &self,
        creation: &CreationEntry,
        idx: usize,
        total_files: usize,
        file: &str,
        source_root: &Path,
        staging_dir: &Path,
        progress_tx: Option<&mpsc::Sender<TransferProgress>>,
    ) -> (String, Result<TransferredFile, String>) {
        if let Some(tx) = progress_tx {
            let name = display_name(file);
            let _ = tx.try_send(TransferProgress {
                creation_id: creation.id.clone(),
                file_index: idx,
                total_files,
                detail: format!("Importing {}", name),
                file_name: name,
            });
        }
        let result = self.transfer_file(file, source_root, staging_dir).await;
        (file.to_string(), result)
    }

    /// Transfers one catalog file into the staging directory.
    async fn transfer_file(
        &self,
        file: &str,
        source_root: &Path,
        staging_dir: &Path,
    ) -> Result<TransferredFile, String> {
        let relative = safe_relative_path(file)
            .ok_or_else(|| format!("file path escapes data root: {}", file))?;
        let source = source_root.join(&relative);
        let target = staging_dir.join(&relative);

        let source_meta = fs::metadata(&source)
            .await
            .map_err(|e| format!("{} ({})", e, source.display()))?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("failed to create {}: {}", parent.display(), e))?;
        }

        if self.config.prefer_atomic_moves {
            match self.mover.rename(&source, &target).await {
                Ok(()) => {
                    return Ok(TransferredFile {
                        source,
                        target,
                        method: TransferMethod::Renamed,
                        source_removed: true,
                    })
                }
                Err(e) if is_cross_device(&e) => {
                    debug!("{} is on another device, copying", source.display());
                }
                Err(e) => return Err(e.to_string()),
            }
        }

        let copied = self
            .copy_file(&source, &target)
            .await
            .map_err(|e| format!("copy failed: {}", e))?;
        if copied != source_meta.len() {
            let _ = fs::remove_file(&target).await;
            return Err(format!(
                "copy incomplete: wrote {} of {} bytes",
                copied,
                source_meta.len()
            ));
        }

        let source_removed = match fs::remove_file(&source).await {
            Ok(()) => true,
            Err(e) => {
                // The staged copy is complete; cleanup retries the delete.
                warn!(
                    "Copied {} but could not remove the source: {}",
                    source.display(),
                    e
                );
                false
            }
        };

        Ok(TransferredFile {
            source,
            target,
            method: TransferMethod::CopiedAcross,
            source_removed,
        })
    }

    /// Copies a file, returning the number of bytes written.
    async fn copy_file(&self, source: &Path, destination: &Path) -> std::io::Result<u64> {
        let source_file = File::open(source).await?;
        let dest_file = File::create(destination).await?;

        let mut reader = BufReader::with_capacity(self.config.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.config.buffer_size, dest_file);
        let mut buffer = vec![0u8; self.config.buffer_size];
        let mut total_bytes = 0u64;

        loop {
            let bytes_read = reader.read(&mut buffer).await?;
            if bytes_read == 0 {
                break;
            }
            writer.write_all(&buffer[..bytes_read]).await?;
            total_bytes += bytes_read as u64;
        }

        writer.flush().await?;
        Ok(total_bytes)
    }

    /// Puts moved files back at their source, then removes the staging
    /// directory.
    ///
    /// Returns the staging path if it had to be kept because a file could
    /// not be restored.
    async fn rollback(
        &self,
        transferred: &[TransferredFile],
        staging_path: &Path,
    ) -> Option<PathBuf> {
        let mut restore_failed = false;

        for file in transferred.iter().rev().filter(|f| f.source_removed) {
            if let Err(e) = self.restore_file(file).await {
                error!(
                    "Failed to restore {} from {}: {}",
                    file.source.display(),
                    file.target.display(),
                    e
                );
                restore_failed = true;
            }
        }

        if restore_failed {
            error!(
                "Keeping staging directory {} because some files could not be restored",
                staging_path.display()
            );
            return Some(staging_path.to_path_buf());
        }

        if let Err(e) = fs::remove_dir_all(staging_path).await {
            warn!(
                "Failed to remove staging directory {}: {}",
                staging_path.display(),
                e
            );
        }
        None
    }

    async fn restore_file(&self, file: &TransferredFile) -> std::io::Result<()> {
        match self.mover.rename(&file.target, &file.source).await {
            Ok(()) => Ok(()),
            Err(e) if is_cross_device(&e) => {
                self.copy_file(&file.target, &file.source).await?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Name used for a file in progress details.
fn display_name(file: &str) -> String {
    let normalized = file.replace('\\', "/");
    Path::new(&normalized)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string())
}
