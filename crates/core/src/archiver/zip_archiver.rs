//! Zip archiver implementation.

use async_trait::async_trait;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::creation::StagedCreation;

use super::config::{ArchiveConfig, Compression};
use super::error::ArchiveError;
use super::traits::Archiver;
use super::types::ArtifactInfo;

const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Builds zip archives on a blocking thread.
#[derive(Debug, Clone, Default)]
pub struct ZipArchiver {
    config: ArchiveConfig,
}

impl ZipArchiver {
    pub fn new(config: ArchiveConfig) -> Self {
        Self { config }
    }

    async fn build(
        &self,
        staged: &StagedCreation,
        temp_path: &Path,
        progress: Option<&mpsc::Sender<String>>,
    ) -> Result<(u64, String), ArchiveError> {
        send_detail(progress, "Creating archive");
        let root = staged.staging_path.clone();
        let target = temp_path.to_path_buf();
        let compression = self.config.compression;
        let entries = tokio::task::spawn_blocking(move || write_zip(&root, &target, compression))
            .await
            .map_err(|e| ArchiveError::failed(format!("archive task failed: {}", e)))?
            .map_err(|e| ArchiveError::failed(e.to_string()))?;
        debug!("Wrote {} entries to {}", entries, temp_path.display());

        send_detail(progress, "Creating archive MD5 hash");
        let content_hash = md5_file(temp_path)
            .await
            .map_err(|e| ArchiveError::failed(format!("hashing failed: {}", e)))?;

        let size_bytes = tokio::fs::metadata(temp_path)
            .await
            .map_err(|e| ArchiveError::failed(e.to_string()))?
            .len();

        Ok((size_bytes, content_hash))
    }
}

#[async_trait]
impl Archiver for ZipArchiver {
    async fn archive(
        &self,
        staged: &StagedCreation,
        downloads_root: &Path,
        progress: Option<mpsc::Sender<String>>,
    ) -> Result<ArtifactInfo, ArchiveError> {
        let file_name = format!("{}.zip", staged.managed_id);
        let temp_path = staged.staging_path.join(&file_name);
        let destination_path = downloads_root.join(&file_name);

        match self.build(staged, &temp_path, progress.as_ref()).await {
            Ok((size_bytes, content_hash)) => Ok(ArtifactInfo {
                archive_id: new_archive_id(),
                file_name,
                temp_path,
                destination_path,
                size_bytes,
                content_hash,
            }),
            Err(e) => {
                warn!(creation = %staged.creation.id, "{}", e);
                remove_quietly(&temp_path).await;
                remove_quietly(&destination_path).await;
                Err(e)
            }
        }
    }
}

/// Zips every regular file under `root` into `target`, skipping `target`
/// itself. Returns the number of entries written.
fn write_zip(root: &Path, target: &Path, compression: Compression) -> io::Result<usize> {
    let files = collect_files(root, target)?;

    let file = File::create(target)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default()
        .compression_method(compression.method())
        .large_file(true);

    for (path, name) in &files {
        zip.start_file(name.as_str(), options)
            .map_err(io::Error::other)?;
        let mut source = File::open(path)?;
        io::copy(&mut source, &mut zip)?;
    }

    zip.finish().map_err(io::Error::other)?;
    Ok(files.len())
}

/// Lists files under `root` in a stable order with their archive names.
fn collect_files(root: &Path, skip: &Path) -> io::Result<Vec<(PathBuf, String)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        if !entry.file_type().is_file() || entry.path() == skip {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(io::Error::other)?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push((entry.path().to_path_buf(), name));
    }
    Ok(files)
}

/// Streams a file through MD5, returning the lowercase hex digest.
pub(crate) async fn md5_file(path: &Path) -> io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut context = md5::Context::new();
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];
    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        context.consume(&buffer[..read]);
    }
    Ok(format!("{:x}", context.compute()))
}

/// 16 lowercase hex chars taken from a random v4 uuid.
fn new_archive_id() -> String {
    let bits = uuid::Uuid::new_v4().as_u128();
    format!("{:016x}", (bits >> 64) as u64)
}

fn send_detail(progress: Option<&mpsc::Sender<String>>, detail: &str) {
    if let Some(tx) = progress {
        let _ = tx.try_send(detail.to_string());
    }
}

async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed partial archive {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}
