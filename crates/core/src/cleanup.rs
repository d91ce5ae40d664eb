//! Removal of original creation files after a successful import.
//!
//! A source file is deleted only when its staged copy exists and can be
//! opened. Staging is never rolled back from here.

use std::io;
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

use crate::creation::{safe_relative_path, CreationEntry};
use crate::staging::{describe_file_errors, FileErrors};

/// Errors that can occur while removing original files.
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("Removing original files failed: {}", describe_file_errors(.file_errors))]
    CleanupFailed { file_errors: FileErrors },
}

/// Deletes the source copies of a creation's files.
///
/// Every file is checked against `staging_dir`. Files whose staged copy is
/// missing or unreadable are recorded and their source is left in place.
/// Sources that are already gone count as removed.
pub async fn cleanup(
    creation: &CreationEntry,
    source_root: &Path,
    staging_dir: &Path,
) -> Result<(), CleanupError> {
    let mut file_errors = FileErrors::new();

    for file in &creation.files {
        let Some(relative) = safe_relative_path(file) else {
            file_errors.insert(file.clone(), "file path escapes data root".to_string());
            continue;
        };
        let staged = staging_dir.join(&relative);
        let source = source_root.join(&relative);

        if let Err(e) = fs::File::open(&staged).await {
            debug!("Staged copy {} not readable: {}", staged.display(), e);
            file_errors.insert(
                file.clone(),
                format!(
                    "Imported file does not exist for {} at {}. The original file has not been deleted from {}",
                    creation.title,
                    staged.display(),
                    source.display()
                ),
            );
            continue;
        }

        match fs::remove_file(&source).await {
            Ok(()) => debug!("Removed original {}", source.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!("Failed to remove original {}: {}", source.display(), e);
                file_errors.insert(file.clone(), e.to_string());
            }
        }
    }

    if file_errors.is_empty() {
        Ok(())
    } else {
        Err(CleanupError::CleanupFailed { file_errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use tempfile::TempDir;

    fn creation(files: &[&str]) -> CreationEntry {
        CreationEntry {
            id: "1001".to_string(),
            manifest_key: "A_1001".to_string(),
            title: "Alpha".to_string(),
            version: "1".to_string(),
            files: files.iter().map(|f| f.to_string()).collect(),
            file_size_bytes: 0,
            timestamp: DateTime::UNIX_EPOCH,
            achievement_safe: false,
            description: None,
            author: None,
            picture_url: None,
        }
    }

    #[tokio::test]
    async fn test_cleanup_removes_sources_with_staged_copies() {
        let temp = TempDir::new().unwrap();
        let data = temp.path().join("Data");
        let staging = temp.path().join("staging");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::create_dir_all(&staging).unwrap();
        std::fs::write(data.join("a.esp"), b"x").unwrap();
        std::fs::write(staging.join("a.esp"), b"x").unwrap();
        // a.bsa already moved away
        std::fs::write(staging.join("a.bsa"), b"y").unwrap();

        cleanup(&creation(&["a.esp", "a.bsa"]), &data, &staging)
            .await
            .unwrap();

        assert!(!data.join("a.esp").exists());
        assert!(staging.join("a.esp").exists());
    }

    #[tokio::test]
    async fn test_cleanup_keeps_source_when_staged_copy_missing() {
        let temp = TempDir::new().unwrap();
        let data = temp.path().join("Data");
        let staging = temp.path().join("staging");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::create_dir_all(&staging).unwrap();
        std::fs::write(data.join("a.esp"), b"x").unwrap();
        std::fs::write(data.join("a.bsa"), b"y").unwrap();
        std::fs::write(staging.join("a.bsa"), b"y").unwrap();

        let err = cleanup(&creation(&["a.esp", "a.bsa"]), &data, &staging)
            .await
            .unwrap_err();

        let CleanupError::CleanupFailed { file_errors } = &err;
        assert_eq!(file_errors.keys().collect::<Vec<_>>(), vec!["a.esp"]);
        assert!(file_errors["a.esp"].contains("has not been deleted"));
        assert!(data.join("a.esp").exists());
        assert!(!data.join("a.bsa").exists());
    }
}
