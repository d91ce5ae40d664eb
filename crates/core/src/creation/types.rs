//! Types for the creation model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::archiver::ArtifactInfo;

/// One creation listed in the content catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationEntry {
    /// Stable vendor identifier.
    pub id: String,
    /// Raw catalog key, used when removing the entry.
    pub manifest_key: String,
    /// Display title.
    pub title: String,
    /// Vendor version string.
    pub version: String,
    /// Files relative to the source data root, in catalog order.
    pub files: Vec<String>,
    /// Total size of the files as reported by the catalog.
    pub file_size_bytes: u64,
    /// When the creation was installed.
    pub timestamp: DateTime<Utc>,
    /// Whether the creation keeps achievements enabled.
    pub achievement_safe: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
}

/// A catalog row that cannot be imported.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid creation {manifest_key}: {reason}")]
pub struct InvalidEntry {
    pub manifest_key: String,
    pub reason: String,
}

impl CreationEntry {
    /// Id of the imported mod, also the staging directory name.
    ///
    /// Unique per id and version. Path separators are replaced so the
    /// result is always a single path component.
    pub fn managed_id(&self, prefix: &str) -> String {
        let clean = |s: &str| s.replace(['/', '\\'], "_");
        format!("{}-{}-{}", prefix, clean(&self.id), clean(&self.version))
    }

    /// Checks that the entry lists at least one file and that every file
    /// stays inside the data root.
    pub fn validate(&self) -> Result<(), InvalidEntry> {
        let invalid = |reason: String| InvalidEntry {
            manifest_key: self.manifest_key.clone(),
            reason,
        };

        if self.files.is_empty() {
            return Err(invalid("no files listed".to_string()));
        }
        for file in &self.files {
            if safe_relative_path(file).is_none() {
                return Err(invalid(format!("file path escapes data root: {}", file)));
            }
        }
        Ok(())
    }
}

/// Converts a catalog file entry to a relative path, rejecting anything that
/// could resolve outside the root it is joined to.
///
/// Backslashes are treated as separators since catalogs are written on Windows.
pub fn safe_relative_path(file: &str) -> Option<PathBuf> {
    let normalized = file.replace('\\', "/");
    let path = Path::new(&normalized);
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Working-copy state of one creation during import.
#[derive(Debug, Clone)]
pub struct StagedCreation {
    /// The creation being imported.
    pub creation: CreationEntry,
    /// Managed id the staging directory is named after.
    pub managed_id: String,
    /// Staging directory owned by this import.
    pub staging_path: PathBuf,
    /// Set only when archiving succeeded.
    pub archive_id: Option<String>,
    /// MD5 of the artifact, set only when archiving succeeded.
    pub content_hash: Option<String>,
    /// Artifact size, set only when archiving succeeded.
    pub artifact_size_bytes: Option<u64>,
    /// File name of the artifact, set only when archiving succeeded.
    pub artifact_file_name: Option<String>,
}

impl StagedCreation {
    /// Creates a staged creation with no artifact.
    pub fn new(creation: CreationEntry, managed_id: String, staging_path: PathBuf) -> Self {
        Self {
            creation,
            managed_id,
            staging_path,
            archive_id: None,
            content_hash: None,
            artifact_size_bytes: None,
            artifact_file_name: None,
        }
    }

    /// Records a successfully built artifact.
    pub fn attach_artifact(&mut self, artifact: &ArtifactInfo) {
        self.archive_id = Some(artifact.archive_id.clone());
        self.content_hash = Some(artifact.content_hash.clone());
        self.artifact_size_bytes = Some(artifact.size_bytes);
        self.artifact_file_name = Some(artifact.file_name.clone());
    }

    /// Archive reference, present only if all artifact fields are set.
    pub fn archive_ref(&self) -> Option<ArchiveRef> {
        match (
            &self.archive_id,
            &self.content_hash,
            self.artifact_size_bytes,
            &self.artifact_file_name,
        ) {
            (Some(archive_id), Some(content_hash), Some(size_bytes), Some(file_name)) => {
                Some(ArchiveRef {
                    archive_id: archive_id.clone(),
                    file_name: file_name.clone(),
                    content_hash: content_hash.clone(),
                    size_bytes,
                })
            }
            _ => None,
        }
    }
}

/// Archive fields of an import result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRef {
    pub archive_id: String,
    pub file_name: String,
    pub content_hash: String,
    pub size_bytes: u64,
}

/// Result handed to the host for each imported creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    /// Managed id of the new mod.
    pub id: String,
    /// Vendor id of the creation.
    pub creation_id: String,
    pub name: String,
    pub logical_file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
    pub short_description: String,
    pub notes: String,
    /// Store page search URL.
    pub url: String,
    /// Provenance marker understood by the host.
    pub source: String,
    pub install_time: DateTime<Utc>,
    /// Present iff an archive was requested and built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<ArchiveRef>,
}

impl ImportResult {
    /// Builds the result for a staged creation.
    pub fn from_staged(staged: &StagedCreation, provider_name: &str, url: String) -> Self {
        let creation = &staged.creation;
        let now = Utc::now();
        Self {
            id: staged.managed_id.clone(),
            creation_id: creation.id.clone(),
            name: creation.title.clone(),
            logical_file_name: creation.title.clone(),
            author: creation.author.clone(),
            version: creation.version.clone(),
            description: creation.description.clone(),
            picture_url: creation.picture_url.clone(),
            short_description: format!("Imported from {}", provider_name),
            notes: format!(
                "Imported from {} {}\nAchievement Safe: {}",
                provider_name,
                now.format("%Y-%m-%d"),
                if creation.achievement_safe { "YES" } else { "NO" }
            ),
            url,
            source: "website".to_string(),
            install_time: now,
            archive: staged.archive_ref(),
        }
    }
}
