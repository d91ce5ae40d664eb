//! Types for the archiver module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A finished archive, ready to be moved into the downloads directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactInfo {
    /// Random archive id (16 lowercase hex chars).
    pub archive_id: String,
    /// File name of the archive, `<managed_id>.zip`.
    pub file_name: String,
    /// Where the archive was written.
    pub temp_path: PathBuf,
    /// Where the archive belongs in the downloads directory.
    pub destination_path: PathBuf,
    pub size_bytes: u64,
    /// Lowercase hex MD5 of the archive bytes.
    pub content_hash: String,
}
