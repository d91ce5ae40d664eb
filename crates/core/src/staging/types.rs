//! Types for the staging module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Progress update emitted once per file while staging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferProgress {
    /// Creation being staged.
    pub creation_id: String,
    /// Index of the file in catalog order.
    pub file_index: usize,
    /// Total files in the creation.
    pub total_files: usize,
    /// File name being transferred.
    pub file_name: String,
    /// Human readable detail line.
    pub detail: String,
}

/// How a file reached the staging directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMethod {
    /// Renamed in place on the same filesystem.
    Renamed,
    /// Copied across filesystems, then the source was deleted.
    CopiedAcross,
}

/// A file that was transferred into staging.
#[derive(Debug, Clone)]
pub struct TransferredFile {
    /// Original location in the source data root.
    pub source: PathBuf,
    /// Location inside the staging directory.
    pub target: PathBuf,
    /// How the file was transferred.
    pub method: TransferMethod,
    /// Whether the source path no longer holds the file.
    pub source_removed: bool,
}
