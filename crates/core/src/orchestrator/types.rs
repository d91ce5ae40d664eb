//! Types for the import orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::archiver::ArchiveError;
use crate::catalog::CatalogError;
use crate::cleanup::CleanupError;
use crate::staging::StagingError;

/// Errors that can occur during a scan or import.
///
/// Catalog level variants stop the whole operation. Staging, archive and
/// cleanup failures are scoped to one creation.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Unsupported product: {product_key}")]
    UnsupportedProduct { product_key: String },

    #[error("Catalog not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Corrupt catalog at {path}: {reason}")]
    CorruptCatalog { path: PathBuf, reason: String },

    #[error("Catalog I/O error at {path}: {source}")]
    CatalogIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    StagingFailed(#[from] StagingError),

    #[error(transparent)]
    ArchiveFailed(#[from] ArchiveError),

    #[error(transparent)]
    CleanupFailed(#[from] CleanupError),

    #[error("Import cancelled")]
    Cancelled,

    #[error("{0}")]
    Unexpected(String),
}

impl From<CatalogError> for ImportError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnsupportedProduct { product_key } => {
                Self::UnsupportedProduct { product_key }
            }
            CatalogError::NotFound { path } => Self::NotFound { path },
            CatalogError::CorruptCatalog { path, reason } => Self::CorruptCatalog { path, reason },
            CatalogError::CatalogIo { path, source } => Self::CatalogIo { path, source },
        }
    }
}

impl ImportError {
    /// Whether the error ends the whole operation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedProduct { .. }
                | Self::CorruptCatalog { .. }
                | Self::CatalogIo { .. }
                | Self::Unexpected(_)
        )
    }

    /// Whether the error is confined to a single creation.
    pub fn is_item_level(&self) -> bool {
        matches!(
            self,
            Self::StagingFailed(_) | Self::ArchiveFailed(_) | Self::CleanupFailed(_)
        )
    }
}

/// Phase of one creation within an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemPhase {
    Pending,
    Staging,
    Archiving,
    Cleanup,
    Succeeded,
    Failed,
}

impl fmt::Display for ItemPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Staging => "staging",
            Self::Archiving => "archiving",
            Self::Cleanup => "cleanup",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Cooperative cancellation flag shared between a session and a running
/// import. Checked between creations.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Valid creations reported.
    pub total: usize,
    /// Rows that were skipped as invalid.
    pub errors: Vec<String>,
}

/// Result of an import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Creations selected for import.
    pub total: usize,
    /// Creations handed to the host.
    pub succeeded: usize,
    /// One line per failed step.
    pub errors: Vec<String>,
    /// Manifest keys removed from the catalog.
    pub removed_keys: Vec<String>,
    pub cancelled: bool,
}
