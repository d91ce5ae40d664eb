//! Commands sent from the host to the worker.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::catalog::CatalogLocation;

/// Request to list the creations of one product's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub product_key: String,
    pub platform_data_root: PathBuf,
}

impl ScanRequest {
    pub fn location(&self) -> CatalogLocation {
        CatalogLocation::new(&self.product_key, &self.platform_data_root)
    }
}

/// Request to import a set of creations by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    /// Creation ids to import. Order is ignored; catalog order is used.
    pub ids: Vec<String>,
    /// Game data directory the creation files live in.
    pub source_data_root: PathBuf,
    pub product_key: String,
    pub platform_data_root: PathBuf,
    /// Directory that receives one staging folder per creation.
    pub staging_root: PathBuf,
    /// Downloads directory archives are destined for.
    pub downloads_root: PathBuf,
    #[serde(default)]
    pub create_archives: bool,
}

impl ImportRequest {
    pub fn location(&self) -> CatalogLocation {
        CatalogLocation::new(&self.product_key, &self.platform_data_root)
    }

    pub fn scan_request(&self) -> ScanRequest {
        ScanRequest {
            product_key: self.product_key.clone(),
            platform_data_root: self.platform_data_root.clone(),
        }
    }
}

/// A command read by the worker, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Command {
    /// Stop the running import at the next creation boundary.
    Cancel,
    Scan(ScanRequest),
    Import(ImportRequest),
    /// Any command type this worker does not know.
    #[serde(other)]
    Unknown,
}

impl Command {
    /// Wire name of the command type.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::Scan(_) => "scan",
            Self::Import(_) => "import",
            Self::Unknown => "unknown",
        }
    }
}
