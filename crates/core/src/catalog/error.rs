//! Error types for the catalog module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or rewriting the content catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The product key has no known data directory.
    #[error("Unsupported product: {product_key}")]
    UnsupportedProduct { product_key: String },

    /// The catalog file does not exist.
    ///
    /// `load` absorbs this into an empty snapshot.
    #[error("Catalog not found: {path}")]
    NotFound { path: PathBuf },

    /// The catalog file exists but could not be parsed.
    #[error("Corrupt catalog at {path}: {reason}")]
    CorruptCatalog { path: PathBuf, reason: String },

    /// Reading, backing up or rewriting the catalog failed.
    #[error("Catalog I/O error at {path}")]
    CatalogIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    /// Creates a catalog I/O error.
    pub fn io(path: PathBuf, source: std::io::Error) -> Self {
        Self::CatalogIo { path, source }
    }
}
