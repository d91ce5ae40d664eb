//! Types for the catalog module.

use serde_json::{Map, Value};
use std::path::PathBuf;

/// Where a catalog lives: a product key plus the platform data root
/// (the per-user application data directory).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLocation {
    /// Product key, e.g. `skyrimse`.
    pub product_key: String,
    /// Platform data root that contains the per-product directories.
    pub platform_data_root: PathBuf,
}

impl CatalogLocation {
    /// Creates a new catalog location.
    pub fn new(product_key: impl Into<String>, platform_data_root: impl Into<PathBuf>) -> Self {
        Self {
            product_key: product_key.into(),
            platform_data_root: platform_data_root.into(),
        }
    }
}

/// Parsed catalog content.
///
/// Rows are kept as raw JSON so a rewrite preserves fields this crate does
/// not model. The header pseudo-entry is held apart from the rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    /// Header pseudo-entry, if the catalog had one.
    pub header: Option<Value>,
    /// Rows keyed by manifest key, in file order.
    pub entries: Map<String, Value>,
}

impl CatalogSnapshot {
    /// Parses catalog text, splitting off the header pseudo-entry.
    pub fn parse(text: &str, header_key: &str) -> Result<Self, String> {
        let value: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
        let Value::Object(mut entries) = value else {
            return Err("top level of catalog is not an object".to_string());
        };
        let header = entries.shift_remove(header_key);
        Ok(Self { header, entries })
    }

    /// Renders the snapshot back to catalog text, header first.
    pub fn render(&self, header_key: &str) -> Result<String, serde_json::Error> {
        let mut out = Map::with_capacity(self.entries.len() + 1);
        if let Some(header) = &self.header {
            out.insert(header_key.to_string(), header.clone());
        }
        for (key, row) in &self.entries {
            out.insert(key.clone(), row.clone());
        }
        serde_json::to_string_pretty(&Value::Object(out))
    }

    /// Number of rows, not counting the header.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no rows.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates rows in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }
}

/// Outcome of a catalog entry removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalOutcome {
    /// Keys that were present and removed.
    pub removed: Vec<String>,
    /// Keys that were requested but not present.
    pub missing: Vec<String>,
    /// Backup written before the rewrite, if any.
    pub backup_path: Option<PathBuf>,
}

impl RemovalOutcome {
    /// Whether the catalog file was rewritten.
    pub fn rewritten(&self) -> bool {
        self.backup_path.is_some()
    }
}
