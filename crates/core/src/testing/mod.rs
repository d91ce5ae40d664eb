//! Testing utilities and mock implementations.
//!
//! Mocks for every seam of the pipeline, so orchestrator and host tests can
//! run without real catalogs or archives.
//!
//! # Example
//!
//! ```rust,ignore
//! use creation_import_core::testing::{MockArchiver, MockCatalogStore};
//!
//! let store = Arc::new(MockCatalogStore::new());
//! let archiver = Arc::new(MockArchiver::new());
//! archiver.fail_for("1002").await;
//!
//! let orchestrator = ImportOrchestrator::new(config, store.clone(), stager, archiver);
//! ```

mod mock_archiver;
mod mock_catalog_store;
mod mock_mover;
mod mock_registry;

pub use mock_archiver::MockArchiver;
pub use mock_catalog_store::MockCatalogStore;
pub use mock_mover::CrossDeviceMover;
pub use mock_registry::{InMemoryRegistry, RegistryCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, Utc};
    use serde_json::{json, Value};
    use std::path::{Path, PathBuf};

    use crate::creation::{CreationEntry, ImportResult};

    /// Header pseudo-entry written by [`write_catalog`].
    pub fn catalog_header() -> Value {
        json!({
            "Description": "This file holds a database of any Creations downloaded or installed, in JSON format",
            "Version": "1.1"
        })
    }

    /// A catalog row with the fields the importer reads.
    pub fn catalog_row(title: &str, version: &str, files: &[&str]) -> Value {
        json!({
            "AchievementSafe": true,
            "Files": files,
            "FilesSize": 1024,
            "Timestamp": 1_700_000_000,
            "Title": title,
            "Version": version
        })
    }

    /// Writes `<platform_root>/<product_dir>/ContentCatalog.txt` with the
    /// header followed by `rows`. Returns the catalog path.
    pub fn write_catalog(platform_root: &Path, product_dir: &str, rows: Value) -> PathBuf {
        let mut catalog = serde_json::Map::new();
        catalog.insert("ContentCatalog".to_string(), catalog_header());
        if let Value::Object(rows) = rows {
            catalog.extend(rows);
        }

        let dir = platform_root.join(product_dir);
        std::fs::create_dir_all(&dir).expect("create catalog dir");
        let path = dir.join("ContentCatalog.txt");
        let text = serde_json::to_string_pretty(&Value::Object(catalog)).expect("render catalog");
        std::fs::write(&path, text).expect("write catalog");
        path
    }

    /// Creates each file under `data_root` with its own name as content.
    pub fn write_source_files(data_root: &Path, files: &[&str]) {
        for file in files {
            let path = data_root.join(file);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("create source dir");
            }
            std::fs::write(&path, file.as_bytes()).expect("write source file");
        }
    }

    /// A valid creation entry.
    pub fn creation_entry(id: &str, title: &str, files: &[&str]) -> CreationEntry {
        CreationEntry {
            id: id.to_string(),
            manifest_key: format!("TM_{}", id),
            title: title.to_string(),
            version: "1".to_string(),
            files: files.iter().map(|f| f.to_string()).collect(),
            file_size_bytes: 1024,
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            achievement_safe: true,
            description: None,
            author: Some("Bethesda.net".to_string()),
            picture_url: None,
        }
    }

    /// An import result without archive.
    pub fn import_result(id: &str, title: &str) -> ImportResult {
        ImportResult {
            id: id.to_string(),
            creation_id: id.rsplit('-').nth(1).unwrap_or(id).to_string(),
            name: title.to_string(),
            logical_file_name: title.to_string(),
            author: Some("Bethesda.net".to_string()),
            version: "1".to_string(),
            description: None,
            picture_url: None,
            short_description: "Imported from Bethesda.net".to_string(),
            notes: "Imported from Bethesda.net".to_string(),
            url: String::new(),
            source: "website".to_string(),
            install_time: DateTime::<Utc>::UNIX_EPOCH,
            archive: None,
        }
    }
}
