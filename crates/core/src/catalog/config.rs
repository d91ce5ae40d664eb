//! Configuration for the catalog store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for the content catalog store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// File name of the catalog inside the product data directory.
    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// Key of the header pseudo-entry that carries catalog metadata.
    #[serde(default = "default_header_key")]
    pub header_key: String,

    /// Extra product key to data directory mappings.
    ///
    /// Entries here take precedence over the built-in table.
    #[serde(default)]
    pub products: BTreeMap<String, String>,
}

fn default_file_name() -> String {
    "ContentCatalog.txt".to_string()
}

fn default_header_key() -> String {
    "ContentCatalog".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            file_name: default_file_name(),
            header_key: default_header_key(),
            products: BTreeMap::new(),
        }
    }
}

impl CatalogConfig {
    /// Adds a product directory mapping.
    pub fn with_product(mut self, product_key: &str, directory: &str) -> Self {
        self.products
            .insert(product_key.to_string(), directory.to_string());
        self
    }
}
