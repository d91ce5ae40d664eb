//! Import configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the import pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Prefix of managed ids and staging directory names.
    #[serde(default = "default_prefix")]
    pub managed_id_prefix: String,

    /// Provider named in notes and descriptions of imported mods.
    /// Also the author of creations that list none.
    #[serde(default = "default_provider")]
    pub provider_name: String,

    /// Store search URL. `{product}` is replaced with the product key and
    /// `{query}` with the url-encoded creation title.
    #[serde(default = "default_store_url")]
    pub store_url: String,

    /// Capacity of the event channel between the pipeline and its reader.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_prefix() -> String {
    "bethesdanet".to_string()
}

fn default_provider() -> String {
    "Bethesda.net".to_string()
}

fn default_store_url() -> String {
    "https://creations.bethesda.net/en/{product}/all?text={query}".to_string()
}

fn default_event_buffer() -> usize {
    256
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            managed_id_prefix: default_prefix(),
            provider_name: default_provider(),
            store_url: default_store_url(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl ImportConfig {
    /// Store search URL for a creation title.
    pub fn store_url_for(&self, product_key: &str, title: &str) -> String {
        self.store_url
            .replace("{product}", product_key)
            .replace("{query}", &urlencoding::encode(title))
    }
}
