//! Mock catalog store for testing.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::catalog::{CatalogError, CatalogLocation, CatalogSnapshot, CatalogStore, RemovalOutcome};

/// In-memory `CatalogStore`.
///
/// Holds one set of rows shared by every location and records each
/// `remove_entries` call.
///
/// # Example
///
/// ```rust,ignore
/// let store = MockCatalogStore::new();
/// store.set_entries(json!({ "A_1001": { "Title": "Alpha", "Files": ["a.esp"] } })).await;
///
/// // ... run an import ...
///
/// assert_eq!(store.remove_calls().await, vec![vec!["A_1001".to_string()]]);
/// ```
#[derive(Debug, Default)]
pub struct MockCatalogStore {
    entries: Arc<RwLock<Map<String, Value>>>,
    remove_calls: Arc<RwLock<Vec<Vec<String>>>>,
    next_load_error: Arc<RwLock<Option<String>>>,
    next_remove_error: Arc<RwLock<Option<String>>>,
    load_delay: Arc<RwLock<Duration>>,
}

impl MockCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the rows. Anything but a JSON object clears them.
    pub async fn set_entries(&self, entries: Value) {
        let map = match entries {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        *self.entries.write().await = map;
    }

    /// Current row keys, in order.
    pub async fn keys(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }

    /// Keys passed to each `remove_entries` call.
    pub async fn remove_calls(&self) -> Vec<Vec<String>> {
        self.remove_calls.read().await.clone()
    }

    /// Makes the next `load` fail with an I/O error carrying `message`.
    pub async fn set_next_load_error(&self, message: &str) {
        *self.next_load_error.write().await = Some(message.to_string());
    }

    /// Makes the next `remove_entries` fail with an I/O error carrying
    /// `message`.
    pub async fn set_next_remove_error(&self, message: &str) {
        *self.next_remove_error.write().await = Some(message.to_string());
    }

    /// Delays every `load`.
    pub async fn set_load_delay(&self, delay: Duration) {
        *self.load_delay.write().await = delay;
    }

    fn io_error(message: String) -> CatalogError {
        CatalogError::io(PathBuf::from("mock://catalog"), std::io::Error::other(message))
    }
}

#[async_trait]
impl CatalogStore for MockCatalogStore {
    async fn load(&self, _location: &CatalogLocation) -> Result<CatalogSnapshot, CatalogError> {
        let delay = *self.load_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = self.next_load_error.write().await.take() {
            return Err(Self::io_error(message));
        }
        Ok(CatalogSnapshot {
            header: None,
            entries: self.entries.read().await.clone(),
        })
    }

    async fn remove_entries(
        &self,
        _location: &CatalogLocation,
        keys: &[String],
    ) -> Result<RemovalOutcome, CatalogError> {
        self.remove_calls.write().await.push(keys.to_vec());
        if let Some(message) = self.next_remove_error.write().await.take() {
            return Err(Self::io_error(message));
        }

        let mut entries = self.entries.write().await;
        let mut outcome = RemovalOutcome::default();
        for key in keys {
            if entries.shift_remove(key).is_some() {
                outcome.removed.push(key.clone());
            } else {
                outcome.missing.push(key.clone());
            }
        }
        Ok(outcome)
    }
}
