//! Conversion of raw catalog rows into creation entries.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::types::CreationEntry;

/// Resolves raw catalog rows into `CreationEntry` values.
///
/// Resolution never fails: absent or mistyped fields fall back to defaults
/// one field at a time.
#[derive(Debug, Clone)]
pub struct EntryResolver {
    default_author: String,
}

impl EntryResolver {
    /// Creates a resolver that credits entries to the given author.
    pub fn new(default_author: impl Into<String>) -> Self {
        Self {
            default_author: default_author.into(),
        }
    }

    /// Resolves one row and its manifest key.
    pub fn resolve(&self, key: &str, raw: &Value) -> CreationEntry {
        let id = id_from_key(key).to_string();

        let title = str_field(raw, "Title").unwrap_or_else(|| id.clone());
        let files = raw
            .get("Files")
            .and_then(Value::as_array)
            .map(|files| {
                files
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let file_size_bytes = raw
            .get("FilesSize")
            .or_else(|| raw.get("FileSize"))
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let timestamp = raw
            .get("Timestamp")
            .and_then(Value::as_i64)
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or(DateTime::UNIX_EPOCH);
        let version = match raw.get("Version") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let achievement_safe = raw
            .get("AchievementSafe")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        CreationEntry {
            id,
            manifest_key: key.to_string(),
            title,
            version,
            files,
            file_size_bytes,
            timestamp,
            achievement_safe,
            description: str_field(raw, "Description"),
            author: Some(str_field(raw, "Author").unwrap_or_else(|| self.default_author.clone())),
            picture_url: str_field(raw, "PictureUrl"),
        }
    }
}

/// Extracts the vendor id from a `<prefix>_<id>` manifest key.
///
/// The id is the segment between the first and second `_`. A key without
/// `_` is used whole.
pub fn id_from_key(key: &str) -> &str {
    key.split('_').nth(1).unwrap_or(key)
}

fn str_field(raw: &Value, name: &str) -> Option<String> {
    raw.get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
