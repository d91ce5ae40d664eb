//! Events streamed from the worker to the host.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use crate::creation::{CreationEntry, ImportResult};

/// Severity of a `message` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// An event written by the worker, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum PipelineEvent {
    /// The running operation stopped on an unrecoverable error.
    Fatal { error: String },
    /// The worker process ended. Synthesized by the client.
    Exit { code: Option<i32> },
    Message {
        level: LogLevel,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Value>,
    },
    ScanParsed { id: String, data: CreationEntry },
    ScanComplete { total: usize, errors: Vec<String> },
    ImportedMod { result: ImportResult },
    ImportProgress {
        done: usize,
        total: usize,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    /// An archive was built and should be moved into the downloads
    /// directory and registered.
    #[serde(rename = "register-archive")]
    RegisterArchive {
        id: String,
        file_name: String,
        path: PathBuf,
        size: u64,
        display_name: String,
        display_version: String,
    },
    ImportComplete {
        total: usize,
        succeeded: usize,
        errors: Vec<String>,
        #[serde(default)]
        cancelled: bool,
    },
    /// Any event type this side does not know.
    #[serde(other)]
    Unknown,
}

impl PipelineEvent {
    pub fn message(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Message {
            level,
            message: message.into(),
            metadata: None,
        }
    }

    pub fn fatal(error: impl Into<String>) -> Self {
        Self::Fatal {
            error: error.into(),
        }
    }

    /// Whether the event ends the current scan or import.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::ScanComplete { .. } | Self::ImportComplete { .. } | Self::Fatal { .. }
        )
    }
}
