//! Error types for the staging module.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::PathBuf;
use thiserror::Error;

/// Per-file error messages keyed by catalog file path.
pub type FileErrors = BTreeMap<String, String>;

/// Errors that can occur while staging a creation.
#[derive(Debug, Error)]
pub enum StagingError {
    /// One or more files could not be transferred. The staging directory
    /// has been removed unless `kept_staging` is set.
    #[error("Copying files failed: {}", describe_file_errors(.file_errors))]
    StagingFailed {
        file_errors: FileErrors,
        /// Staging directory left in place because moved files could not
        /// be restored to their source.
        kept_staging: Option<PathBuf>,
    },

    /// Preparing the staging directory failed.
    #[error("Failed to prepare staging directory {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StagingError {
    /// Per-file errors, if this is a file level failure.
    pub fn file_errors(&self) -> Option<&FileErrors> {
        match self {
            Self::StagingFailed { file_errors, .. } => Some(file_errors),
            Self::Io { .. } => None,
        }
    }
}

/// Formats a per-file error map as `name: error; name: error`.
pub fn describe_file_errors(errors: &FileErrors) -> String {
    let mut out = String::new();
    for (idx, (file, error)) in errors.iter().enumerate() {
        if idx > 0 {
            out.push_str("; ");
        }
        let _ = write!(out, "{}: {}", file, error);
    }
    out
}
