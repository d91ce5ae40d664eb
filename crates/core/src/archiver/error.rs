use thiserror::Error;

/// Errors that can occur while building an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The archive could not be written, hashed or measured.
    #[error("Creating archive failed: {cause}")]
    ArchiveFailed { cause: String },
}

impl ArchiveError {
    pub fn failed(cause: impl Into<String>) -> Self {
        Self::ArchiveFailed {
            cause: cause.into(),
        }
    }
}
