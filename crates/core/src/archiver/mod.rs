//! Archive creation for staged creations.
//!
//! A staged creation is zipped into `<managed_id>.zip` inside its staging
//! directory, hashed with MD5 and described by an [`ArtifactInfo`]. Moving
//! the file into the downloads directory is left to the host.

mod config;
mod error;
mod traits;
mod types;
mod zip_archiver;

pub use config::{ArchiveConfig, Compression};
pub use error::ArchiveError;
pub use traits::Archiver;
pub use types::ArtifactInfo;
pub use zip_archiver::ZipArchiver;
