//! Staging of creation files.
//!
//! Files are moved out of the game's data root into a per-creation staging
//! directory. Renames are attempted first; files on another filesystem are
//! copied and then removed at the source.

mod config;
mod error;
mod mover;
mod transfer;
mod types;

pub use config::TransferConfig;
pub use error::{describe_file_errors, FileErrors, StagingError};
pub use mover::{is_cross_device, FileMover, TokioFileMover};
pub use transfer::FsStager;
pub use types::{TransferMethod, TransferProgress, TransferredFile};
