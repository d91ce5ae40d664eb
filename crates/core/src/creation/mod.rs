//! Creation model: catalog entries, staged working copies and import results.

mod resolver;
mod types;

pub use resolver::{id_from_key, EntryResolver};
pub use types::{
    safe_relative_path, ArchiveRef, CreationEntry, ImportResult, InvalidEntry, StagedCreation,
};
