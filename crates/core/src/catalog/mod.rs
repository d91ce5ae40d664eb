//! Catalog module for reading and rewriting the vendor content catalog.
//!
//! The catalog is a JSON object keyed by manifest key, with one header
//! pseudo-entry carrying catalog metadata. This module provides the
//! `CatalogStore` trait and the file backed `FsCatalogStore`.
//!
//! # Features
//!
//! - Per-product catalog location resolution
//! - Missing catalog treated as empty
//! - Timestamped backup before every rewrite
//! - Atomic rewrite through a sibling temp file
//! - No write when nothing would change

mod config;
mod error;
mod fs_store;
mod product;
mod store;
mod types;

pub use config::CatalogConfig;
pub use error::CatalogError;
pub use fs_store::FsCatalogStore;
pub use product::product_directory;
pub use store::CatalogStore;
pub use types::{CatalogLocation, CatalogSnapshot, RemovalOutcome};
