//! Staging and cleanup integration tests.
//!
//! Covers the cross-device fallback and the interaction between staging
//! and removal of the original files.

use std::sync::Arc;

use tempfile::TempDir;

use creation_import_core::{
    cleanup,
    staging::{FsStager, TransferConfig},
    testing::{fixtures, CrossDeviceMover},
    CleanupError,
};

#[tokio::test]
async fn test_cross_device_stage_copies_and_removes_source() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("Data");
    let staging = temp.path().join("staging");
    std::fs::create_dir_all(&staging).unwrap();
    fixtures::write_source_files(&data, &["b.esp", "textures/b.dds"]);

    let mover = Arc::new(CrossDeviceMover::new());
    let stager = FsStager::new(TransferConfig::default().with_buffer_size(4))
        .with_mover(mover.clone());
    let creation = fixtures::creation_entry("1002", "Beta", &["b.esp", "textures/b.dds"]);

    let staged = stager
        .stage(&creation, "bethesdanet-1002-1", &data, &staging, None)
        .await
        .unwrap();

    assert_eq!(mover.attempts(), 2);
    assert_eq!(
        std::fs::read_to_string(staged.staging_path.join("textures/b.dds")).unwrap(),
        "textures/b.dds"
    );
    assert!(!data.join("b.esp").exists());
    assert!(!data.join("textures/b.dds").exists());

    // Sources are already gone; cleanup tolerates that
    cleanup(&creation, &data, &staged.staging_path).await.unwrap();
}

#[tokio::test]
async fn test_cross_device_rollback_restores_sources() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("Data");
    let staging = temp.path().join("staging");
    std::fs::create_dir_all(&staging).unwrap();
    fixtures::write_source_files(&data, &["b.esp"]);

    let stager = FsStager::with_defaults().with_mover(Arc::new(CrossDeviceMover::new()));
    let creation = fixtures::creation_entry("1002", "Beta", &["b.esp", "b.bsa"]);

    let err = stager
        .stage(&creation, "bethesdanet-1002-1", &data, &staging, None)
        .await
        .unwrap_err();

    let file_errors = err.file_errors().unwrap();
    assert_eq!(file_errors.len(), 1);
    assert!(file_errors.contains_key("b.bsa"));
    assert_eq!(std::fs::read_to_string(data.join("b.esp")).unwrap(), "b.esp");
    assert!(!staging.join("bethesdanet-1002-1").exists());
}

#[tokio::test]
async fn test_cleanup_never_deletes_source_without_staged_copy() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("Data");
    let staging = temp.path().join("staging").join("bethesdanet-1001-1");
    std::fs::create_dir_all(&staging).unwrap();
    fixtures::write_source_files(&data, &["a.esp"]);

    let creation = fixtures::creation_entry("1001", "Alpha", &["a.esp"]);
    let err = cleanup(&creation, &data, &staging).await.unwrap_err();

    let CleanupError::CleanupFailed { file_errors } = err;
    assert!(file_errors["a.esp"].starts_with("Imported file does not exist for Alpha"));
    assert!(data.join("a.esp").exists());
}
