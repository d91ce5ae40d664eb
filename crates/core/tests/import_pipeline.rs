//! Import pipeline integration tests.
//!
//! These tests drive the orchestrator end to end over a temporary
//! directory tree:
//! - Scan reporting
//! - Batch semantics with per-creation failures
//! - Catalog rewrite after import
//! - Cancellation between creations
//! - Archive and cleanup failures

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::mpsc;

use creation_import_core::{
    archiver::{ArchiveError, Archiver, ArtifactInfo, ZipArchiver},
    catalog::{CatalogLocation, CatalogStore, FsCatalogStore},
    creation::StagedCreation,
    testing::{fixtures, MockArchiver, MockCatalogStore},
    CancelFlag, EventSender, FsStager, ImportConfig, ImportOrchestrator, ImportRequest,
    PipelineEvent, ScanRequest,
};

const SKYRIM_DIR: &str = "Skyrim Special Edition";

/// Directory layout for one test run.
struct TestHarness {
    temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        for dir in ["platform", "Data", "staging", "downloads"] {
            std::fs::create_dir_all(temp_dir.path().join(dir)).expect("Failed to create dir");
        }
        Self { temp_dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    fn data(&self) -> PathBuf {
        self.path("Data")
    }

    fn staging(&self) -> PathBuf {
        self.path("staging")
    }

    fn write_catalog(&self, rows: Value) -> PathBuf {
        fixtures::write_catalog(&self.path("platform"), SKYRIM_DIR, rows)
    }

    fn write_sources(&self, files: &[&str]) {
        fixtures::write_source_files(&self.data(), files);
    }

    fn scan_request(&self) -> ScanRequest {
        ScanRequest {
            product_key: "skyrimse".to_string(),
            platform_data_root: self.path("platform"),
        }
    }

    fn import_request(&self, ids: &[&str], create_archives: bool) -> ImportRequest {
        ImportRequest {
            ids: ids.iter().map(|id| id.to_string()).collect(),
            source_data_root: self.data(),
            product_key: "skyrimse".to_string(),
            platform_data_root: self.path("platform"),
            staging_root: self.staging(),
            downloads_root: self.path("downloads"),
            create_archives,
        }
    }
}

fn orchestrator(store: Arc<dyn CatalogStore>, archiver: Arc<dyn Archiver>) -> ImportOrchestrator {
    ImportOrchestrator::new(
        ImportConfig::default(),
        store,
        FsStager::with_defaults(),
        archiver,
    )
}

/// Runs an import with a large event buffer and returns the summary and
/// every event emitted.
async fn run_import(
    orchestrator: &ImportOrchestrator,
    request: &ImportRequest,
) -> (
    Result<creation_import_core::ImportSummary, creation_import_core::ImportError>,
    Vec<PipelineEvent>,
) {
    let (events, mut rx) = EventSender::channel(1024);
    let result = orchestrator
        .import(request, &CancelFlag::new(), &events)
        .await;
    drop(events);

    let mut collected = Vec::new();
    while let Some(event) = rx.recv().await {
        collected.push(event);
    }
    (result, collected)
}

fn imported_ids(events: &[PipelineEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            PipelineEvent::ImportedMod { result } => Some(result.id.clone()),
            _ => None,
        })
        .collect()
}

fn three_rows() -> Value {
    json!({
        "TM_1": fixtures::catalog_row("First", "1", &["first.esp"]),
        "TM_2": fixtures::catalog_row("Second", "1", &["second.esp", "second.bsa"]),
        "TM_3": fixtures::catalog_row("Third", "1", &["third.esp"])
    })
}

#[tokio::test]
async fn test_scan_emits_one_event_per_entry() {
    let harness = TestHarness::new();
    harness.write_catalog(three_rows());

    let orchestrator = orchestrator(
        Arc::new(FsCatalogStore::with_defaults()),
        Arc::new(MockArchiver::new()),
    );
    let (events, mut rx) = EventSender::channel(64);
    let summary = orchestrator
        .scan(&harness.scan_request(), &events)
        .await
        .unwrap();
    drop(events);

    let mut parsed = Vec::new();
    let mut complete = None;
    while let Some(event) = rx.recv().await {
        match event {
            PipelineEvent::ScanParsed { id, data } => {
                assert_eq!(data.id, id);
                parsed.push(id);
            }
            PipelineEvent::ScanComplete { total, errors } => complete = Some((total, errors)),
            _ => {}
        }
    }

    assert_eq!(parsed, vec!["1", "2", "3"]);
    assert_eq!(summary.total, 3);
    assert_eq!(complete, Some((3, vec![])));
}

#[tokio::test]
async fn test_scan_missing_catalog_is_empty() {
    let harness = TestHarness::new();
    let orchestrator = orchestrator(
        Arc::new(FsCatalogStore::with_defaults()),
        Arc::new(MockArchiver::new()),
    );
    let (events, _rx) = EventSender::channel(8);

    let summary = orchestrator
        .scan(&harness.scan_request(), &events)
        .await
        .unwrap();
    assert_eq!(summary.total, 0);
}

#[tokio::test]
async fn test_batch_continues_after_staging_failure() {
    let harness = TestHarness::new();
    let store = Arc::new(MockCatalogStore::new());
    store.set_entries(three_rows()).await;
    // second.bsa is missing, so creation 2 fails at staging
    harness.write_sources(&["first.esp", "second.esp", "third.esp"]);

    let orchestrator = orchestrator(store.clone(), Arc::new(MockArchiver::new()));
    let (result, events) = run_import(
        &orchestrator,
        &harness.import_request(&["1", "2", "3"], false),
    )
    .await;
    let summary = result.unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].starts_with("Failed to import Second (2): Copying files failed: second.bsa:"));
    assert_eq!(
        store.remove_calls().await,
        vec![vec!["TM_1".to_string(), "TM_3".to_string()]]
    );
    assert_eq!(
        imported_ids(&events),
        vec!["bethesdanet-1-1", "bethesdanet-3-1"]
    );

    // Creation 2 was rolled back
    assert!(harness.data().join("second.esp").exists());
    assert!(!harness.staging().join("bethesdanet-2-1").exists());
    assert!(harness.staging().join("bethesdanet-3-1/third.esp").exists());
}

#[tokio::test]
async fn test_example_scenario_rewrites_catalog() {
    let harness = TestHarness::new();
    let catalog_path = harness.write_catalog(json!({
        "A_1001": { "Title": "Alpha", "Files": ["a.esp"], "FilesSize": 100, "Version": "1" },
        "B_1002": { "Title": "Beta", "Files": ["b.esp", "b.bsa"], "FilesSize": 5000, "Version": "2" }
    }));
    harness.write_sources(&["a.esp", "b.esp", "b.bsa"]);

    let orchestrator = orchestrator(
        Arc::new(FsCatalogStore::with_defaults()),
        Arc::new(MockArchiver::new()),
    );
    let (result, events) = run_import(
        &orchestrator,
        &harness.import_request(&["1001", "1002"], false),
    )
    .await;
    let summary = result.unwrap();

    assert_eq!(imported_ids(&events), vec!["bethesdanet-1001-1", "bethesdanet-1002-2"]);
    assert_eq!(
        events.last(),
        Some(&PipelineEvent::ImportComplete {
            total: 2,
            succeeded: 2,
            errors: vec![],
            cancelled: false,
        })
    );
    assert_eq!(summary.removed_keys, vec!["A_1001", "B_1002"]);

    let store = FsCatalogStore::with_defaults();
    let snapshot = store
        .load(&CatalogLocation::new("skyrimse", harness.path("platform")))
        .await
        .unwrap();
    assert!(snapshot.is_empty());
    assert!(snapshot.header.is_some());

    let backups: Vec<_> = std::fs::read_dir(catalog_path.parent().unwrap())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".bak"))
        .collect();
    assert_eq!(backups.len(), 1);

    assert!(!harness.data().join("a.esp").exists());
    assert!(harness.staging().join("bethesdanet-1002-2/b.bsa").exists());
}

#[tokio::test]
async fn test_import_with_zip_archives_registers_archive() {
    let harness = TestHarness::new();
    harness.write_catalog(json!({
        "A_1001": fixtures::catalog_row("Alpha", "1", &["a.esp", "textures/a.dds"])
    }));
    harness.write_sources(&["a.esp", "textures/a.dds"]);

    let orchestrator = orchestrator(
        Arc::new(FsCatalogStore::with_defaults()),
        Arc::new(ZipArchiver::default()),
    );
    let (result, events) = run_import(&orchestrator, &harness.import_request(&["1001"], true)).await;
    assert_eq!(result.unwrap().succeeded, 1);

    let register = events
        .iter()
        .find_map(|e| match e {
            PipelineEvent::RegisterArchive {
                id,
                file_name,
                path,
                size,
                display_name,
                ..
            } => Some((id.clone(), file_name.clone(), path.clone(), *size, display_name.clone())),
            _ => None,
        })
        .expect("register-archive event");
    assert_eq!(register.1, "bethesdanet-1001-1.zip");
    assert_eq!(register.3, std::fs::metadata(&register.2).unwrap().len());
    assert_eq!(register.4, "Alpha");

    let result = events
        .iter()
        .find_map(|e| match e {
            PipelineEvent::ImportedMod { result } => Some(result.clone()),
            _ => None,
        })
        .unwrap();
    let archive = result.archive.expect("archive fields");
    assert_eq!(archive.archive_id, register.0);
    let bytes = std::fs::read(&register.2).unwrap();
    assert_eq!(archive.content_hash, format!("{:x}", md5::compute(&bytes)));

    // register-archive comes before importedmod
    let register_pos = events
        .iter()
        .position(|e| matches!(e, PipelineEvent::RegisterArchive { .. }))
        .unwrap();
    let imported_pos = events
        .iter()
        .position(|e| matches!(e, PipelineEvent::ImportedMod { .. }))
        .unwrap();
    assert!(register_pos < imported_pos);
}

#[tokio::test]
async fn test_archive_failure_still_imports_creation() {
    let harness = TestHarness::new();
    let store = Arc::new(MockCatalogStore::new());
    store
        .set_entries(json!({
            "A_1001": fixtures::catalog_row("Alpha", "1", &["a.esp"]),
            "B_1002": fixtures::catalog_row("Beta", "2", &["b.esp"])
        }))
        .await;
    harness.write_sources(&["a.esp", "b.esp"]);

    let archiver = Arc::new(MockArchiver::new());
    archiver.fail_for("1002").await;
    let orchestrator = orchestrator(store.clone(), archiver.clone());

    let (result, events) = run_import(
        &orchestrator,
        &harness.import_request(&["1001", "1002"], true),
    )
    .await;
    let summary = result.unwrap();

    assert_eq!(summary.succeeded, 2);
    assert_eq!(
        summary.errors,
        vec!["Failed to import Beta (1002): Creating archive failed: mock archive failure"]
    );
    assert_eq!(
        store.remove_calls().await,
        vec![vec!["A_1001".to_string(), "B_1002".to_string()]]
    );

    let archives: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            PipelineEvent::ImportedMod { result } => Some((result.id.clone(), result.archive.is_some())),
            _ => None,
        })
        .collect();
    assert_eq!(
        archives,
        vec![
            ("bethesdanet-1001-1".to_string(), true),
            ("bethesdanet-1002-2".to_string(), false)
        ]
    );
}

/// Archiver that deletes a staged file and then fails, leaving cleanup
/// without a staged copy to check against.
struct DestructiveArchiver;

#[async_trait]
impl Archiver for DestructiveArchiver {
    async fn archive(
        &self,
        staged: &StagedCreation,
        _downloads_root: &Path,
        _progress: Option<mpsc::Sender<String>>,
    ) -> Result<ArtifactInfo, ArchiveError> {
        for file in &staged.creation.files {
            let _ = tokio::fs::remove_file(staged.staging_path.join(file)).await;
        }
        Err(ArchiveError::failed("disk full"))
    }
}

#[tokio::test]
async fn test_cleanup_failure_keeps_catalog_entry() {
    let harness = TestHarness::new();
    let store = Arc::new(MockCatalogStore::new());
    store
        .set_entries(json!({ "A_1001": fixtures::catalog_row("Alpha", "1", &["a.esp"]) }))
        .await;
    harness.write_sources(&["a.esp"]);

    let orchestrator = orchestrator(store.clone(), Arc::new(DestructiveArchiver));
    let (result, _events) = run_import(&orchestrator, &harness.import_request(&["1001"], true)).await;
    let summary = result.unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.errors.len(), 2);
    assert!(summary.errors[1].contains("Imported file does not exist for Alpha"));
    assert!(store.remove_calls().await.is_empty());
    assert_eq!(store.keys().await, vec!["A_1001"]);
}

#[tokio::test]
async fn test_cancel_stops_at_next_creation() {
    let harness = TestHarness::new();
    let store = Arc::new(MockCatalogStore::new());
    store.set_entries(three_rows()).await;
    harness.write_sources(&["first.esp", "second.esp", "second.bsa", "third.esp"]);

    let orchestrator = orchestrator(store.clone(), Arc::new(MockArchiver::new()));
    let request = harness.import_request(&["1", "2", "3"], false);
    let cancel = CancelFlag::new();

    // A one-slot channel keeps the orchestrator at most one event ahead
    let (events, mut rx) = EventSender::channel(1);
    let reader_cancel = cancel.clone();
    let reader = async move {
        let mut collected = Vec::new();
        while let Some(event) = rx.recv().await {
            if let PipelineEvent::ImportProgress {
                done: 0,
                detail: None,
                ..
            } = &event
            {
                reader_cancel.cancel();
            }
            let finished = matches!(event, PipelineEvent::ImportComplete { .. });
            collected.push(event);
            if finished {
                break;
            }
        }
        collected
    };

    let (result, collected) = tokio::join!(orchestrator.import(&request, &cancel, &events), reader);
    let summary = result.unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 1);
    assert!(summary.errors.is_empty());
    assert_eq!(store.remove_calls().await, vec![vec!["TM_1".to_string()]]);
    assert_eq!(imported_ids(&collected), vec!["bethesdanet-1-1"]);
    assert!(matches!(
        collected.last(),
        Some(PipelineEvent::ImportComplete { cancelled: true, succeeded: 1, .. })
    ));
    assert!(harness.data().join("second.esp").exists());
}

#[tokio::test]
async fn test_catalog_removal_failure_is_fatal() {
    let harness = TestHarness::new();
    let store = Arc::new(MockCatalogStore::new());
    store
        .set_entries(json!({ "A_1001": fixtures::catalog_row("Alpha", "1", &["a.esp"]) }))
        .await;
    store.set_next_remove_error("read-only file system").await;
    harness.write_sources(&["a.esp"]);

    let orchestrator = orchestrator(store, Arc::new(MockArchiver::new()));
    let (result, events) = run_import(&orchestrator, &harness.import_request(&["1001"], false)).await;

    let err = result.unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("read-only file system"));
    assert!(!events
        .iter()
        .any(|e| matches!(e, PipelineEvent::ImportComplete { .. })));
}
