//! Import orchestrator implementation.
//!
//! Sequences a scan or an import over one product's catalog:
//! - Scan: load, resolve and validate entries, stream them out
//! - Import: per creation stage, archive, hand off and clean up, then
//!   remove the fully imported entries from the catalog

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::archiver::{Archiver, ZipArchiver};
use crate::catalog::{CatalogStore, FsCatalogStore};
use crate::cleanup::cleanup;
use crate::config::Config;
use crate::creation::{CreationEntry, EntryResolver, ImportResult};
use crate::protocol::{EventSender, ImportRequest, LogLevel, PipelineEvent, ScanRequest};
use crate::staging::{FsStager, TransferProgress};

use super::config::ImportConfig;
use super::types::{CancelFlag, ImportError, ImportSummary, ItemPhase, ScanSummary};

const PROGRESS_BUFFER: usize = 64;

/// What happened to one creation.
#[derive(Debug, Default)]
struct ItemOutcome {
    /// The creation was handed to the host.
    imported: bool,
    /// Sources are gone, so the catalog entry can be removed.
    remove_key: bool,
}

/// Drives scans and imports against a catalog store, a stager and an
/// archiver, reporting through an [`EventSender`].
pub struct ImportOrchestrator {
    config: ImportConfig,
    catalog: Arc<dyn CatalogStore>,
    stager: FsStager,
    archiver: Arc<dyn Archiver>,
    resolver: EntryResolver,
}

impl ImportOrchestrator {
    pub fn new(
        config: ImportConfig,
        catalog: Arc<dyn CatalogStore>,
        stager: FsStager,
        archiver: Arc<dyn Archiver>,
    ) -> Self {
        let resolver = EntryResolver::new(config.provider_name.clone());
        Self {
            config,
            catalog,
            stager,
            archiver,
            resolver,
        }
    }

    /// Builds an orchestrator backed by the file system.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.import.clone(),
            Arc::new(FsCatalogStore::new(config.catalog.clone())),
            FsStager::new(config.transfer.clone()),
            Arc::new(ZipArchiver::new(config.archive.clone())),
        )
    }

    /// Loads the catalog and returns its valid entries in catalog order,
    /// plus one message per skipped row.
    async fn load_entries(
        &self,
        request: &ScanRequest,
        events: &EventSender,
    ) -> Result<(Vec<CreationEntry>, Vec<String>), ImportError> {
        let snapshot = self.catalog.load(&request.location()).await?;

        let mut entries = Vec::with_capacity(snapshot.len());
        let mut errors = Vec::new();
        for (key, raw) in snapshot.iter() {
            let entry = self.resolver.resolve(key, raw);
            match entry.validate() {
                Ok(()) => entries.push(entry),
                Err(e) => {
                    warn!("Skipping catalog entry: {}", e);
                    events.message(LogLevel::Warn, e.to_string()).await;
                    errors.push(e.to_string());
                }
            }
        }
        Ok((entries, errors))
    }

    /// Lists the importable creations of a catalog.
    ///
    /// Emits one `scanparsed` per valid entry, then `scancomplete`.
    pub async fn scan(
        &self,
        request: &ScanRequest,
        events: &EventSender,
    ) -> Result<ScanSummary, ImportError> {
        info!(product = %request.product_key, "Scanning catalog");
        let (entries, errors) = self.load_entries(request, events).await?;

        let total = entries.len();
        for entry in entries {
            events
                .emit(PipelineEvent::ScanParsed {
                    id: entry.id.clone(),
                    data: entry,
                })
                .await;
        }
        events
            .emit(PipelineEvent::ScanComplete {
                total,
                errors: errors.clone(),
            })
            .await;

        info!(product = %request.product_key, "Scan found {} creations", total);
        Ok(ScanSummary { total, errors })
    }

    /// Imports the requested creations.
    ///
    /// A failure of one creation is recorded and the batch continues.
    /// Cancellation is honored between creations. Entries of creations
    /// whose sources were fully removed are then deleted from the catalog,
    /// also after a cancellation.
    pub async fn import(
        &self,
        request: &ImportRequest,
        cancel: &CancelFlag,
        events: &EventSender,
    ) -> Result<ImportSummary, ImportError> {
        let (entries, _) = self.load_entries(&request.scan_request(), events).await?;

        let wanted: HashSet<&str> = request.ids.iter().map(String::as_str).collect();
        let found: HashSet<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        for id in &request.ids {
            if !found.contains(id.as_str()) {
                warn!(creation = %id, "Requested creation not in catalog");
                events
                    .message(
                        LogLevel::Warn,
                        format!("Creation {} was not found in the catalog", id),
                    )
                    .await;
            }
        }
        let selected: Vec<CreationEntry> = entries
            .into_iter()
            .filter(|e| wanted.contains(e.id.as_str()))
            .collect();

        let total = selected.len();
        info!(product = %request.product_key, "Importing {} creations", total);

        let mut summary = ImportSummary {
            total,
            ..Default::default()
        };
        let mut keys_to_remove = Vec::new();
        let mut processed = 0;

        for (idx, creation) in selected.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("Import cancelled after {} of {} creations", idx, total);
                summary.cancelled = true;
                break;
            }

            let outcome = self
                .import_one(creation, request, idx, total, events, &mut summary.errors)
                .await;
            processed = idx + 1;

            if outcome.imported {
                summary.succeeded += 1;
            }
            if outcome.remove_key {
                keys_to_remove.push(creation.manifest_key.clone());
            }
        }

        if !keys_to_remove.is_empty() {
            let removal = self
                .catalog
                .remove_entries(&request.location(), &keys_to_remove)
                .await?;
            debug!(
                "Removed {} catalog entries, {} already absent",
                removal.removed.len(),
                removal.missing.len()
            );
            summary.removed_keys = removal.removed;
        }

        let done = if summary.cancelled { processed } else { total };
        events.progress(done, total, "Import finished", None).await;
        events
            .emit(PipelineEvent::ImportComplete {
                total,
                succeeded: summary.succeeded,
                errors: summary.errors.clone(),
                cancelled: summary.cancelled,
            })
            .await;

        info!(
            "Import finished: {} of {} succeeded, {} errors",
            summary.succeeded,
            total,
            summary.errors.len()
        );
        Ok(summary)
    }

    async fn import_one(
        &self,
        creation: &CreationEntry,
        request: &ImportRequest,
        idx: usize,
        total: usize,
        events: &EventSender,
        errors: &mut Vec<String>,
    ) -> ItemOutcome {
        let mut outcome = ItemOutcome::default();
        let managed_id = creation.managed_id(&self.config.managed_id_prefix);
        let heading = format!("Importing \"{}\"...", creation.title);
        let describe = |e: ImportError| {
            format!("Failed to import {} ({}): {}", creation.title, creation.id, e)
        };

        log_phase(creation, ItemPhase::Pending);
        events.progress(idx, total, heading.clone(), None).await;
        log_phase(creation, ItemPhase::Staging);

        let (tx, rx) = mpsc::channel::<TransferProgress>(PROGRESS_BUFFER);
        let forward = spawn_forwarder(
            rx,
            events.clone(),
            idx,
            total,
            heading.clone(),
            |p: TransferProgress| p.detail,
        );
        let staged = self
            .stager
            .stage(
                creation,
                &managed_id,
                &request.source_data_root,
                &request.staging_root,
                Some(tx),
            )
            .await;
        let _ = forward.await;

        let mut staged = match staged {
            Ok(staged) => staged,
            Err(e) => {
                log_phase(creation, ItemPhase::Failed);
                error!(creation = %creation.id, "Staging failed: {}", e);
                errors.push(describe(e.into()));
                return outcome;
            }
        };

        if request.create_archives {
            log_phase(creation, ItemPhase::Archiving);
            let (tx, rx) = mpsc::channel::<String>(PROGRESS_BUFFER);
            let forward =
                spawn_forwarder(rx, events.clone(), idx, total, heading.clone(), |d: String| d);
            let archived = self
                .archiver
                .archive(&staged, &request.downloads_root, Some(tx))
                .await;
            let _ = forward.await;

            match archived {
                Ok(artifact) => {
                    staged.attach_artifact(&artifact);
                    events
                        .progress(
                            idx,
                            total,
                            heading.clone(),
                            Some("Moving archive to downloads".to_string()),
                        )
                        .await;
                    events
                        .emit(PipelineEvent::RegisterArchive {
                            id: artifact.archive_id.clone(),
                            file_name: artifact.file_name.clone(),
                            path: artifact.temp_path.clone(),
                            size: artifact.size_bytes,
                            display_name: creation.title.clone(),
                            display_version: creation.version.clone(),
                        })
                        .await;
                }
                Err(e) => {
                    warn!(creation = %creation.id, "Archive failed, importing without it: {}", e);
                    errors.push(describe(e.into()));
                }
            }
        }

        let url = self
            .config
            .store_url_for(&request.product_key, &creation.title);
        let result = ImportResult::from_staged(&staged, &self.config.provider_name, url);
        events.emit(PipelineEvent::ImportedMod { result }).await;
        outcome.imported = true;

        log_phase(creation, ItemPhase::Cleanup);
        events
            .progress(
                idx,
                total,
                heading,
                Some("Removing copied files".to_string()),
            )
            .await;
        match cleanup(creation, &request.source_data_root, &staged.staging_path).await {
            Ok(()) => {
                outcome.remove_key = true;
                log_phase(creation, ItemPhase::Succeeded);
            }
            Err(e) => {
                // Imported, but the catalog keeps the entry while sources remain.
                warn!(creation = %creation.id, "Cleanup failed: {}", e);
                errors.push(describe(e.into()));
            }
        }

        outcome
    }
}

fn log_phase(creation: &CreationEntry, phase: ItemPhase) {
    debug!(creation = %creation.id, phase = %phase, "Creation phase changed");
}

/// Relays detail updates as `importprogress` events until the sender side
/// is dropped.
fn spawn_forwarder<T, F>(
    mut rx: mpsc::Receiver<T>,
    events: EventSender,
    done: usize,
    total: usize,
    message: String,
    detail: F,
) -> JoinHandle<()>
where
    T: Send + 'static,
    F: Fn(T) -> String + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            events
                .progress(done, total, message.clone(), Some(detail(update)))
                .await;
        }
    })
}
