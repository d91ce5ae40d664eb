pub mod archiver;
pub mod catalog;
pub mod cleanup;
pub mod config;
pub mod creation;
pub mod host;
pub mod orchestrator;
pub mod protocol;
pub mod staging;
pub mod testing;

pub use archiver::{ArchiveConfig, ArchiveError, Archiver, ArtifactInfo, Compression, ZipArchiver};
pub use catalog::{
    CatalogConfig, CatalogError, CatalogLocation, CatalogSnapshot, CatalogStore, FsCatalogStore,
    RemovalOutcome,
};
pub use cleanup::{cleanup, CleanupError};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config, ConfigError,
};
pub use creation::{CreationEntry, EntryResolver, ImportResult, StagedCreation};
pub use host::{DownloadRegistry, HostContext, HostDispatcher, ModRegistry, RegistryError};
pub use orchestrator::{
    CancelFlag, ImportConfig, ImportError, ImportOrchestrator, ImportSession, ImportSummary,
    ItemPhase, ScanSummary,
};
pub use protocol::{
    Command, EventSender, ImportRequest, LogLevel, PipelineEvent, ProtocolError, ScanRequest,
    WorkerClient,
};
pub use staging::{FileMover, FsStager, StagingError, TransferConfig};
