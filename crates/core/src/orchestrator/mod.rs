//! Import orchestration.
//!
//! [`ImportOrchestrator`] runs one scan or import at a time against a
//! catalog, streaming [`PipelineEvent`](crate::protocol::PipelineEvent)s.
//! [`ImportSession`] sits in front of it in the worker process: it decodes
//! commands, keeps a single operation in flight and routes cancellation.
//!
//! Creations are processed sequentially. Within a creation, per-item
//! failures are recorded and the batch continues; catalog failures end the
//! operation with a `fatal` event.

mod config;
mod runner;
mod session;
mod types;

pub use config::ImportConfig;
pub use runner::ImportOrchestrator;
pub use session::ImportSession;
pub use types::{CancelFlag, ImportError, ImportSummary, ItemPhase, ScanSummary};
