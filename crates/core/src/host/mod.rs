//! Host side bridge for import events.
//!
//! The host owns the download and mod registries; this module only
//! describes them as traits and applies the event stream to them.

mod dispatcher;
mod traits;

pub use dispatcher::{HostContext, HostDispatcher};
pub use traits::{DownloadRegistry, ModRegistry, RegistryError};
