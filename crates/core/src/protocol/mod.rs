//! Wire protocol between the host and the worker process.
//!
//! Both directions carry one JSON object per line with a `type` tag and
//! camelCase fields. [`Command`] flows host to worker, [`PipelineEvent`]
//! flows back. [`EventSender`] is the in-process handle the pipeline emits
//! through and [`WorkerClient`] is the host side of a spawned worker.

mod channel;
mod client;
mod codec;
mod command;
mod event;

pub use channel::EventSender;
pub use client::WorkerClient;
pub use codec::{decode_line, encode_line, write_line, ProtocolError};
pub use command::{Command, ImportRequest, ScanRequest};
pub use event::{LogLevel, PipelineEvent};
