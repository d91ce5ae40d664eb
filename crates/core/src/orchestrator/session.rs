//! Command loop run by the worker process.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::protocol::{decode_line, Command, EventSender, LogLevel, PipelineEvent};

use super::runner::ImportOrchestrator;
use super::types::{CancelFlag, ImportError};

struct Running {
    cancel: CancelFlag,
    handle: JoinHandle<()>,
}

/// Dispatches commands to the orchestrator with at most one scan or
/// import in flight.
pub struct ImportSession {
    orchestrator: Arc<ImportOrchestrator>,
    events: EventSender,
    current: Mutex<Option<Running>>,
}

impl ImportSession {
    pub fn new(orchestrator: Arc<ImportOrchestrator>, events: EventSender) -> Self {
        Self {
            orchestrator,
            events,
            current: Mutex::new(None),
        }
    }

    /// Whether a scan or import is still running.
    pub async fn is_busy(&self) -> bool {
        self.current
            .lock()
            .await
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    /// Handles one command without waiting for the operation it starts.
    pub async fn handle(&self, command: Command) {
        debug!("Received {} command", command.name());

        if let Command::Unknown = command {
            self.events.emit(PipelineEvent::fatal("Unknown command")).await;
            return;
        }

        let mut current = self.current.lock().await;

        if let Command::Cancel = command {
            match current.as_ref() {
                Some(running) if !running.handle.is_finished() => {
                    info!("Cancelling running import");
                    running.cancel.cancel();
                }
                _ => debug!("Nothing to cancel"),
            }
            return;
        }

        if current
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
        {
            warn!("Ignoring {} command while busy", command.name());
            self.events
                .message(
                    LogLevel::Warn,
                    format!(
                        "Ignoring {} command: another operation is in progress",
                        command.name()
                    ),
                )
                .await;
            return;
        }

        let cancel = CancelFlag::new();
        let orchestrator = self.orchestrator.clone();
        let events = self.events.clone();
        let flag = cancel.clone();

        let handle = tokio::spawn(async move {
            let operation = async {
                match command {
                    Command::Scan(request) => {
                        orchestrator.scan(&request, &events).await.map(|_| ())
                    }
                    Command::Import(request) => orchestrator
                        .import(&request, &flag, &events)
                        .await
                        .map(|_| ()),
                    Command::Cancel | Command::Unknown => Ok(()),
                }
            };
            let result = match AssertUnwindSafe(operation).catch_unwind().await {
                Ok(result) => result,
                Err(panic) => Err(ImportError::Unexpected(panic_message(panic.as_ref()))),
            };
            if let Err(e) = result {
                error!("Operation failed: {}", e);
                events.emit(PipelineEvent::fatal(e.to_string())).await;
            }
        });

        *current = Some(Running { cancel, handle });
    }

    /// Waits for the running operation, if any.
    pub async fn wait(&self) {
        let running = self.current.lock().await.take();
        if let Some(running) = running {
            if let Err(e) = running.handle.await {
                error!("Operation task failed: {}", e);
                self.events
                    .emit(PipelineEvent::fatal(format!("Operation task failed: {}", e)))
                    .await;
            }
        }
    }

    /// Reads JSON-line commands until EOF, then waits for the running
    /// operation.
    pub async fn run<R>(&self, reader: R) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match decode_line::<Command>(&line) {
                Ok(command) => self.handle(command).await,
                Err(e) => {
                    warn!("Invalid command line: {}", e);
                    self.events
                        .message(LogLevel::Error, format!("Invalid command: {}", e))
                        .await;
                }
            }
        }
        debug!("Command stream closed");
        self.wait().await;
        Ok(())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("Operation panicked: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("Operation panicked: {}", message)
    } else {
        "Operation panicked".to_string()
    }
}
