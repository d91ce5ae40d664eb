//! Host side of the worker process.

use serde_json::json;
use std::ffi::OsStr;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdin, Command as ProcessCommand};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::codec::{decode_line, write_line, ProtocolError};
use super::command::{Command, ImportRequest, ScanRequest};
use super::event::{LogLevel, PipelineEvent};

const EVENT_BUFFER: usize = 256;

/// Spawns the worker binary and exchanges JSON lines with it.
///
/// Stdout lines are decoded into events. Lines that do not decode, and
/// everything the worker writes to stderr, are delivered as `message`
/// events. When the process ends an `exit` event is delivered last.
pub struct WorkerClient {
    stdin: Option<ChildStdin>,
    events: mpsc::Receiver<PipelineEvent>,
    kill_tx: Option<oneshot::Sender<()>>,
    waiter: JoinHandle<()>,
}

impl WorkerClient {
    /// Spawns `program` with no arguments.
    pub fn spawn(program: impl AsRef<OsStr>) -> Result<Self, ProtocolError> {
        Self::spawn_command(ProcessCommand::new(program))
    }

    /// Spawns a prepared command. Stdio is overridden with pipes.
    pub fn spawn_command(mut command: ProcessCommand) -> Result<Self, ProtocolError> {
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().ok_or(ProtocolError::Closed)?;
        let stderr = child.stderr.take().ok_or(ProtocolError::Closed)?;

        let (tx, events) = mpsc::channel(EVENT_BUFFER);

        let stdout_task = {
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let event = match decode_line::<PipelineEvent>(&line) {
                        Ok(event) => event,
                        Err(e) => {
                            debug!("Undecodable worker output: {}", e);
                            PipelineEvent::Message {
                                level: LogLevel::Error,
                                message: format!("Invalid worker output: {}", line),
                                metadata: None,
                            }
                        }
                    };
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
            })
        };

        let stderr_task = {
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    let event = PipelineEvent::Message {
                        level: LogLevel::Debug,
                        message: line,
                        metadata: Some(json!({ "stream": "stderr" })),
                    };
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
            })
        };

        let (kill_tx, kill_rx) = oneshot::channel();
        let waiter = tokio::spawn(wait_for_exit(child, kill_rx, stdout_task, stderr_task, tx));

        Ok(Self {
            stdin,
            events,
            kill_tx: Some(kill_tx),
            waiter,
        })
    }

    /// Writes one command line to the worker.
    pub async fn send(&mut self, command: &Command) -> Result<(), ProtocolError> {
        let stdin = self.stdin.as_mut().ok_or(ProtocolError::Closed)?;
        write_line(stdin, command).await
    }

    pub async fn scan(&mut self, request: ScanRequest) -> Result<(), ProtocolError> {
        self.send(&Command::Scan(request)).await
    }

    pub async fn import(&mut self, request: ImportRequest) -> Result<(), ProtocolError> {
        self.send(&Command::Import(request)).await
    }

    pub async fn cancel(&mut self) -> Result<(), ProtocolError> {
        self.send(&Command::Cancel).await
    }

    /// Next event from the worker, `None` once the stream has ended.
    pub async fn next_event(&mut self) -> Option<PipelineEvent> {
        self.events.recv().await
    }

    /// Closes the worker's stdin. The worker finishes its current
    /// operation and exits.
    pub fn close_input(&mut self) {
        self.stdin.take();
    }

    /// Kills the worker and waits for the event stream to finish.
    pub async fn dispose(mut self) {
        self.stdin.take();
        if let Some(kill_tx) = self.kill_tx.take() {
            let _ = kill_tx.send(());
        }
        if let Err(e) = (&mut self.waiter).await {
            warn!("Worker waiter task failed: {}", e);
        }
    }
}

async fn wait_for_exit(
    mut child: Child,
    kill_rx: oneshot::Receiver<()>,
    stdout_task: JoinHandle<()>,
    stderr_task: JoinHandle<()>,
    tx: mpsc::Sender<PipelineEvent>,
) {
    let status = tokio::select! {
        status = child.wait() => status,
        _ = kill_rx => {
            if let Err(e) = child.kill().await {
                warn!("Failed to kill worker: {}", e);
            }
            child.wait().await
        }
    };

    let _ = stdout_task.await;
    let _ = stderr_task.await;

    let code = match status {
        Ok(status) => status.code(),
        Err(e) => {
            warn!("Failed to wait for worker: {}", e);
            None
        }
    };
    debug!("Worker exited with code {:?}", code);
    let _ = tx.send(PipelineEvent::Exit { code }).await;
}
