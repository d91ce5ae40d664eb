use tokio::sync::mpsc;

use super::event::{LogLevel, PipelineEvent};

/// Handle for emitting pipeline events.
///
/// Cheaply cloneable. Events go through a bounded channel that the owner
/// drains, for example onto stdout in the worker binary. A closed channel
/// is logged and never fails the caller.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::Sender<PipelineEvent>,
}

impl EventSender {
    pub fn new(tx: mpsc::Sender<PipelineEvent>) -> Self {
        Self { tx }
    }

    /// Creates a sender together with its receiving end.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<PipelineEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Emit an event, waiting for channel capacity.
    pub async fn emit(&self, event: PipelineEvent) {
        if let Err(e) = self.tx.send(event).await {
            tracing::error!("Failed to emit pipeline event: {}", e);
        }
    }

    /// Emit a `message` event.
    pub async fn message(&self, level: LogLevel, message: impl Into<String>) {
        self.emit(PipelineEvent::message(level, message)).await;
    }

    /// Emit an `importprogress` event.
    pub async fn progress(
        &self,
        done: usize,
        total: usize,
        message: impl Into<String>,
        detail: Option<String>,
    ) {
        self.emit(PipelineEvent::ImportProgress {
            done,
            total,
            message: message.into(),
            detail,
        })
        .await;
    }
}
