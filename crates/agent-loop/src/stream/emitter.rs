use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use agent_core::{AgentError, EventEnvelope, StreamEvent};

/// Sending half of a turn's event stream.
///
/// Stamps every event, refuses to send anything after a terminal event, and
/// turns a vanished consumer into cancellation of the turn.
pub struct EventEmitter {
    tx: mpsc::Sender<EventEnvelope>,
    cancel_token: CancellationToken,
    terminated: AtomicBool,
}

impl EventEmitter {
    pub fn new(tx: mpsc::Sender<EventEnvelope>, cancel_token: CancellationToken) -> Self {
        Self {
            tx,
            cancel_token,
            terminated: AtomicBool::new(false),
        }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Waits for channel capacity, so a slow consumer slows the turn down.
    pub async fn emit(&self, event: StreamEvent) -> Result<(), AgentError> {
        if self.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        if event.is_terminal() {
            if self.terminated.swap(true, Ordering::SeqCst) {
                log::warn!("Dropping second terminal event {:?}", event);
                return Ok(());
            }
        } else if self.is_terminated() {
            log::warn!("Dropping event emitted after turn end: {:?}", event);
            return Ok(());
        }

        if self.tx.send(EventEnvelope::now(event)).await.is_err() {
            self.cancel_token.cancel();
            return Err(AgentError::Cancelled);
        }

        Ok(())
    }

    pub async fn content(&self, content: impl Into<String>) -> Result<(), AgentError> {
        self.emit(StreamEvent::content(content)).await
    }
}
