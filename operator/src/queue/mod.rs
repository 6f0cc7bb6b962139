use async_trait::async_trait;
use ferrite_types::ReconcileMessage;
use tokio::sync::mpsc;

/// A message taken off the queue. `ack()` and `retry()` consume it so a
/// handler cannot accidentally do both or neither.
pub struct Delivery {
    pub message: ReconcileMessage,
    sender: mpsc::UnboundedSender<ReconcileMessage>,
}

impl Delivery {
    /// Acknowledges successful processing. Nothing to do against the
    /// in-memory transport beyond dropping the envelope: there is no
    /// redelivery to cancel once a message has already been taken off
    /// the channel.
    pub fn ack(self) {}

    /// Requeues the message onto the tail of the same channel, modeling
    /// "redeliver later" without holding up the worker that pulled it.
    pub fn retry(self) {
        if self.sender.send(self.message).is_err() {
            tracing::warn!("work queue closed, dropping retried message");
        }
    }
}

/// Work Queue: at-least-once delivery of reconcile messages. Ordering is
/// not guaranteed across messages; the reconciler must be idempotent per
/// message.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    async fn send(&self, message: ReconcileMessage);
}

/// In-memory transport backed by an unbounded mpsc channel. Cloning the
/// sender half is cheap and lock-free, which matters because the
/// reconciler's fan-out path enqueues new messages from inside a message
/// handler.
#[derive(Clone)]
pub struct InMemoryQueue {
    sender: mpsc::UnboundedSender<ReconcileMessage>,
}

pub struct Receiver {
    receiver: mpsc::UnboundedReceiver<ReconcileMessage>,
    sender: mpsc::UnboundedSender<ReconcileMessage>,
}

impl Receiver {
    pub async fn recv(&mut self) -> Option<Delivery> {
        let message = self.receiver.recv().await?;
        Some(Delivery {
            message,
            sender: self.sender.clone(),
        })
    }
}

impl InMemoryQueue {
    pub fn new() -> (Self, Receiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender: sender.clone(),
            },
            Receiver { receiver, sender },
        )
    }
}

#[async_trait]
impl WorkQueue for InMemoryQueue {
    async fn send(&self, message: ReconcileMessage) {
        if self.sender.send(message).is_err() {
            tracing::warn!("work queue closed, dropping message");
        }
    }
}
