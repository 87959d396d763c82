//! The message bus abstraction the pipeline pulls from.
//!
//! Only an in-memory test double ships here; the production NATS/Kafka/SQS
//! client is an external collaborator (§1) pluggable behind this trait.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::sync::Mutex;

/// One message pulled from the bus: a topic, an opaque JSON body, and a
/// handle the processor uses to ack or nack it.
pub struct Envelope {
    pub topic: String,
    pub body: Vec<u8>,
    pub ack: AckHandle,
}

/// Per-message ack/nack handle.
pub struct AckHandle {
    acked: Arc<AtomicBool>,
    nacked: Arc<AtomicBool>,
}

impl AckHandle {
    fn new() -> (Self, Arc<AtomicBool>, Arc<AtomicBool>) {
        let acked = Arc::new(AtomicBool::new(false));
        let nacked = Arc::new(AtomicBool::new(false));
        (
            Self {
                acked: acked.clone(),
                nacked: nacked.clone(),
            },
            acked,
            nacked,
        )
    }

    /// Acknowledge the message: it will not be redelivered.
    pub fn ack(self) {
        self.acked.store(true, Ordering::SeqCst);
    }

    /// Nack the message: the bus should redeliver it.
    pub fn nack(self) {
        self.nacked.store(true, Ordering::SeqCst);
    }
}

/// A pull-based message bus with at-least-once delivery.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Pull the next message, or `None` if the bus has been closed.
    async fn next(&self) -> Option<Envelope>;
}

/// An in-memory bus backed by a channel, standing in for the production
/// client in tests.
pub struct InMemoryBus {
    tx: mpsc::Sender<Envelope>,
    rx: Mutex<mpsc::Receiver<Envelope>>,
}

impl InMemoryBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self { tx, rx: Mutex::new(rx) }
    }

    /// Publish a message onto the bus, returning handles a test can poll
    /// to observe whether the processor acked or nacked it.
    ///
    /// # Panics
    /// Panics if the bus's receiver has already been dropped.
    pub async fn publish(&self, topic: impl Into<String>, body: Vec<u8>) -> (Arc<AtomicBool>, Arc<AtomicBool>) {
        let (ack, acked, nacked) = AckHandle::new();
        let envelope = Envelope {
            topic: topic.into(),
            body,
            ack,
        };
        self.tx.send(envelope).await.expect("in-memory bus receiver dropped");
        (acked, nacked)
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn next(&self) -> Option<Envelope> {
        self.rx.lock().await.recv().await
    }
}
