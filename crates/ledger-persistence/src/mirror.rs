//! Asynchronous, bounded-retry mirror queue for the legacy store.
//!
//! Resolves the "mirror on best-effort" open question towards
//! asynchronous-with-bounded-retry: a mirror write never blocks the
//! actor's write-through path. A failed mirror write is retried with
//! capped exponential backoff up to `max_retries`, then dropped and
//! logged. This preserves actor latency at the cost of a window where
//! relational and legacy disagree, acceptable because relational is
//! authoritative.

use std::sync::Arc;
use std::time::Duration;

use ledger_types::UserCredits;
use tokio::sync::mpsc;

use crate::store::LegacyStore;

/// Handle to the background mirror-write task.
pub struct MirrorQueue {
    tx: mpsc::Sender<UserCredits>,
}

impl MirrorQueue {
    /// Spawn the background drain task and return a handle to enqueue
    /// mirror writes onto it.
    #[must_use]
    pub fn spawn(legacy: Arc<dyn LegacyStore>, capacity: usize, max_retries: u32) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        tokio::spawn(Self::drain(rx, legacy, max_retries));
        Self { tx }
    }

    /// Enqueue a best-effort mirror write. If the queue is full the write
    /// is dropped and logged rather than applying backpressure to the
    /// caller — mirror writes must never slow down the actor.
    pub fn enqueue(&self, credits: UserCredits) {
        if let Err(err) = self.tx.try_send(credits) {
            tracing::warn!(error = %err, "legacy mirror queue full, dropping mirror write");
        }
    }

    async fn drain(mut rx: mpsc::Receiver<UserCredits>, legacy: Arc<dyn LegacyStore>, max_retries: u32) {
        while let Some(credits) = rx.recv().await {
            let user_id = credits.user_id;
            let mut attempt = 0u32;
            loop {
                match legacy.mirror(&credits).await {
                    Ok(()) => break,
                    Err(err) => {
                        attempt += 1;
                        if attempt > max_retries {
                            tracing::warn!(%user_id, %err, attempt, "legacy mirror write dropped after retries");
                            break;
                        }
                        let backoff = Duration::from_millis(50 * 2u64.pow(attempt));
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }
    }
}
