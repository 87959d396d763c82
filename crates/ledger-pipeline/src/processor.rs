//! The processor: decodes one envelope, dispatches it to the cluster
//! registry, and translates the result into an ack or a nack.

use std::sync::Arc;

use chrono::Utc;
use ledger_actor::ClusterRegistry;
use ledger_types::{EntitlementsMessage, ErrorCategory, JobCompleteMessage, LedgerError, SourceEventId, UserId};
use tracing::warn;

use crate::bus::{AckHandle, Envelope};
use crate::convert::convert_entitlements;
use crate::idempotency::ChangeLog;

/// One processor in the pool. Stateless beyond its collaborators, so the
/// pool can run many of these concurrently over a shared bus.
pub struct Processor {
    registry: Arc<ClusterRegistry>,
    change_log: Option<Arc<dyn ChangeLog>>,
}

impl Processor {
    #[must_use]
    pub fn new(registry: Arc<ClusterRegistry>) -> Self {
        Self {
            registry,
            change_log: None,
        }
    }

    /// Attach the idempotency hook. Only `jobs.complete` messages carry a
    /// natural dedup key (`JobId`); `entitlements.credits` has none in the
    /// wire shape, so it always reaches the actor.
    #[must_use]
    pub fn with_change_log(mut self, change_log: Arc<dyn ChangeLog>) -> Self {
        self.change_log = Some(change_log);
        self
    }

    /// Decode, dispatch, and ack/nack one envelope. Never panics on bad
    /// input — a malformed body is a poison message, logged and acked.
    pub async fn process(&self, envelope: Envelope) {
        let Envelope { topic, body, ack } = envelope;
        match topic.as_str() {
            "jobs.complete" => self.process_job(&body, ack).await,
            "entitlements.credits" => self.process_entitlements(&body, ack).await,
            other => {
                warn!(topic = other, "ignoring message on unrecognized topic");
                ack.ack();
            }
        }
    }

    async fn process_job(&self, body: &[u8], ack: AckHandle) {
        let job: JobCompleteMessage = match serde_json::from_slice(body) {
            Ok(job) => job,
            Err(err) => {
                warn!(%err, "malformed jobs.complete body, acking as poison message");
                ack.ack();
                return;
            }
        };

        if let Some(log) = &self.change_log {
            let key = SourceEventId::from(job.id.0.clone());
            match log.record_if_new(&key, job.user_id).await {
                Ok(true) => {}
                Ok(false) => {
                    ack.ack();
                    return;
                }
                Err(err) => warn!(%err, "change log unavailable, processing without idempotency guard"),
            }
        }

        let user_id = job.user_id;
        match self.registry.complete_job(job).await {
            Ok(()) => ack.ack(),
            Err(err) => Self::finish(&err, user_id, ack),
        }
    }

    async fn process_entitlements(&self, body: &[u8], ack: AckHandle) {
        let message: EntitlementsMessage = match serde_json::from_slice(body) {
            Ok(message) => message,
            Err(err) => {
                warn!(%err, "malformed entitlements.credits body, acking as poison message");
                ack.ack();
                return;
            }
        };

        let grant = convert_entitlements(message.user_id, &message.entitlements, Utc::now());
        match self.registry.grant(message.user_id, grant).await {
            Ok(_) => ack.ack(),
            Err(err) => Self::finish(&err, message.user_id, ack),
        }
    }

    fn finish(err: &LedgerError, user_id: UserId, ack: AckHandle) {
        match err.category() {
            ErrorCategory::Transient => {
                warn!(%user_id, %err, "transient failure, nacking for redelivery");
                ack.nack();
            }
            ErrorCategory::TerminalMessage | ErrorCategory::TerminalActor => {
                warn!(%user_id, %err, "terminal failure, acking without retry");
                ack.ack();
            }
        }
    }
}
