//! Local supervisor: owns every actor whose home is this node.
//!
//! A sharded mailbox directory (`DashMap<UserId, Sender<ActorRequest>>`)
//! where each live entry is drained by one dedicated `tokio::task`. Gone
//! workers (idled out, or whose mailbox send failed) are lazily respawned
//! on the next request — there is no live state handover, the worker
//! re-hydrates from the Persistence Gateway.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use ledger_core::Clock;
use ledger_persistence::PersistenceGateway;
use ledger_types::{GrantMap, JobCompleteMessage, LedgerConfig, LedgerError, Result, UserCredits, UserId};
use tokio::sync::{mpsc, oneshot};

use crate::request::ActorRequest;
use crate::worker;

/// Owns the locally-hosted actors and routes requests to their mailboxes,
/// spawning a worker task on first reference.
pub struct LocalSupervisor {
    mailboxes: DashMap<UserId, mpsc::Sender<ActorRequest>>,
    gateway: Arc<PersistenceGateway>,
    clock: Arc<dyn Clock>,
    config: Arc<LedgerConfig>,
    mailbox_capacity: usize,
}

impl LocalSupervisor {
    #[must_use]
    pub fn new(gateway: Arc<PersistenceGateway>, clock: Arc<dyn Clock>, config: Arc<LedgerConfig>) -> Self {
        Self {
            mailboxes: DashMap::new(),
            gateway,
            clock,
            config,
            mailbox_capacity: 64,
        }
    }

    /// Read a user's current balance.
    ///
    /// # Errors
    /// Returns `LedgerError::RoutingTimeout` if the actor does not reply
    /// within the configured routing timeout.
    pub async fn get_credits(&self, user_id: UserId) -> Result<UserCredits> {
        let (tx, rx) = oneshot::channel();
        self.dispatch(user_id, ActorRequest::GetCredits { reply: tx }).await?;
        self.await_reply(user_id, rx).await
    }

    /// Apply a grant to a user's balance.
    ///
    /// # Errors
    /// Propagates the actor's persistence error, or a routing timeout.
    pub async fn grant(&self, user_id: UserId, grant: GrantMap) -> Result<UserCredits> {
        let (tx, rx) = oneshot::channel();
        self.dispatch(user_id, ActorRequest::Grant { grant, reply: tx }).await?;
        self.await_reply(user_id, rx).await?
    }

    /// Apply a completed job's debit to a user's balance.
    ///
    /// # Errors
    /// Propagates the actor's persistence error, a job/user mismatch, or a
    /// routing timeout.
    pub async fn complete_job(&self, job: JobCompleteMessage) -> Result<()> {
        let user_id = job.user_id;
        let (tx, rx) = oneshot::channel();
        self.dispatch(user_id, ActorRequest::CompleteJob { job, reply: tx }).await?;
        self.await_reply(user_id, rx).await?
    }

    /// Deliver a name-conflict signal to the local actor, if one exists.
    /// The actor terminates without writing; a missing mailbox is a no-op.
    pub fn signal_conflict(&self, user_id: UserId) {
        if let Some(entry) = self.mailboxes.get(&user_id) {
            let _ = entry.try_send(ActorRequest::Conflict);
        }
    }

    async fn await_reply<T>(&self, user_id: UserId, rx: oneshot::Receiver<T>) -> Result<T> {
        let timeout = Duration::from_millis(self.config.cluster.routing_timeout_ms);
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) | Err(_) => Err(LedgerError::RoutingTimeout(user_id)),
        }
    }

    async fn dispatch(&self, user_id: UserId, req: ActorRequest) -> Result<()> {
        let sender = self.handle_for(user_id);
        let timeout = Duration::from_millis(self.config.cluster.routing_timeout_ms);
        match tokio::time::timeout(timeout, sender.send(req)).await {
            Ok(Ok(())) => Ok(()),
            _ => Err(LedgerError::RoutingTimeout(user_id)),
        }
    }

    fn handle_for(&self, user_id: UserId) -> mpsc::Sender<ActorRequest> {
        match self.mailboxes.entry(user_id) {
            dashmap::mapref::entry::Entry::Occupied(mut entry) => {
                if entry.get().is_closed() {
                    let tx = self.spawn_worker(user_id);
                    entry.insert(tx.clone());
                    tx
                } else {
                    entry.get().clone()
                }
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                let tx = self.spawn_worker(user_id);
                entry.insert(tx.clone());
                tx
            }
        }
    }

    /// Spawn a fresh worker task and return its mailbox sender. Does not
    /// touch `self.mailboxes` — callers hold the shard guard via `entry`
    /// so the spawn-then-insert stays atomic with the lookup.
    fn spawn_worker(&self, user_id: UserId) -> mpsc::Sender<ActorRequest> {
        let (tx, rx) = mpsc::channel(self.mailbox_capacity);
        tokio::spawn(worker::run(
            user_id,
            rx,
            self.gateway.clone(),
            self.clock.clone(),
            self.config.clone(),
        ));
        tx
    }
}
