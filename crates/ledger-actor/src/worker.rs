//! The per-user actor worker loop.
//!
//! One `tokio::task` per live user, driven by `tokio::select!` over its
//! mailbox, its expiration timer, and an idle-shutdown timeout. The worker
//! owns the cached `UserCredits` exclusively; every mutation persists
//! through the gateway before the in-memory cache changes or a reply is
//! sent.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration as ChronoDuration;
use ledger_core::{deduct, expire, grant, Clock};
use ledger_persistence::PersistenceGateway;
use ledger_types::{LedgerConfig, LedgerError, UserId};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::request::ActorRequest;

/// A far-future sentinel duration used when there is no pending
/// expiration to wait on, so the `select!` arm can always be polled.
const NO_TIMER: StdDuration = StdDuration::from_secs(365 * 24 * 3600);

/// Backoff before retrying a failed expiry write-through.
const EXPIRY_RETRY_BACKOFF_SECS: i64 = 5;

/// Run one user's actor until it idles out or its mailbox closes.
///
/// `gateway.fetch` reconciles and lazily creates the record on first
/// reference, per the Persistence Gateway contract.
pub async fn run(
    user_id: UserId,
    mut rx: mpsc::Receiver<ActorRequest>,
    gateway: Arc<PersistenceGateway>,
    clock: Arc<dyn Clock>,
    config: Arc<LedgerConfig>,
) {
    let mut state = match gateway.fetch(user_id).await {
        Ok(state) => state,
        Err(err) => {
            warn!(%user_id, %err, "failed to load state for new actor, aborting spawn");
            return;
        }
    };

    let idle_timeout = StdDuration::from_millis(config.idle_timeout_ms);
    let mut idle_deadline = Instant::now() + idle_timeout;
    let mut next_expiration = state.expiring.first().map(|t| t.expires_at);

    debug!(%user_id, "actor started");

    loop {
        let expiry_wait = next_expiration
            .map(|exp| (exp - clock.now()).to_std().unwrap_or(StdDuration::ZERO))
            .unwrap_or(NO_TIMER);
        let idle_wait = idle_deadline.saturating_duration_since(Instant::now());

        tokio::select! {
            biased;

            maybe_req = rx.recv() => {
                match maybe_req {
                    Some(ActorRequest::Conflict) => {
                        warn!(%user_id, "actor lost name-conflict resolution, terminating without writing");
                        return;
                    }
                    Some(req) => {
                        handle_request(user_id, req, &mut state, &gateway, &config).await;
                        idle_deadline = Instant::now() + idle_timeout;
                        next_expiration = state.expiring.first().map(|t| t.expires_at);
                    }
                    None => {
                        debug!(%user_id, "mailbox closed, actor terminating");
                        return;
                    }
                }
            }

            () = tokio::time::sleep(expiry_wait) => {
                let expired = expire(&state, clock.now(), false);
                if expired.expiring.len() != state.expiring.len() {
                    match gateway.update(&expired).await {
                        Ok(_) => {
                            state = expired;
                            next_expiration = state.expiring.first().map(|t| t.expires_at);
                        }
                        Err(err) => {
                            warn!(%user_id, %err, "expiry write-through failed, retrying shortly");
                            next_expiration = Some(clock.now() + ChronoDuration::seconds(EXPIRY_RETRY_BACKOFF_SECS));
                        }
                    }
                } else {
                    next_expiration = None;
                }
            }

            () = tokio::time::sleep(idle_wait) => {
                debug!(%user_id, "actor idle, terminating");
                return;
            }
        }
    }
}

async fn handle_request(
    user_id: UserId,
    req: ActorRequest,
    state: &mut ledger_types::UserCredits,
    gateway: &PersistenceGateway,
    config: &LedgerConfig,
) {
    match req {
        ActorRequest::Conflict => unreachable!("handled in the select loop"),

        ActorRequest::GetCredits { reply } => {
            let _ = reply.send(state.clone());
        }

        ActorRequest::Grant { grant: grant_map, reply } => {
            let proposed = grant(state, &grant_map);
            match gateway.update(&proposed).await {
                Ok(persisted) => {
                    *state = persisted.clone();
                    let _ = reply.send(Ok(persisted));
                }
                Err(err) => {
                    let _ = reply.send(Err(err));
                }
            }
        }

        ActorRequest::CompleteJob { job, reply } => {
            if job.user_id != user_id {
                let _ = reply.send(Err(LedgerError::JobUserMismatch {
                    expected: user_id,
                    actual: job.user_id,
                }));
                return;
            }

            if !job.charges_credits() {
                let _ = reply.send(Ok(()));
                return;
            }

            let cap = config.cap_for(&job.job_type);
            let requested = job.raw_cost();
            let capped = requested.min(cap);
            if requested > capped {
                warn!(%user_id, job_type = %job.job_type, requested, capped, "job cost capped");
            }

            let Some(outcome) = deduct(state, capped) else {
                let _ = reply.send(Ok(()));
                return;
            };

            if outcome.remainder > 0 {
                warn!(%user_id, remainder = outcome.remainder, "insufficient credits, charged partial amount");
            }

            match gateway.update(&outcome.state).await {
                Ok(persisted) => {
                    *state = persisted;
                    let _ = reply.send(Ok(()));
                }
                Err(err) => {
                    let _ = reply.send(Err(err));
                }
            }
        }
    }
}
