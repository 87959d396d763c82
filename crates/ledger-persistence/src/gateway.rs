//! The Persistence Gateway: write-through over the relational store, with
//! transitional reconciliation from the legacy document store.

use std::sync::Arc;

use ledger_types::{Result, UserCredits, UserId};
use tracing::warn;

use crate::mirror::MirrorQueue;
use crate::store::{LegacyStore, RelationalStore};

/// Write-through adapter over a relational store (authoritative) and,
/// transitionally, a legacy document store.
pub struct PersistenceGateway {
    relational: Arc<dyn RelationalStore>,
    legacy: Option<Arc<dyn LegacyStore>>,
    mirror: Option<MirrorQueue>,
}

impl PersistenceGateway {
    /// A gateway with only the relational store — the legacy reconciliation
    /// path is a no-op and no mirror writes are attempted.
    #[must_use]
    pub fn relational_only(relational: Arc<dyn RelationalStore>) -> Self {
        Self {
            relational,
            legacy: None,
            mirror: None,
        }
    }

    /// A gateway that also reconciles from, and mirrors to, a legacy
    /// document store.
    #[must_use]
    pub fn with_legacy(
        relational: Arc<dyn RelationalStore>,
        legacy: Arc<dyn LegacyStore>,
        mirror_queue_capacity: usize,
        mirror_max_retries: u32,
    ) -> Self {
        let mirror = MirrorQueue::spawn(legacy.clone(), mirror_queue_capacity, mirror_max_retries);
        Self {
            relational,
            legacy: Some(legacy),
            mirror: Some(mirror),
        }
    }

    /// Read a user's credits.
    ///
    /// Relational first; on miss, fall back to the legacy store and
    /// reconcile it into relational with a do-nothing-on-conflict write.
    /// If both miss, a zero-balance record is returned without inserting
    /// anything — the row is only created on the first real mutation.
    ///
    /// # Errors
    /// Propagates a relational-store read failure. Legacy-store failures
    /// during reconciliation are not fatal; the relational miss still
    /// falls through to a zero-balance record.
    pub async fn fetch(&self, user_id: UserId) -> Result<UserCredits> {
        if let Some(found) = self.relational.fetch(user_id).await? {
            return Ok(found);
        }

        if let Some(legacy) = &self.legacy {
            match legacy.fetch(user_id).await {
                Ok(Some(reconstructed)) => {
                    if let Err(err) = self.relational.insert_if_absent(&reconstructed).await {
                        warn!(%user_id, %err, "failed to reconcile legacy record into relational store");
                    }
                    return Ok(reconstructed);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(%user_id, %err, "legacy store read failed during reconciliation");
                }
            }
        }

        Ok(UserCredits::zero(user_id))
    }

    /// Apply a write-through update.
    ///
    /// Upserts to relational (retrying once as an insert on a
    /// stale-version conflict, handled inside the relational store impl);
    /// mirrors to the legacy store on a best-effort, asynchronous basis.
    ///
    /// # Errors
    /// Propagates a relational-store write failure. A mirror-write
    /// failure is never surfaced here — see `MirrorQueue`.
    pub async fn update(&self, changes: &UserCredits) -> Result<UserCredits> {
        self.relational.upsert(changes).await?;

        if let Some(mirror) = &self.mirror {
            mirror.enqueue(changes.clone());
        }

        Ok(changes.clone())
    }
}
