//! Store abstractions the gateway writes through.

use async_trait::async_trait;
use ledger_types::{Result, UserCredits, UserId};

/// The authoritative relational store. A production implementation backs
/// this with Postgres via `sqlx`; tests use an in-memory fake satisfying
/// the same trait.
#[async_trait]
pub trait RelationalStore: Send + Sync {
    /// Read a user's credits, if a row exists.
    async fn fetch(&self, user_id: UserId) -> Result<Option<UserCredits>>;

    /// Upsert a user's credits. On a stale-version conflict the caller
    /// (the gateway) retries once as a fresh insert.
    async fn upsert(&self, credits: &UserCredits) -> Result<()>;

    /// Insert a row only if one does not already exist (do-nothing on
    /// conflict). Used when reconciling a legacy-store hit into the
    /// relational store for the first time.
    async fn insert_if_absent(&self, credits: &UserCredits) -> Result<()>;
}

/// The legacy document store, queried transitionally until all tenants
/// have been migrated. Tolerates three historical tranche layouts; see
/// `legacy::parse_legacy_credits`.
#[async_trait]
pub trait LegacyStore: Send + Sync {
    /// Read a user's credits from the legacy layout, if present.
    async fn fetch(&self, user_id: UserId) -> Result<Option<UserCredits>>;

    /// Best-effort mirror write. Callers must not fail the overall
    /// operation if this fails; they should log and move on.
    async fn mirror(&self, credits: &UserCredits) -> Result<()>;
}
