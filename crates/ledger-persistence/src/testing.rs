//! In-memory test doubles for `RelationalStore` and `LegacyStore`, so the
//! gateway's write-through logic can be exercised without a live Postgres.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use ledger_types::{Result, UserCredits, UserId};

use crate::store::{LegacyStore, RelationalStore};

/// An in-memory stand-in for the relational store.
#[derive(Default)]
pub struct InMemoryRelationalStore {
    rows: Mutex<HashMap<UserId, UserCredits>>,
}

impl InMemoryRelationalStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RelationalStore for InMemoryRelationalStore {
    async fn fetch(&self, user_id: UserId) -> Result<Option<UserCredits>> {
        Ok(self.rows.lock().unwrap().get(&user_id).cloned())
    }

    async fn upsert(&self, credits: &UserCredits) -> Result<()> {
        self.rows.lock().unwrap().insert(credits.user_id, credits.clone());
        Ok(())
    }

    async fn insert_if_absent(&self, credits: &UserCredits) -> Result<()> {
        self.rows
            .lock()
            .unwrap()
            .entry(credits.user_id)
            .or_insert_with(|| credits.clone());
        Ok(())
    }
}

/// An in-memory stand-in for the legacy document store.
#[derive(Default)]
pub struct InMemoryLegacyStore {
    docs: Mutex<HashMap<UserId, UserCredits>>,
}

impl InMemoryLegacyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a legacy record directly, as if it had always lived there.
    pub fn seed(&self, user_id: UserId, credits: UserCredits) {
        self.docs.lock().unwrap().insert(user_id, credits);
    }
}

#[async_trait]
impl LegacyStore for InMemoryLegacyStore {
    async fn fetch(&self, user_id: UserId) -> Result<Option<UserCredits>> {
        Ok(self.docs.lock().unwrap().get(&user_id).cloned())
    }

    async fn mirror(&self, credits: &UserCredits) -> Result<()> {
        self.docs.lock().unwrap().insert(credits.user_id, credits.clone());
        Ok(())
    }
}
