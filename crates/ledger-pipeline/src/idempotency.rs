//! The idempotency hook: an optional change-log collaborator recording
//! `(source_event_id, user_id)` before the actor mutates state.
//!
//! Supported, not required — the recommended way to reach effectively-once
//! on top of an at-least-once bus.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use ledger_types::{Result, SourceEventId, UserId};

/// Records processed `(source_event_id, user_id)` pairs and answers
/// whether a given pair has already been seen.
#[async_trait]
pub trait ChangeLog: Send + Sync {
    /// Returns `true` and records the key if this is the first time it has
    /// been seen; returns `false` without side effects if it is a repeat.
    async fn record_if_new(&self, source_event_id: &SourceEventId, user_id: UserId) -> Result<bool>;
}

/// An in-memory change log, standing in for a durable one in tests.
#[derive(Default)]
pub struct InMemoryChangeLog {
    seen: Mutex<HashSet<(SourceEventId, UserId)>>,
}

impl InMemoryChangeLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChangeLog for InMemoryChangeLog {
    async fn record_if_new(&self, source_event_id: &SourceEventId, user_id: UserId) -> Result<bool> {
        Ok(self.seen.lock().unwrap().insert((source_event_id.clone(), user_id)))
    }
}
