//! Legacy document-store adapter.
//!
//! The legacy store predates the relational schema and carries three
//! historical tranche layouts, distinguished by field presence:
//!
//! - `{initial, left, created, expires}`
//! - `{initial, amount, created, expires}`
//! - `{amount, left, expires}` (no `created`)
//!
//! Timestamps in this store may be ISO-8601 strings, integer seconds, or
//! integer milliseconds since the epoch; a magnitude heuristic picks
//! seconds vs milliseconds (`>= 1e11` is milliseconds).
//!
//! Kept behind the `legacy-store` feature: once all tenants have migrated,
//! this module and its mirror-write call site can be deleted outright.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use sqlx::PgPool;

use ledger_types::{ExpiringCredit, LedgerError, Result, UserCredits, UserId};

use crate::store::LegacyStore;

const MS_MAGNITUDE_THRESHOLD: i64 = 100_000_000_000; // 1e11

/// Interpret a legacy timestamp value, whichever of the three
/// representations it happens to be stored as.
#[must_use]
pub fn parse_legacy_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => {
            let raw = n.as_i64()?;
            if raw.abs() >= MS_MAGNITUDE_THRESHOLD {
                Utc.timestamp_millis_opt(raw).single()
            } else {
                Utc.timestamp_opt(raw, 0).single()
            }
        }
        _ => None,
    }
}

/// Parse one legacy tranche object into the canonical `ExpiringCredit`,
/// discriminating on which field set is present.
#[must_use]
pub fn parse_legacy_tranche(user_id: UserId, obj: &Value) -> Option<ExpiringCredit> {
    let obj = obj.as_object()?;
    let get_i64 = |key: &str| obj.get(key).and_then(Value::as_i64);
    let expires_at = obj.get("expires").and_then(parse_legacy_timestamp)?;

    if let (Some(initial), Some(left), Some(created)) =
        (get_i64("initial"), get_i64("left"), obj.get("created").and_then(parse_legacy_timestamp))
    {
        return Some(ExpiringCredit {
            user_id,
            initial: initial.max(0),
            amount: left.max(0),
            created_at: created,
            expires_at,
            note: None,
        });
    }

    if let (Some(initial), Some(amount), Some(created)) = (
        get_i64("initial"),
        get_i64("amount"),
        obj.get("created").and_then(parse_legacy_timestamp),
    ) {
        return Some(ExpiringCredit {
            user_id,
            initial: initial.max(0),
            amount: amount.max(0),
            created_at: created,
            expires_at,
            note: None,
        });
    }

    if let (Some(amount), Some(left)) = (get_i64("amount"), get_i64("left")) {
        // No `created` in this layout; fall back to the expiry itself so
        // the `created_at <= expires_at` invariant still holds.
        return Some(ExpiringCredit {
            user_id,
            initial: amount.max(0),
            amount: left.max(0),
            created_at: expires_at,
            expires_at,
            note: None,
        });
    }

    None
}

/// Parse a full legacy document (`{trial, permanent, expiring: [...]}`)
/// into canonical `UserCredits`.
#[must_use]
pub fn parse_legacy_credits(user_id: UserId, doc: &Value) -> Option<UserCredits> {
    let obj = doc.as_object()?;
    let trial = obj.get("trial").and_then(Value::as_i64).unwrap_or(0).max(0);
    let permanent = obj.get("permanent").and_then(Value::as_i64).unwrap_or(0).max(0);
    let expiring = obj
        .get("expiring")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(|v| parse_legacy_tranche(user_id, v)).collect())
        .unwrap_or_default();

    Some(UserCredits {
        user_id,
        trial,
        permanent,
        expiring,
    })
}

/// A JSONB-backed stand-in for the legacy document store. The spec only
/// requires *a* document store tolerating heterogeneous tranche layouts,
/// not a specific product, so this talks to a single JSONB column rather
/// than a dedicated document database.
pub struct PgLegacyStore {
    pool: PgPool,
}

impl PgLegacyStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LegacyStore for PgLegacyStore {
    async fn fetch(&self, user_id: UserId) -> Result<Option<UserCredits>> {
        let row: Option<(Value,)> = sqlx::query_as(
            "SELECT doc FROM legacy_user_credits WHERE user_id = $1",
        )
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::RelationalUnavailable {
            reason: e.to_string(),
        })?;

        Ok(row.and_then(|(doc,)| parse_legacy_credits(user_id, &doc)))
    }

    async fn mirror(&self, credits: &UserCredits) -> Result<()> {
        let doc = serde_json::json!({
            "trial": credits.trial,
            "permanent": credits.permanent,
            "expiring": credits.expiring.iter().map(|t| serde_json::json!({
                "initial": t.initial,
                "amount": t.amount,
                "created": t.created_at.to_rfc3339(),
                "expires": t.expires_at.to_rfc3339(),
            })).collect::<Vec<_>>(),
        });

        sqlx::query(
            "INSERT INTO legacy_user_credits (user_id, doc) VALUES ($1, $2)
             ON CONFLICT (user_id) DO UPDATE SET doc = EXCLUDED.doc",
        )
        .bind(credits.user_id.0)
        .bind(doc)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::PersistenceWriteFailed {
            reason: e.to_string(),
        })?;

        Ok(())
    }
}
