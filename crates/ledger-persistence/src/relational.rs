//! The authoritative relational store, backed by Postgres via `sqlx`.
//!
//! Schema: a `user_credits` table keyed by `user_id` with `trial`/
//! `permanent` columns, and a related `expiring_credits` table holding
//! the ordered tranche list. Timestamps are stored as `timestamptz`
//! (ISO-8601 UTC on the wire).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use ledger_types::{ExpiringCredit, LedgerError, Result, UserCredits, UserId};

use crate::store::RelationalStore;

/// Create the `user_credits` / `expiring_credits` tables if they don't
/// already exist. Not a migration framework — just enough to let the
/// gateway run against a fresh database in tests and examples.
///
/// # Errors
/// Returns an error if the DDL fails to apply.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS user_credits (
            user_id    UUID PRIMARY KEY,
            trial      BIGINT NOT NULL DEFAULT 0,
            permanent  BIGINT NOT NULL DEFAULT 0
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| LedgerError::RelationalUnavailable {
        reason: e.to_string(),
    })?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS expiring_credits (
            user_id    UUID NOT NULL REFERENCES user_credits(user_id),
            initial    BIGINT NOT NULL,
            amount     BIGINT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            expires_at TIMESTAMPTZ NOT NULL,
            note       TEXT
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| LedgerError::RelationalUnavailable {
        reason: e.to_string(),
    })?;

    sqlx::query(
        r"CREATE TABLE IF NOT EXISTS legacy_user_credits (
            user_id UUID PRIMARY KEY,
            doc JSONB NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| LedgerError::RelationalUnavailable {
        reason: e.to_string(),
    })?;

    Ok(())
}

/// `sqlx`-backed implementation of `RelationalStore`.
pub struct PgRelationalStore {
    pool: PgPool,
}

impl PgRelationalStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_expiring(&self, user_id: UserId) -> Result<Vec<ExpiringCredit>> {
        let rows = sqlx::query(
            "SELECT initial, amount, created_at, expires_at, note
             FROM expiring_credits WHERE user_id = $1 ORDER BY expires_at ASC",
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::RelationalUnavailable {
            reason: e.to_string(),
        })?;

        Ok(rows
            .into_iter()
            .map(|row| ExpiringCredit {
                user_id,
                initial: row.get("initial"),
                amount: row.get("amount"),
                created_at: row.get::<DateTime<Utc>, _>("created_at"),
                expires_at: row.get::<DateTime<Utc>, _>("expires_at"),
                note: row.get("note"),
            })
            .collect())
    }

    async fn replace_expiring(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: UserId,
        expiring: &[ExpiringCredit],
    ) -> Result<()> {
        sqlx::query("DELETE FROM expiring_credits WHERE user_id = $1")
            .bind(user_id.0)
            .execute(&mut **tx)
            .await
            .map_err(|e| LedgerError::PersistenceWriteFailed {
                reason: e.to_string(),
            })?;

        for tranche in expiring {
            sqlx::query(
                "INSERT INTO expiring_credits (user_id, initial, amount, created_at, expires_at, note)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(user_id.0)
            .bind(tranche.initial)
            .bind(tranche.amount)
            .bind(tranche.created_at)
            .bind(tranche.expires_at)
            .bind(&tranche.note)
            .execute(&mut **tx)
            .await
            .map_err(|e| LedgerError::PersistenceWriteFailed {
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }
}

#[async_trait]
impl RelationalStore for PgRelationalStore {
    async fn fetch(&self, user_id: UserId) -> Result<Option<UserCredits>> {
        let row: Option<(i64, i64)> = sqlx::query_as(
            "SELECT trial, permanent FROM user_credits WHERE user_id = $1",
        )
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::RelationalUnavailable {
            reason: e.to_string(),
        })?;

        let Some((trial, permanent)) = row else {
            return Ok(None);
        };

        let expiring = self.fetch_expiring(user_id).await?;
        Ok(Some(UserCredits {
            user_id,
            trial,
            permanent,
            expiring,
        }))
    }

    async fn upsert(&self, credits: &UserCredits) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| LedgerError::RelationalUnavailable {
                reason: e.to_string(),
            })?;

        let upsert_result = sqlx::query(
            "INSERT INTO user_credits (user_id, trial, permanent) VALUES ($1, $2, $3)
             ON CONFLICT (user_id) DO UPDATE SET trial = EXCLUDED.trial, permanent = EXCLUDED.permanent",
        )
        .bind(credits.user_id.0)
        .bind(credits.trial)
        .bind(credits.permanent)
        .execute(&mut *tx)
        .await;

        let mut tx = match upsert_result {
            Ok(_) => tx,
            Err(e) => {
                // Postgres aborts the whole transaction on a failed statement,
                // so the retry must run on a fresh one, not the poisoned `tx`.
                tx.rollback().await.map_err(|e| LedgerError::PersistenceWriteFailed {
                    reason: e.to_string(),
                })?;
                let mut fresh = self.pool.begin().await.map_err(|e| LedgerError::RelationalUnavailable {
                    reason: e.to_string(),
                })?;
                sqlx::query("INSERT INTO user_credits (user_id, trial, permanent) VALUES ($1, $2, $3)")
                    .bind(credits.user_id.0)
                    .bind(credits.trial)
                    .bind(credits.permanent)
                    .execute(&mut *fresh)
                    .await
                    .map_err(|_| LedgerError::PersistenceWriteFailed {
                        reason: e.to_string(),
                    })?;
                fresh
            }
        };

        self.replace_expiring(&mut tx, credits.user_id, &credits.expiring)
            .await?;

        tx.commit().await.map_err(|e| LedgerError::PersistenceWriteFailed {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    async fn insert_if_absent(&self, credits: &UserCredits) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| LedgerError::RelationalUnavailable {
                reason: e.to_string(),
            })?;

        let inserted: Option<(Uuid,)> = sqlx::query_as(
            "INSERT INTO user_credits (user_id, trial, permanent) VALUES ($1, $2, $3)
             ON CONFLICT (user_id) DO NOTHING
             RETURNING user_id",
        )
        .bind(credits.user_id.0)
        .bind(credits.trial)
        .bind(credits.permanent)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| LedgerError::PersistenceWriteFailed {
            reason: e.to_string(),
        })?;

        if inserted.is_some() {
            self.replace_expiring(&mut tx, credits.user_id, &credits.expiring)
                .await?;
        }

        tx.commit().await.map_err(|e| LedgerError::PersistenceWriteFailed {
            reason: e.to_string(),
        })?;

        Ok(())
    }
}
