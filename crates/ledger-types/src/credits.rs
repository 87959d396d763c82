//! The credit balance record and its constituent tranches.
//!
//! All quantities are non-negative integers in milliseconds. `UserCredits`
//! is the authoritative shape persisted by the gateway and cached by the
//! per-user actor; this module only defines the shape, not the arithmetic
//! (that lives in `ledger-core`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// One tranche of time-limited credits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiringCredit {
    /// Back-reference to the owning account.
    pub user_id: UserId,
    /// The amount granted at creation. Immutable.
    pub initial: i64,
    /// Remaining amount. `0 <= amount <= initial`.
    pub amount: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Opaque annotation carried through from the entitlement, if any.
    pub note: Option<String>,
}

impl ExpiringCredit {
    #[must_use]
    pub fn new(
        user_id: UserId,
        initial: i64,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        note: Option<String>,
    ) -> Self {
        let initial = initial.max(0);
        Self {
            user_id,
            initial,
            amount: initial,
            created_at,
            expires_at,
            note,
        }
    }

    /// Whether this tranche is due for removal: exhausted or expired.
    #[must_use]
    pub fn is_spent(&self, now: DateTime<Utc>) -> bool {
        self.amount <= 0 || self.expires_at <= now
    }
}

/// The balance record for one user.
///
/// Invariants: `trial >= 0`, `permanent >= 0`; every tranche's `amount >= 0`;
/// `expiring` is sorted strictly ascending by `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCredits {
    pub user_id: UserId,
    pub trial: i64,
    pub permanent: i64,
    pub expiring: Vec<ExpiringCredit>,
}

impl UserCredits {
    /// A zero-balance record for a user who has never been granted or
    /// charged anything.
    #[must_use]
    pub fn zero(user_id: UserId) -> Self {
        Self {
            user_id,
            trial: 0,
            permanent: 0,
            expiring: Vec::new(),
        }
    }

    /// Sum of all buckets, including every remaining tranche.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.trial + self.permanent + self.expiring.iter().map(|t| t.amount).sum::<i64>()
    }

    /// Whether the expiring list is sorted ascending by `expires_at`, as
    /// required by the data-model invariant. Used by tests and assertions,
    /// not on the hot path.
    #[must_use]
    pub fn expiring_is_sorted(&self) -> bool {
        self.expiring.windows(2).all(|w| w[0].expires_at <= w[1].expires_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> UserId {
        UserId::new()
    }

    #[test]
    fn zero_balance_has_zero_total() {
        let uc = UserCredits::zero(user());
        assert_eq!(uc.total(), 0);
    }

    #[test]
    fn total_sums_all_buckets() {
        let u = user();
        let now = Utc::now();
        let mut uc = UserCredits::zero(u);
        uc.trial = 100;
        uc.permanent = 200;
        uc.expiring.push(ExpiringCredit::new(
            u,
            50,
            now,
            now + Duration::days(1),
            None,
        ));
        assert_eq!(uc.total(), 350);
    }

    #[test]
    fn expiring_credit_is_spent_when_exhausted() {
        let u = user();
        let now = Utc::now();
        let mut tranche = ExpiringCredit::new(u, 10, now, now + Duration::days(1), None);
        tranche.amount = 0;
        assert!(tranche.is_spent(now));
    }

    #[test]
    fn expiring_credit_is_spent_at_exact_expiry() {
        let u = user();
        let now = Utc::now();
        let tranche = ExpiringCredit::new(u, 10, now, now, None);
        assert!(tranche.is_spent(now));
    }

    #[test]
    fn expiring_credit_not_spent_before_expiry() {
        let u = user();
        let now = Utc::now();
        let tranche = ExpiringCredit::new(u, 10, now, now + Duration::seconds(1), None);
        assert!(!tranche.is_spent(now));
    }
}
