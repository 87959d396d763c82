//! Pure credit arithmetic: grant, deduct, expire, sort, merge.
//!
//! No I/O, no unconditional clock reads — `expire` takes `now` explicitly.
//! Every function here is infallible: illegal inputs (a negative delta, a
//! stray negative-amount tranche) are clamped or dropped, never rejected.

use chrono::{DateTime, Utc};
use ledger_types::{ExpiringCredit, GrantMap, UserCredits};

/// Stable sort of an expiring list, ascending by `expires_at`.
#[must_use]
pub fn sort_expiring(mut list: Vec<ExpiringCredit>) -> Vec<ExpiringCredit> {
    list.sort_by(|a, b| a.expires_at.cmp(&b.expires_at));
    list
}

/// Stably merge two already-sorted expiring lists into one sorted list.
/// On a tie in `expires_at`, entries from `existing` sort before entries
/// from `incoming`.
#[must_use]
pub fn merge_expiring(existing: Vec<ExpiringCredit>, incoming: Vec<ExpiringCredit>) -> Vec<ExpiringCredit> {
    let mut merged = existing;
    merged.extend(incoming);
    sort_expiring(merged)
}

/// Apply a grant to a state, producing the new state.
///
/// `trial`/`permanent` deltas are clamped so the result never goes
/// negative; new `expiring` tranches are merged into the sorted list.
/// An empty grant returns the state unchanged (cloned).
#[must_use]
pub fn grant(state: &UserCredits, grant: &GrantMap) -> UserCredits {
    if grant.is_empty() {
        return state.clone();
    }

    UserCredits {
        user_id: state.user_id,
        trial: (state.trial + grant.trial).max(0),
        permanent: (state.permanent + grant.permanent).max(0),
        expiring: merge_expiring(state.expiring.clone(), grant.expiring.clone()),
    }
}

/// The outcome of a debit: the new state and whatever portion of the cost
/// could not be covered by any bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeductOutcome {
    pub state: UserCredits,
    pub remainder: i64,
}

/// Charge `cost` milliseconds against a state in bucket order
/// `trial -> expiring -> permanent`.
///
/// Returns `None` if `cost <= 0` — callers must treat that as "do not
/// write", not as a zero-remainder success.
#[must_use]
pub fn deduct(state: &UserCredits, cost: i64) -> Option<DeductOutcome> {
    if cost <= 0 {
        return None;
    }

    let mut remaining = cost;

    let trial_take = remaining.min(state.trial.max(0));
    let trial = state.trial - trial_take;
    remaining -= trial_take;

    let mut expiring = Vec::with_capacity(state.expiring.len());
    for tranche in sort_expiring(state.expiring.clone()) {
        if tranche.amount < 0 {
            // Negative-amount tranches are dropped defensively and never used.
            continue;
        }
        if remaining <= 0 {
            expiring.push(tranche);
            continue;
        }
        let take = remaining.min(tranche.amount);
        let left = tranche.amount - take;
        remaining -= take;
        if left > 0 {
            expiring.push(ExpiringCredit { amount: left, ..tranche });
        }
        // left == 0: tranche fully drained, dropped.
    }

    let permanent_take = remaining.min(state.permanent.max(0));
    let permanent = state.permanent - permanent_take;
    remaining -= permanent_take;

    Some(DeductOutcome {
        state: UserCredits {
            user_id: state.user_id,
            trial,
            permanent,
            expiring,
        },
        remainder: remaining,
    })
}

/// Drop the leading prefix of expired tranches.
///
/// Uses strict `<=` so a tranche whose expiry equals `now` is considered
/// expired (resolves the boundary Open Question: equal-to-now is expired,
/// not surviving). If `sort` is true the list is sorted first; otherwise
/// the caller is asserting it is already sorted.
#[must_use]
pub fn expire(state: &UserCredits, now: DateTime<Utc>, sort: bool) -> UserCredits {
    let list = if sort {
        sort_expiring(state.expiring.clone())
    } else {
        state.expiring.clone()
    };

    let first_live = list.iter().position(|t| t.expires_at > now).unwrap_or(list.len());
    let expiring = list[first_live..].to_vec();

    UserCredits {
        user_id: state.user_id,
        trial: state.trial,
        permanent: state.permanent,
        expiring,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use ledger_types::UserId;

    fn user() -> UserId {
        UserId::new()
    }

    fn tranche(u: UserId, amount: i64, expires_at: DateTime<Utc>) -> ExpiringCredit {
        ExpiringCredit {
            user_id: u,
            initial: amount,
            amount,
            created_at: expires_at - Duration::days(1),
            expires_at,
            note: None,
        }
    }

    // --- grant -----------------------------------------------------------

    #[test]
    fn empty_grant_is_a_no_op() {
        let u = user();
        let state = UserCredits {
            user_id: u,
            trial: 5,
            permanent: 7,
            expiring: Vec::new(),
        };
        let out = grant(&state, &GrantMap::new());
        assert_eq!(out, state);
    }

    #[test]
    fn grant_clamps_negative_delta_to_zero() {
        let u = user();
        let state = UserCredits {
            user_id: u,
            trial: 5,
            permanent: 0,
            expiring: Vec::new(),
        };
        let out = grant(&state, &GrantMap::new().with_trial(-100));
        assert_eq!(out.trial, 0);
    }

    #[test]
    fn grant_merges_expiring_sorted_s2() {
        let u = user();
        let now = Utc::now();
        let day1 = now + Duration::days(1);
        let day2 = now + Duration::days(2);
        let day3 = now + Duration::days(3);

        let state = UserCredits {
            user_id: u,
            trial: 0,
            permanent: 0,
            expiring: Vec::new(),
        };
        let g1 = GrantMap::new().with_expiring(vec![tranche(u, 1000, day3), tranche(u, 1000, day1)]);
        let state = grant(&state, &g1);

        let g2 = GrantMap::new().with_expiring(vec![tranche(u, 1000, day2)]);
        let state = grant(&state, &g2);

        let expiries: Vec<_> = state.expiring.iter().map(|t| t.expires_at).collect();
        assert_eq!(expiries, vec![day1, day2, day3]);
    }

    // --- deduct ------------------------------------------------------------

    #[test]
    fn deduct_nonpositive_cost_is_none() {
        let state = UserCredits::zero(user());
        assert!(deduct(&state, 0).is_none());
        assert!(deduct(&state, -5).is_none());
    }

    #[test]
    fn deduct_priority_drain_s1() {
        let u = user();
        let now = Utc::now();
        let state = UserCredits {
            user_id: u,
            trial: 500,
            permanent: 1000,
            expiring: vec![tranche(u, 300, now + Duration::minutes(10))],
        };
        let out = deduct(&state, 900).unwrap();
        assert_eq!(out.state.trial, 0);
        assert_eq!(out.state.permanent, 900);
        assert!(out.state.expiring.is_empty());
        assert_eq!(out.remainder, 0);
    }

    #[test]
    fn deduct_never_touches_permanent_while_trial_has_funds() {
        let u = user();
        let state = UserCredits {
            user_id: u,
            trial: 1000,
            permanent: 500,
            expiring: Vec::new(),
        };
        let out = deduct(&state, 200).unwrap();
        assert_eq!(out.state.permanent, 500);
        assert_eq!(out.state.trial, 800);
    }

    #[test]
    fn deduct_reports_remainder_when_insufficient() {
        let state = UserCredits {
            user_id: user(),
            trial: 10,
            permanent: 10,
            expiring: Vec::new(),
        };
        let out = deduct(&state, 100).unwrap();
        assert_eq!(out.state.trial, 0);
        assert_eq!(out.state.permanent, 0);
        assert_eq!(out.remainder, 80);
    }

    #[test]
    fn deduct_drops_negative_amount_tranches_defensively() {
        let u = user();
        let now = Utc::now();
        let mut bad = tranche(u, 100, now + Duration::days(1));
        bad.amount = -50;
        let state = UserCredits {
            user_id: u,
            trial: 0,
            permanent: 100,
            expiring: vec![bad],
        };
        let out = deduct(&state, 50).unwrap();
        assert!(out.state.expiring.is_empty());
        assert_eq!(out.state.permanent, 50);
    }

    // --- expire ------------------------------------------------------------

    #[test]
    fn expire_drops_stale_tranches_s3() {
        let u = user();
        let now = Utc::now();
        let state = UserCredits {
            user_id: u,
            trial: 0,
            permanent: 0,
            expiring: vec![
                tranche(u, 10, now - Duration::days(5)),
                tranche(u, 20, now + Duration::days(30)),
            ],
        };
        let out = expire(&state, now, true);
        assert_eq!(out.expiring.len(), 1);
        assert_eq!(out.expiring[0].expires_at, now + Duration::days(30));
    }

    #[test]
    fn expire_uses_inclusive_boundary() {
        let u = user();
        let now = Utc::now();
        let state = UserCredits {
            user_id: u,
            trial: 0,
            permanent: 0,
            expiring: vec![tranche(u, 10, now)],
        };
        let out = expire(&state, now, true);
        assert!(out.expiring.is_empty(), "tranche expiring exactly at now must be dropped");
    }

    #[test]
    fn expire_is_idempotent() {
        let u = user();
        let now = Utc::now();
        let state = UserCredits {
            user_id: u,
            trial: 5,
            permanent: 5,
            expiring: vec![
                tranche(u, 10, now - Duration::days(1)),
                tranche(u, 20, now + Duration::days(1)),
            ],
        };
        let once = expire(&state, now, true);
        let twice = expire(&once, now, true);
        assert_eq!(once, twice);
    }

    // --- merge / sort --------------------------------------------------------

    #[test]
    fn merge_equals_sort_of_concatenation() {
        let u = user();
        let now = Utc::now();
        let a = vec![tranche(u, 1, now + Duration::days(1)), tranche(u, 2, now + Duration::days(3))];
        let b = vec![tranche(u, 3, now + Duration::days(2))];

        let merged = merge_expiring(a.clone(), b.clone());
        let mut concat = a;
        concat.extend(b);
        let sorted = sort_expiring(concat);

        assert_eq!(merged, sorted);
    }

    #[test]
    fn merge_is_a_permutation() {
        let u = user();
        let now = Utc::now();
        let a = vec![tranche(u, 1, now + Duration::days(1))];
        let b = vec![tranche(u, 2, now + Duration::days(2))];
        let merged = merge_expiring(a.clone(), b.clone());
        assert_eq!(merged.len(), a.len() + b.len());
        assert!(merged.iter().any(|t| t.amount == 1));
        assert!(merged.iter().any(|t| t.amount == 2));
    }
}
