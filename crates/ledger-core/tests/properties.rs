//! Quantified properties from the credit arithmetic design: grant
//! monotonicity/clamp, debit conservation, bucket priority, merge/sort
//! invariants, and expiry idempotence.

use chrono::{Duration, Utc};
use ledger_core::{deduct, expire, grant, merge_expiring, sort_expiring};
use ledger_types::{ExpiringCredit, GrantMap, UserCredits, UserId};
use proptest::prelude::*;

fn small_state(trial: i64, permanent: i64, n_tranches: usize) -> UserCredits {
    let u = UserId::new();
    let now = Utc::now();
    let expiring = (0..n_tranches)
        .map(|i| ExpiringCredit::new(u, 100, now, now + Duration::days(i as i64 + 1), None))
        .collect();
    UserCredits {
        user_id: u,
        trial,
        permanent,
        expiring,
    }
}

fn sum_buckets(s: &UserCredits) -> i64 {
    s.total()
}

proptest! {
    // Property 1: grant monotonicity of non-negatives.
    #[test]
    fn grant_monotonicity(trial in 0i64..1_000_000, permanent in 0i64..1_000_000,
                           d_trial in 0i64..1_000_000, d_permanent in 0i64..1_000_000) {
        let state = small_state(trial, permanent, 0);
        let g = GrantMap::new().with_trial(d_trial).with_permanent(d_permanent);
        let out = grant(&state, &g);
        prop_assert!(out.trial >= state.trial);
        prop_assert!(out.permanent >= state.permanent);
    }

    // Property 2: grant clamp for signed deltas.
    #[test]
    fn grant_clamp(trial in 0i64..1_000_000, permanent in 0i64..1_000_000,
                    d_trial in -2_000_000i64..2_000_000, d_permanent in -2_000_000i64..2_000_000) {
        let state = small_state(trial, permanent, 0);
        let g = GrantMap::new().with_trial(d_trial).with_permanent(d_permanent);
        let out = grant(&state, &g);
        prop_assert!(out.trial >= 0);
        prop_assert!(out.permanent >= 0);
    }

    // Property 3: debit conservation.
    #[test]
    fn debit_conservation(trial in 0i64..100_000, permanent in 0i64..100_000,
                           n_tranches in 0usize..4, cost in 0i64..500_000) {
        let state = small_state(trial, permanent, n_tranches);
        let before = sum_buckets(&state);
        if let Some(out) = deduct(&state, cost) {
            let after = sum_buckets(&out.state);
            prop_assert_eq!(before, after + (cost - out.remainder));
            prop_assert!(out.remainder >= 0);
            prop_assert!(out.remainder <= cost);
        } else {
            prop_assert!(cost <= 0);
        }
    }

    // Property 4: priority order -- permanent untouched while trial has funds.
    #[test]
    fn priority_order(trial in 1i64..100_000, permanent in 0i64..100_000, cost in 1i64..100_000) {
        let state = small_state(trial, permanent, 0);
        if let Some(out) = deduct(&state, cost) {
            if cost <= trial {
                prop_assert_eq!(out.state.permanent, permanent);
            }
        }
    }

    // Property 5: merge equals sort of concatenation, and is a permutation.
    #[test]
    fn merge_matches_sort_of_concat(n_a in 0usize..4, n_b in 0usize..4) {
        let u = UserId::new();
        let now = Utc::now();
        let a: Vec<_> = (0..n_a)
            .map(|i| ExpiringCredit::new(u, 1, now, now + Duration::hours(i as i64), None))
            .collect();
        let b: Vec<_> = (0..n_b)
            .map(|i| ExpiringCredit::new(u, 1, now, now + Duration::hours(i as i64), None))
            .collect();

        let merged = merge_expiring(a.clone(), b.clone());
        let mut concat = a.clone();
        concat.extend(b.clone());
        let sorted = sort_expiring(concat);

        prop_assert_eq!(&merged, &sorted);
        prop_assert_eq!(merged.len(), a.len() + b.len());
    }

    // Property 6: expiry idempotence.
    #[test]
    fn expire_idempotent(n_tranches in 0usize..5, offset_days in -10i64..10) {
        let u = UserId::new();
        let now = Utc::now();
        let expiring: Vec<_> = (0..n_tranches)
            .map(|i| ExpiringCredit::new(u, 10, now, now + Duration::days(i as i64 + offset_days), None))
            .collect();
        let state = UserCredits { user_id: u, trial: 0, permanent: 0, expiring };

        let once = expire(&state, now, true);
        let twice = expire(&once, now, true);
        prop_assert_eq!(once, twice);
    }
}
