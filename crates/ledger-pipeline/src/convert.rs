//! Converts `entitlements.credits` wire messages into the arithmetic
//! core's `GrantMap`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use ledger_types::{Entitlement, EntitlementBucket, ExpiresSpec, ExpiringCredit, GrantMap, UserId};

const DEFAULT_EXPIRING_LIFETIME_DAYS: i64 = 30;

fn unit_to_seconds(unit: &str) -> Option<f64> {
    match unit {
        "seconds" => Some(1.0),
        "minutes" => Some(60.0),
        "hours" => Some(3_600.0),
        "days" => Some(86_400.0),
        "weeks" => Some(604_800.0),
        _ => None,
    }
}

/// Sum an `amount` map (unit -> quantity) into whole milliseconds.
fn amount_to_millis(amount: &std::collections::HashMap<String, f64>) -> i64 {
    let seconds: f64 = amount
        .iter()
        .filter_map(|(unit, qty)| unit_to_seconds(unit).map(|factor| factor * qty))
        .sum();
    (seconds * 1000.0).trunc() as i64
}

fn created_at(entitlement: &Entitlement, now: DateTime<Utc>) -> DateTime<Utc> {
    entitlement
        .created
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or(now)
}

fn expires_at(entitlement: &Entitlement, created: DateTime<Utc>) -> DateTime<Utc> {
    match &entitlement.expires {
        Some(ExpiresSpec::Absolute(ms)) => Utc.timestamp_millis_opt(*ms).single().unwrap_or(created),
        Some(ExpiresSpec::Duration(map)) => {
            let seconds: f64 = map.iter().filter_map(|(unit, qty)| unit_to_seconds(unit).map(|f| f * qty)).sum();
            created + Duration::milliseconds((seconds * 1000.0).trunc() as i64)
        }
        None => created + Duration::days(DEFAULT_EXPIRING_LIFETIME_DAYS),
    }
}

/// Convert one entitlement into a single-field grant. Non-`credits` kinds
/// and unknown buckets contribute nothing.
#[must_use]
pub fn convert_entitlement(user_id: UserId, entitlement: &Entitlement, now: DateTime<Utc>) -> GrantMap {
    if !entitlement.is_credits() {
        return GrantMap::new();
    }

    let Some(bucket) = entitlement.bucket else {
        return GrantMap::new();
    };

    let millis = amount_to_millis(&entitlement.amount);

    match bucket {
        EntitlementBucket::Trial => GrantMap::new().with_trial(millis),
        EntitlementBucket::Permanent => GrantMap::new().with_permanent(millis),
        EntitlementBucket::Expiring => {
            let created = created_at(entitlement, now);
            let expires = expires_at(entitlement, created);
            GrantMap::new().with_expiring(vec![ExpiringCredit::new(
                user_id, millis, created, expires, entitlement.note.clone(),
            )])
        }
    }
}

/// Convert a list of entitlements into one combined grant, per the
/// pipeline's conversion contract.
#[must_use]
pub fn convert_entitlements(user_id: UserId, entitlements: &[Entitlement], now: DateTime<Utc>) -> GrantMap {
    entitlements
        .iter()
        .map(|e| convert_entitlement(user_id, e, now))
        .fold(GrantMap::new(), GrantMap::combine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn amount(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn trial_hours_converts_to_millis() {
        let user_id = UserId::new();
        let now = Utc::now();
        let e = Entitlement {
            kind: "credits".to_string(),
            bucket: Some(EntitlementBucket::Trial),
            amount: amount(&[("hours", 1.0)]),
            expires: None,
            created: None,
            note: None,
        };
        let g = convert_entitlement(user_id, &e, now);
        assert_eq!(g.trial, 3_600_000);
    }

    #[test]
    fn non_credits_kind_contributes_nothing() {
        let user_id = UserId::new();
        let now = Utc::now();
        let e = Entitlement {
            kind: "refund".to_string(),
            bucket: Some(EntitlementBucket::Trial),
            amount: amount(&[("hours", 1.0)]),
            expires: None,
            created: None,
            note: None,
        };
        assert!(convert_entitlement(user_id, &e, now).is_empty());
    }

    #[test]
    fn s6_entitlement_conversion() {
        let user_id = UserId::new();
        let t0 = Utc.timestamp_millis_opt(1_700_000_000_000).single().unwrap();

        let trial = Entitlement {
            kind: "credits".to_string(),
            bucket: Some(EntitlementBucket::Trial),
            amount: amount(&[("hours", 1.0)]),
            expires: None,
            created: Some(t0.timestamp_millis()),
            note: None,
        };
        let expiring = Entitlement {
            kind: "credits".to_string(),
            bucket: Some(EntitlementBucket::Expiring),
            amount: amount(&[("minutes", 30.0)]),
            expires: Some(ExpiresSpec::Duration(amount(&[("days", 7.0)]))),
            created: Some(t0.timestamp_millis()),
            note: None,
        };

        let grant = convert_entitlements(user_id, &[trial, expiring], t0);
        assert_eq!(grant.trial, 3_600_000);
        assert_eq!(grant.expiring.len(), 1);
        let tranche = &grant.expiring[0];
        assert_eq!(tranche.initial, 1_800_000);
        assert_eq!(tranche.amount, 1_800_000);
        assert_eq!(tranche.created_at, t0);
        assert_eq!(tranche.expires_at, t0 + Duration::days(7));
    }

    #[test]
    fn unknown_unit_in_amount_is_ignored() {
        let user_id = UserId::new();
        let now = Utc::now();
        let e = Entitlement {
            kind: "credits".to_string(),
            bucket: Some(EntitlementBucket::Permanent),
            amount: amount(&[("fortnights", 2.0), ("hours", 2.0)]),
            expires: None,
            created: None,
            note: None,
        };
        let g = convert_entitlement(user_id, &e, now);
        assert_eq!(g.permanent, 7_200_000);
    }
}
