//! The `entitlements.credits` inbound message shape.
//!
//! Conversion of these into a [`crate::GrantMap`] is business logic that
//! belongs to the Event Pipeline (`ledger-pipeline`); this module only
//! defines the wire shape.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::UserId;

/// Which bucket an entitlement targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementBucket {
    Trial,
    Permanent,
    Expiring,
}

/// `expires` may be an absolute millisecond timestamp, a duration map
/// (added to `created`), or absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpiresSpec {
    Absolute(i64),
    Duration(HashMap<String, f64>),
}

/// One entitlement in an `entitlements.credits` message.
///
/// `kind` is checked structurally rather than as an enum: any value other
/// than `"credits"` is parsed successfully but converts to nothing,
/// matching the spec's "non-`credits` kinds ... contribute nothing" rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entitlement {
    pub kind: String,
    pub bucket: Option<EntitlementBucket>,
    #[serde(default)]
    pub amount: HashMap<String, f64>,
    #[serde(default)]
    pub expires: Option<ExpiresSpec>,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
}

impl Entitlement {
    #[must_use]
    pub fn is_credits(&self) -> bool {
        self.kind == "credits"
    }
}

/// The `entitlements.credits` message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitlementsMessage {
    pub user_id: UserId,
    pub entitlements: Vec<Entitlement>,
}
