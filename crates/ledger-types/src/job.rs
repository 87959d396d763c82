//! The `jobs.complete` inbound message shape.

use serde::{Deserialize, Serialize};

use crate::{JobId, UserId};

/// A completed job, as decoded from the `jobs.complete` topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCompleteMessage {
    pub id: JobId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub job_type: String,
    #[serde(default)]
    pub charge_credits: Option<bool>,
    #[serde(default)]
    pub cost: Option<i64>,
}

impl JobCompleteMessage {
    /// Whether this job should actually debit credits. Absent defaults to
    /// `true` — the spec only special-cases an explicit `false`.
    #[must_use]
    pub fn charges_credits(&self) -> bool {
        self.charge_credits.unwrap_or(true)
    }

    /// The raw requested cost, defaulting to zero when absent.
    #[must_use]
    pub fn raw_cost(&self) -> i64 {
        self.cost.unwrap_or(0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_minimal_job() {
        let json = r#"{"id":"j1","user_id":"018f0000-0000-7000-8000-000000000000","type":"transcode"}"#;
        let msg: JobCompleteMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.job_type, "transcode");
        assert!(msg.charges_credits());
        assert_eq!(msg.raw_cost(), 0);
    }

    #[test]
    fn charge_credits_false_is_respected() {
        let json = r#"{"id":"j1","user_id":"018f0000-0000-7000-8000-000000000000","type":"t","charge_credits":false,"cost":500}"#;
        let msg: JobCompleteMessage = serde_json::from_str(json).unwrap();
        assert!(!msg.charges_credits());
    }
}
