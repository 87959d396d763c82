//! Configuration types for the ledger node.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Top-level node configuration, loaded from a TOML file at startup with
/// environment-variable overrides layered on top for secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Millisecond cost cap per job type. Types not listed use
    /// `constants::DEFAULT_JOB_CAP_MS`.
    pub caps: HashMap<String, i64>,
    pub pipeline: PipelineConfig,
    pub idle_timeout_ms: u64,
    pub cluster: ClusterConfig,
    pub relational: StoreConfig,
    pub document: StoreConfig,
    pub bus: BusConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            caps: HashMap::new(),
            pipeline: PipelineConfig::default(),
            idle_timeout_ms: constants::DEFAULT_IDLE_TIMEOUT_MS,
            cluster: ClusterConfig::default(),
            relational: StoreConfig::relational_default(),
            document: StoreConfig::document_default(),
            bus: BusConfig::default(),
        }
    }
}

impl LedgerConfig {
    /// The millisecond cap for a given job type, falling back to the
    /// system default when the type is unrecognized.
    #[must_use]
    pub fn cap_for(&self, job_type: &str) -> i64 {
        self.caps
            .get(job_type)
            .copied()
            .unwrap_or(constants::DEFAULT_JOB_CAP_MS)
    }
}

/// Event Pipeline concurrency configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub producer_concurrency: usize,
    pub processor_concurrency: usize,
    pub processor_max_demand: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            producer_concurrency: constants::DEFAULT_PRODUCER_CONCURRENCY,
            processor_concurrency: constants::DEFAULT_PROCESSOR_CONCURRENCY,
            processor_max_demand: constants::DEFAULT_PROCESSOR_CONCURRENCY * 2,
        }
    }
}

/// Cluster Actor Registry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Opaque string passed to the membership/discovery collaborator.
    pub membership_selector: String,
    /// Per-request routing timeout in milliseconds.
    pub routing_timeout_ms: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            membership_selector: String::new(),
            routing_timeout_ms: 5_000,
        }
    }
}

/// Connection configuration shared by the relational and document stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub url: String,
    pub pool_size: u32,
}

impl StoreConfig {
    #[must_use]
    pub fn relational_default() -> Self {
        Self {
            url: String::new(),
            pool_size: constants::DEFAULT_RELATIONAL_POOL_SIZE,
        }
    }

    #[must_use]
    pub fn document_default() -> Self {
        Self {
            url: String::new(),
            pool_size: constants::DEFAULT_DOCUMENT_POOL_SIZE,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::relational_default()
    }
}

/// A single bus subscription: a subject and an optional queue group for
/// load-balanced delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub subject: String,
    pub queue_group: Option<String>,
}

/// Message bus configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub subscriptions: Vec<Subscription>,
}
