//! System-wide limits and defaults.

/// Default millisecond cap applied to a job of an unrecognized type.
pub const DEFAULT_JOB_CAP_MS: i64 = 300_000;

/// Default idle timeout before a per-user actor releases itself.
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 3_600_000;

/// Default connection pool size for the authoritative relational store.
pub const DEFAULT_RELATIONAL_POOL_SIZE: u32 = 10;

/// Default connection pool size for the legacy document store.
pub const DEFAULT_DOCUMENT_POOL_SIZE: u32 = 50;

/// Default number of producer tasks pulling from the bus.
pub const DEFAULT_PRODUCER_CONCURRENCY: usize = 1;

/// Default number of processor tasks draining the producer.
pub const DEFAULT_PROCESSOR_CONCURRENCY: usize = 10;

/// Default entitlement expiry when none is supplied: 30 days.
pub const DEFAULT_ENTITLEMENT_EXPIRY_MS: i64 = 30 * 24 * 60 * 60 * 1000;

/// Bound on the asynchronous legacy-store mirror retry queue.
pub const DEFAULT_MIRROR_RETRY_QUEUE_SIZE: usize = 1_024;

/// Maximum mirror-write retry attempts before the mirror attempt is dropped.
pub const DEFAULT_MIRROR_MAX_RETRIES: u32 = 3;
