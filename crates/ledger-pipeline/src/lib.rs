//! # ledger-pipeline
//!
//! The Event Pipeline: a bus abstraction, entitlement conversion, the
//! optional idempotency hook, and the processor that ties them to the
//! Cluster Actor Registry.

mod bus;
mod convert;
mod idempotency;
mod processor;

pub use bus::{AckHandle, Envelope, InMemoryBus, MessageBus};
pub use convert::{convert_entitlement, convert_entitlements};
pub use idempotency::{ChangeLog, InMemoryChangeLog};
pub use processor::Processor;
