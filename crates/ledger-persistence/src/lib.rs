//! Persistence layer for the service-credit ledger: a relational store of
//! record, a transitional legacy document store, and the gateway that
//! write-throughs between them.

mod gateway;
mod legacy;
mod mirror;
mod relational;
mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use gateway::PersistenceGateway;
pub use legacy::{parse_legacy_credits, parse_legacy_tranche, parse_legacy_timestamp, PgLegacyStore};
pub use mirror::MirrorQueue;
pub use relational::{ensure_schema, PgRelationalStore};
pub use store::{LegacyStore, RelationalStore};
