//! # ledger-types
//!
//! Shared types, errors, and configuration for the **service-credit ledger**.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`UserId`], [`NodeId`], [`SourceEventId`], [`JobId`]
//! - **Balance model**: [`UserCredits`], [`ExpiringCredit`], [`GrantMap`]
//! - **Inbound message shapes**: [`JobCompleteMessage`], [`Entitlement`], [`EntitlementsMessage`]
//! - **Configuration**: [`LedgerConfig`], [`PipelineConfig`], [`ClusterConfig`], [`StoreConfig`], [`BusConfig`]
//! - **Errors**: [`LedgerError`] with `LEDGER_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod config;
pub mod constants;
pub mod credits;
pub mod entitlement;
pub mod error;
pub mod grant;
pub mod ids;
pub mod job;

// Re-export all primary types at crate root for ergonomic imports:
//   use ledger_types::{UserCredits, GrantMap, LedgerError, ...};

pub use config::*;
pub use credits::*;
pub use entitlement::*;
pub use error::*;
pub use grant::*;
pub use ids::*;
pub use job::*;

// Constants are accessed via `ledger_types::constants::FOO`
// (not re-exported to avoid name collisions).
