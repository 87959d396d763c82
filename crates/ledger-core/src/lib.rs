//! # ledger-core
//!
//! **Pure deterministic credit arithmetic for the service-credit ledger.**
//!
//! This is the compute plane -- it takes a cached `UserCredits` and a grant
//! or cost, and produces a new `UserCredits`. It has:
//!
//! - **Zero side effects**: no DB writes, no bus I/O, no persistence
//! - **No unconditional clock reads**: `expire` takes `now` as a parameter
//! - **Saturating arithmetic**: buckets never go negative
//! - **Fixed bucket priority**: `trial -> expiring -> permanent` on debit

pub mod arithmetic;
pub mod clock;

pub use arithmetic::{deduct, expire, grant, merge_expiring, sort_expiring, DeductOutcome};
pub use clock::{Clock, FixedClock, SystemClock};

