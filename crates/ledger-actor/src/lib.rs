//! # ledger-actor
//!
//! The Per-User Actor and the Cluster Actor Registry.
//!
//! Built without a language-level actor runtime: a sharded
//! `DashMap<UserId, mpsc::Sender<ActorRequest>>` where each live entry is
//! drained by one dedicated `tokio::task`, selecting over its mailbox, its
//! expiration timer, and an idle-shutdown timeout. The registry layers a
//! consistent-hash ring and a pluggable membership collaborator on top so
//! a `user_id` routes to exactly one actor cluster-wide.

mod local;
mod membership;
mod registry;
mod request;
mod ring;
mod worker;

pub use local::LocalSupervisor;
pub use membership::{InMemoryMembership, MembershipSource, StaticMembership};
pub use registry::ClusterRegistry;
pub use request::ActorRequest;
pub use ring::ConsistentHashRing;
