//! The Cluster Actor Registry: routes a `user_id` to exactly one actor,
//! wherever it runs, via a consistent-hash ring over current membership.
//!
//! Cross-node RPC dispatch is deployment glue and out of scope (§1); this
//! registry only resolves placement and dispatches locally. A request
//! whose home node is not this one fails as a routing timeout, which the
//! pipeline treats as transient and nacks for redelivery — once a real RPC
//! collaborator is wired into `ledger-node`, that call site is the only
//! thing that needs to change.

use std::sync::{Arc, RwLock};

use ledger_types::{GrantMap, JobCompleteMessage, LedgerError, NodeId, Result, UserCredits, UserId};

use crate::local::LocalSupervisor;
use crate::membership::MembershipSource;
use crate::ring::ConsistentHashRing;

/// Cluster-wide directory mapping `user_id` to the node that owns its
/// actor, backed by a consistent-hash ring over current membership.
pub struct ClusterRegistry {
    local_node: NodeId,
    local: Arc<LocalSupervisor>,
    membership: Arc<dyn MembershipSource>,
    ring: RwLock<ConsistentHashRing>,
}

impl ClusterRegistry {
    #[must_use]
    pub fn new(local_node: NodeId, local: Arc<LocalSupervisor>, membership: Arc<dyn MembershipSource>) -> Self {
        let mut ring = ConsistentHashRing::new();
        ring.set_members(&membership.current_nodes());
        Self {
            local_node,
            local,
            membership,
            ring: RwLock::new(ring),
        }
    }

    /// Re-read membership and rebuild the ring. Placements may move;
    /// during the transition duplicate actors can transiently exist,
    /// resolved by `resolve_conflict`.
    pub fn refresh(&self) {
        let members = self.membership.current_nodes();
        self.ring.write().unwrap().set_members(&members);
    }

    /// The node currently owning `user_id`'s actor, per the ring.
    #[must_use]
    pub fn home_node(&self, user_id: UserId) -> Option<NodeId> {
        self.ring.read().unwrap().home_node(user_id)
    }

    /// Whether this node currently owns `user_id`'s actor.
    #[must_use]
    pub fn is_local(&self, user_id: UserId) -> bool {
        self.home_node(user_id) == Some(self.local_node)
    }

    /// Read a user's current balance, creating the actor on first
    /// reference if it is locally owned.
    ///
    /// # Errors
    /// `LedgerError::RoutingTimeout` if the user's home node is not this
    /// one, or the local actor does not reply in time.
    pub async fn get_credits(&self, user_id: UserId) -> Result<UserCredits> {
        self.ensure_local(user_id)?;
        self.local.get_credits(user_id).await
    }

    /// Apply a grant to a user's balance.
    ///
    /// # Errors
    /// See [`Self::get_credits`]; also propagates the actor's persistence
    /// error.
    pub async fn grant(&self, user_id: UserId, grant: GrantMap) -> Result<UserCredits> {
        self.ensure_local(user_id)?;
        self.local.grant(user_id, grant).await
    }

    /// Apply a completed job's debit.
    ///
    /// # Errors
    /// See [`Self::get_credits`]; also propagates a job/user mismatch or
    /// the actor's persistence error.
    pub async fn complete_job(&self, job: JobCompleteMessage) -> Result<()> {
        self.ensure_local(job.user_id)?;
        self.local.complete_job(job).await
    }

    /// Resolve a transient duplicate-actor situation between two nodes,
    /// picking the deterministic winner (lowest `NodeId`) and signaling
    /// `conflict` to the loser if it is this node.
    pub fn resolve_conflict(&self, user_id: UserId, a: NodeId, b: NodeId) -> NodeId {
        let winner = a.min(b);
        let loser = if winner == a { b } else { a };
        if loser == self.local_node {
            self.local.signal_conflict(user_id);
        }
        winner
    }

    fn ensure_local(&self, user_id: UserId) -> Result<()> {
        if self.is_local(user_id) {
            Ok(())
        } else {
            Err(LedgerError::RoutingTimeout(user_id))
        }
    }
}
