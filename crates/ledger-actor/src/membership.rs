//! The membership collaborator seam.
//!
//! Node membership is normally supplied by an external service-discovery
//! collaborator (orchestrator pod metadata, a watch endpoint). Only a
//! static implementation and an in-memory test double ship here — the
//! production watch client is deployment glue, out of scope — but the
//! trait is a real part of the deliverable so `ledger-node` can wire one
//! in without touching this crate.

use std::sync::{Arc, RwLock};

use ledger_types::NodeId;

/// Supplies the current cluster membership to the `ClusterRegistry`.
pub trait MembershipSource: Send + Sync {
    /// The node ids currently believed to be alive.
    fn current_nodes(&self) -> Vec<NodeId>;
}

/// A membership source with a fixed, unchanging set of nodes.
pub struct StaticMembership {
    nodes: Vec<NodeId>,
}

impl StaticMembership {
    #[must_use]
    pub fn new(nodes: Vec<NodeId>) -> Self {
        Self { nodes }
    }

    /// A single-node membership, for running standalone.
    #[must_use]
    pub fn single(node: NodeId) -> Self {
        Self::new(vec![node])
    }
}

impl MembershipSource for StaticMembership {
    fn current_nodes(&self) -> Vec<NodeId> {
        self.nodes.clone()
    }
}

/// A membership source whose set can be mutated at runtime, standing in
/// for a real watch-based discovery client in tests.
#[derive(Default)]
pub struct InMemoryMembership {
    nodes: Arc<RwLock<Vec<NodeId>>>,
}

impl InMemoryMembership {
    #[must_use]
    pub fn new(nodes: Vec<NodeId>) -> Self {
        Self {
            nodes: Arc::new(RwLock::new(nodes)),
        }
    }

    /// Simulate a node join event.
    pub fn join(&self, node: NodeId) {
        self.nodes.write().unwrap().push(node);
    }

    /// Simulate a node leave event.
    pub fn leave(&self, node: NodeId) {
        self.nodes.write().unwrap().retain(|n| *n != node);
    }
}

impl MembershipSource for InMemoryMembership {
    fn current_nodes(&self) -> Vec<NodeId> {
        self.nodes.read().unwrap().clone()
    }
}
