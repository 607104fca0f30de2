//! Node identity and the immutable per-request view.

use serde::Serialize;
use std::fmt;

/// Opaque, process-stable identifier of a registered node.
///
/// Assigned by registration order and never reused; nodes are not
/// removed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Index of this node in registration order.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// Static description of a node, supplied at startup.
#[derive(Debug, Clone)]
pub struct NodeSpec {
    /// Transport address of the node (opaque to the decision engine).
    pub addr: String,

    /// Processing capacity in throughput units. Must be positive.
    pub capacity: f64,
}

impl NodeSpec {
    pub fn new(addr: impl Into<String>, capacity: f64) -> Self {
        Self {
            addr: addr.into(),
            capacity,
        }
    }
}

/// Immutable copy of one node's state, taken at snapshot time.
///
/// This is the only view strategies ever see; simulating against it
/// cannot disturb the live registry.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub capacity: f64,
    pub load: f64,
}

impl NodeSnapshot {
    /// Load-to-capacity ratio, the per-node utilization figure shared by
    /// the swarm and pollination strategies and the rebalancer.
    pub fn utilization(&self) -> f64 {
        self.load / self.capacity
    }
}
