//! Live node store with atomic per-node commits.

use super::node::{NodeId, NodeSnapshot, NodeSpec};
use crate::error::{RouteError, RouteResult};
use std::sync::Mutex;
use tracing::debug;

struct Node {
    addr: String,
    capacity: f64,
    // Cumulative assigned-but-not-yet-completed work. One lock per node:
    // commits on different nodes never contend, commits on the same node
    // are totally ordered.
    load: Mutex<f64>,
}

/// Owns the full set of compute nodes and their live load figures.
///
/// `snapshot` is side-effect free; `commit` is linearizable with respect
/// to concurrent commits on the same node. Strategies never call
/// `commit`; only the dispatch coordinator does, after a choice lands.
pub struct NodeRegistry {
    nodes: Vec<Node>,
}

impl NodeRegistry {
    /// Builds a registry from static node specs.
    ///
    /// Rejects non-positive or non-finite capacities up front so that no
    /// strategy can ever divide by a zero capacity.
    pub fn new(specs: Vec<NodeSpec>) -> Result<Self, String> {
        if specs.is_empty() {
            return Err("registry requires at least one node".into());
        }
        let mut nodes = Vec::with_capacity(specs.len());
        for (i, spec) in specs.into_iter().enumerate() {
            if !spec.capacity.is_finite() || spec.capacity <= 0.0 {
                return Err(format!(
                    "node {} ({}) has invalid capacity {}",
                    i, spec.addr, spec.capacity
                ));
            }
            nodes.push(Node {
                addr: spec.addr,
                capacity: spec.capacity,
                load: Mutex::new(0.0),
            });
        }
        Ok(Self { nodes })
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Transport address of a node.
    pub fn addr(&self, id: NodeId) -> RouteResult<&str> {
        self.nodes
            .get(id.0)
            .map(|n| n.addr.as_str())
            .ok_or(RouteError::UnknownNode(id))
    }

    /// Immutable copy of every node's `(capacity, load)` for strategy
    /// simulation.
    ///
    /// Each node's load is read under its own lock, so a snapshot never
    /// observes a half-applied commit; across nodes the view is
    /// eventually consistent, which is all display and selection need.
    pub fn snapshot(&self) -> Vec<NodeSnapshot> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| NodeSnapshot {
                id: NodeId(i),
                capacity: node.capacity,
                load: *node.load.lock().unwrap_or_else(|p| p.into_inner()),
            })
            .collect()
    }

    /// Atomically adds `delta` to a node's load, flooring at zero.
    ///
    /// Returns the load after the commit. Deltas commute: any
    /// interleaving of concurrent commits sums to the same final load.
    pub fn commit(&self, id: NodeId, delta: f64) -> RouteResult<f64> {
        let node = self.nodes.get(id.0).ok_or(RouteError::UnknownNode(id))?;
        let mut load = node.load.lock().unwrap_or_else(|p| p.into_inner());
        *load = (*load + delta).max(0.0);
        debug!(node = %id, delta, load = *load, "commit");
        Ok(*load)
    }

    /// Corrects a tentative commit once the realized load is known:
    /// equivalent to reverting the estimate and applying the actual.
    pub fn reconcile(&self, id: NodeId, estimated: f64, actual: f64) -> RouteResult<f64> {
        self.commit(id, actual - estimated)
    }
}
