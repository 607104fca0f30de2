//! Round-robin baseline.
//!
//! Cycles an atomic counter over the eligible node list. No cost or
//! fitness evaluation; used as the control strategy when comparing the
//! search-based families.

use super::{eligible, scoring_size, Selection, SelectionStrategy};
use crate::registry::NodeSnapshot;
use crate::stats;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Stateless-cost cyclic selector. Lock-free and safe for concurrent
/// callers; the counter wraps by modulo over the eligible node count.
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self {
            counter: AtomicUsize::new(0),
        }
    }
}

impl Default for RoundRobin {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionStrategy for RoundRobin {
    fn name(&self) -> &'static str {
        "rr"
    }

    fn select(&self, nodes: &[NodeSnapshot], task_size: f64) -> Option<Selection> {
        let nodes = eligible(nodes);
        if nodes.is_empty() {
            return None;
        }
        let idx = self.counter.fetch_add(1, Ordering::Relaxed) % nodes.len();
        let chosen = &nodes[idx];
        Some(Selection {
            node: chosen.id,
            score: stats::node_cost(chosen, scoring_size(task_size)),
            evaluations: 1,
        })
    }
}
