//! Cost model and aggregate imbalance statistics.
//!
//! Pure functions shared by every selection strategy and the rebalancer,
//! so no strategy re-derives its own scoring arithmetic.

use crate::registry::NodeSnapshot;

/// Normalized ratio above which a cluster counts as imbalanced.
pub const DEFAULT_IMBALANCE_THRESHOLD: f64 = 0.1;

/// Projected completion time of placing `size` units of work on a node
/// that already carries `load`, normalized by capacity. Lower is better.
pub fn cost(load: f64, capacity: f64, size: f64) -> f64 {
    (load + size) / capacity
}

/// Projected cost of assigning a task to a snapshot node.
pub fn node_cost(node: &NodeSnapshot, size: f64) -> f64 {
    cost(node.load, node.capacity, size)
}

/// Mean of the nodes' loads (not costs).
pub fn mean_load(nodes: &[NodeSnapshot]) -> f64 {
    if nodes.is_empty() {
        return 0.0;
    }
    nodes.iter().map(|n| n.load).sum::<f64>() / nodes.len() as f64
}

/// Population standard deviation of the nodes' loads.
pub fn std_dev_load(nodes: &[NodeSnapshot]) -> f64 {
    if nodes.is_empty() {
        return 0.0;
    }
    let mean = mean_load(nodes);
    let variance = nodes
        .iter()
        .map(|n| (n.load - mean).powi(2))
        .sum::<f64>()
        / nodes.len() as f64;
    variance.sqrt()
}

/// Scale-free dispersion of load across nodes: `std_dev / mean`.
///
/// Zero when the cluster is idle (mean load 0), so an empty cluster is
/// never reported as imbalanced.
pub fn imbalance_ratio(nodes: &[NodeSnapshot]) -> f64 {
    let mean = mean_load(nodes);
    if mean <= 0.0 {
        return 0.0;
    }
    std_dev_load(nodes) / mean
}

/// Health signal surfaced to callers and the audit log. Never blocks
/// dispatch.
pub fn is_imbalanced(nodes: &[NodeSnapshot], threshold: f64) -> bool {
    imbalance_ratio(nodes) > threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NodeId;
    use proptest::prelude::*;

    fn snap(loads_caps: &[(f64, f64)]) -> Vec<NodeSnapshot> {
        loads_caps
            .iter()
            .enumerate()
            .map(|(i, &(load, capacity))| NodeSnapshot {
                id: NodeId(i),
                capacity,
                load,
            })
            .collect()
    }

    #[test]
    fn test_cost_basic() {
        assert!((cost(0.0, 500.0, 4000.0) - 8.0).abs() < 1e-12);
        assert!((cost(1000.0, 1000.0, 4000.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_mean_and_std_dev() {
        let nodes = snap(&[(2.0, 1.0), (4.0, 1.0), (4.0, 1.0), (4.0, 1.0), (5.0, 1.0), (5.0, 1.0), (7.0, 1.0), (9.0, 1.0)]);
        assert!((mean_load(&nodes) - 5.0).abs() < 1e-12);
        assert!((std_dev_load(&nodes) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_idle_cluster_is_balanced() {
        let nodes = snap(&[(0.0, 500.0), (0.0, 1000.0)]);
        assert_eq!(imbalance_ratio(&nodes), 0.0);
        assert!(!is_imbalanced(&nodes, DEFAULT_IMBALANCE_THRESHOLD));
    }

    #[test]
    fn test_skewed_cluster_is_imbalanced() {
        let nodes = snap(&[(8000.0, 500.0), (0.0, 1000.0), (0.0, 500.0)]);
        assert!(is_imbalanced(&nodes, DEFAULT_IMBALANCE_THRESHOLD));
    }

    #[test]
    fn test_empty_slice() {
        assert_eq!(mean_load(&[]), 0.0);
        assert_eq!(std_dev_load(&[]), 0.0);
        assert_eq!(imbalance_ratio(&[]), 0.0);
    }

    proptest! {
        #[test]
        fn prop_cost_monotone_in_size(
            load in 0.0..1e6f64,
            capacity in 1.0..1e4f64,
            size in 0.0..1e6f64,
            bump in 1e-6..1e6f64,
        ) {
            prop_assert!(cost(load, capacity, size + bump) > cost(load, capacity, size));
        }

        #[test]
        fn prop_cost_monotone_in_capacity(
            load in 0.0..1e6f64,
            capacity in 1.0..1e4f64,
            size in 1.0..1e6f64,
            bump in 1.0..1e4f64,
        ) {
            prop_assert!(cost(load, capacity + bump, size) < cost(load, capacity, size));
        }

        #[test]
        fn prop_std_dev_zero_for_uniform_loads(load in 0.0..1e6f64, n in 1usize..16) {
            let nodes: Vec<_> = (0..n)
                .map(|i| NodeSnapshot { id: NodeId(i), capacity: 1000.0, load })
                .collect();
            prop_assert!(std_dev_load(&nodes) < 1e-6);
        }
    }
}
