//! Post-selection rebalancing.
//!
//! A cheap, deterministic O(nodes) correction layered on top of any
//! stochastic strategy: if committing the chosen assignment would push
//! global load imbalance past a threshold, and handing the task to the
//! least-utilized node instead would strictly reduce that imbalance,
//! the choice is overridden.

use crate::registry::{NodeId, NodeSnapshot};
use tracing::debug;

/// Configuration for the [`Rebalancer`].
#[derive(Debug, Clone)]
pub struct RebalanceConfig {
    /// Hypothetical post-commit `std_dev/mean` ratio above which an
    /// override is considered.
    pub threshold: f64,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self { threshold: 0.001 }
    }
}

impl RebalanceConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(format!(
                "threshold must be a non-negative number, got {}",
                self.threshold
            ));
        }
        Ok(())
    }
}

/// Result of a rebalancing check.
#[derive(Debug, Clone, Copy)]
pub struct Rebalanced {
    /// The assignment to commit (the original choice unless overridden).
    pub node: NodeId,

    /// Whether the strategy's choice was overridden.
    pub overridden: bool,

    /// Hypothetical post-commit imbalance of the returned assignment.
    pub imbalance: f64,
}

/// Deterministic post-selection imbalance check.
#[derive(Debug, Default)]
pub struct Rebalancer {
    config: RebalanceConfig,
}

impl Rebalancer {
    /// # Panics
    /// Panics if the configuration is invalid.
    pub fn with_config(config: RebalanceConfig) -> Self {
        config.validate().expect("invalid RebalanceConfig");
        Self { config }
    }

    /// Reviews `chosen` for a task of `size` against the snapshot.
    ///
    /// Never increases imbalance: the override is only taken when it
    /// strictly reduces the hypothetical post-commit ratio.
    pub fn review(&self, nodes: &[NodeSnapshot], chosen: NodeId, size: f64) -> Rebalanced {
        let chosen_ratio = hypothetical_imbalance(nodes, chosen, size);
        if chosen_ratio <= self.config.threshold {
            return Rebalanced {
                node: chosen,
                overridden: false,
                imbalance: chosen_ratio,
            };
        }

        let least_utilized = nodes
            .iter()
            .filter(|n| n.capacity > 0.0)
            .min_by(|a, b| a.utilization().total_cmp(&b.utilization()))
            .map(|n| n.id);

        if let Some(candidate) = least_utilized {
            if candidate != chosen {
                let candidate_ratio = hypothetical_imbalance(nodes, candidate, size);
                if candidate_ratio < chosen_ratio {
                    debug!(
                        from = %chosen,
                        to = %candidate,
                        before = chosen_ratio,
                        after = candidate_ratio,
                        "rebalancer override"
                    );
                    return Rebalanced {
                        node: candidate,
                        overridden: true,
                        imbalance: candidate_ratio,
                    };
                }
            }
        }

        Rebalanced {
            node: chosen,
            overridden: false,
            imbalance: chosen_ratio,
        }
    }
}

/// `std_dev/mean` of loads after hypothetically placing `size` on
/// `target`.
fn hypothetical_imbalance(nodes: &[NodeSnapshot], target: NodeId, size: f64) -> f64 {
    if nodes.is_empty() {
        return 0.0;
    }
    let loads: Vec<f64> = nodes
        .iter()
        .map(|n| {
            if n.id == target {
                n.load + size
            } else {
                n.load
            }
        })
        .collect();
    let mean = loads.iter().sum::<f64>() / loads.len() as f64;
    if mean <= 0.0 {
        return 0.0;
    }
    let variance = loads.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / loads.len() as f64;
    variance.sqrt() / mean
}
