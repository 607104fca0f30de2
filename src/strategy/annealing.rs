//! Simulated annealing over node choices.
//!
//! Single-candidate trajectory search: at each of `inner_iterations`
//! steps per temperature level a uniformly random node is proposed and
//! accepted by the Metropolis criterion; the temperature cools
//! geometrically until it falls below the floor. The best candidate
//! seen anywhere in the trajectory is returned.

use super::{eligible, make_rng, scoring_size, Selection, SelectionStrategy};
use crate::registry::NodeSnapshot;
use crate::stats;
use rand::Rng;

/// Configuration for [`Annealing`].
///
/// The defaults are the original deployment's tuning: a hot start with
/// aggressive cooling, trading search depth for per-request latency.
#[derive(Debug, Clone)]
pub struct AnnealingConfig {
    /// Initial temperature.
    pub initial_temperature: f64,

    /// Geometric cooling factor in (0, 1).
    pub alpha: f64,

    /// Iterations per temperature level.
    pub inner_iterations: usize,

    /// Stop once the temperature falls below this floor.
    pub min_temperature: f64,

    /// Random seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 1000.0,
            alpha: 0.25,
            inner_iterations: 3,
            min_temperature: 1e-3,
            seed: None,
        }
    }
}

impl AnnealingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_temperature <= 0.0 {
            return Err("initial_temperature must be positive".into());
        }
        if self.alpha <= 0.0 || self.alpha >= 1.0 {
            return Err(format!("alpha must be in (0, 1), got {}", self.alpha));
        }
        if self.min_temperature <= 0.0 || self.min_temperature >= self.initial_temperature {
            return Err("min_temperature must be in (0, initial_temperature)".into());
        }
        if self.inner_iterations == 0 {
            return Err("inner_iterations must be at least 1".into());
        }
        Ok(())
    }
}

/// Local-search family strategy (`sa`).
#[derive(Debug, Default)]
pub struct Annealing {
    config: AnnealingConfig,
}

impl Annealing {
    /// # Panics
    /// Panics if the configuration is invalid (call
    /// [`AnnealingConfig::validate`] first to get a descriptive error).
    pub fn with_config(config: AnnealingConfig) -> Self {
        config.validate().expect("invalid AnnealingConfig");
        Self { config }
    }
}

impl SelectionStrategy for Annealing {
    fn name(&self) -> &'static str {
        "sa"
    }

    fn select(&self, nodes: &[NodeSnapshot], task_size: f64) -> Option<Selection> {
        let nodes = eligible(nodes);
        if nodes.is_empty() {
            return None;
        }
        let size = scoring_size(task_size);
        let mut rng = make_rng(self.config.seed);

        let mut current = rng.random_range(0..nodes.len());
        let mut current_cost = stats::node_cost(&nodes[current], size);
        let mut best = current;
        let mut best_cost = current_cost;
        let mut evaluations = 1;

        let mut temperature = self.config.initial_temperature;
        while temperature > self.config.min_temperature {
            for _ in 0..self.config.inner_iterations {
                let neighbor = rng.random_range(0..nodes.len());
                let neighbor_cost = stats::node_cost(&nodes[neighbor], size);
                evaluations += 1;

                let delta = neighbor_cost - current_cost;
                let accept =
                    delta < 0.0 || rng.random_range(0.0..1.0) < (-delta / temperature).exp();
                if accept {
                    current = neighbor;
                    current_cost = neighbor_cost;
                    if current_cost < best_cost {
                        best = current;
                        best_cost = current_cost;
                    }
                }
            }
            temperature *= self.config.alpha;
        }

        Some(Selection {
            node: nodes[best].id,
            score: best_cost,
            evaluations,
        })
    }
}
