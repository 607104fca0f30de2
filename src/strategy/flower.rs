//! Flower pollination over full load vectors.
//!
//! Each candidate is a hypothetical per-node load vector seeded from
//! the snapshot with the task placed on a random node. Global
//! pollination moves a candidate toward the best vector by Lévy-stable
//! steps (Mantegna, index 1.5); local pollination interpolates between
//! two other population members. Fitness is the dispersion (standard
//! deviation) of per-node utilization; updates are greedy for both the
//! individual and the global best.

use super::{eligible, make_rng, scoring_size, Selection, SelectionStrategy};
use crate::levy;
use crate::registry::NodeSnapshot;
use rand::Rng;

/// Configuration for [`FlowerPollination`].
#[derive(Debug, Clone)]
pub struct FlowerConfig {
    pub population: usize,
    pub generations: usize,

    /// Probability of global (Lévy) pollination over local
    /// interpolation.
    pub switch_probability: f64,

    /// Lévy index of the global-pollination step.
    pub levy_beta: f64,

    pub seed: Option<u64>,
}

impl Default for FlowerConfig {
    fn default() -> Self {
        Self {
            population: 10,
            generations: 30,
            switch_probability: 0.8,
            levy_beta: 1.5,
            seed: None,
        }
    }
}

impl FlowerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.population < 2 {
            return Err("population must be at least 2".into());
        }
        if self.generations == 0 {
            return Err("generations must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.switch_probability) {
            return Err(format!(
                "switch_probability must be in [0, 1], got {}",
                self.switch_probability
            ));
        }
        if !(1.0..2.0).contains(&self.levy_beta) {
            return Err(format!("levy_beta must be in [1, 2), got {}", self.levy_beta));
        }
        Ok(())
    }
}

/// Pollination-family strategy (`fpa`).
#[derive(Debug, Default)]
pub struct FlowerPollination {
    config: FlowerConfig,
}

impl FlowerPollination {
    /// # Panics
    /// Panics if the configuration is invalid.
    pub fn with_config(config: FlowerConfig) -> Self {
        config.validate().expect("invalid FlowerConfig");
        Self { config }
    }
}

/// Standard deviation of per-node utilization for a hypothetical load
/// vector.
fn dispersion(loads: &[f64], nodes: &[NodeSnapshot]) -> f64 {
    let utils: Vec<f64> = loads
        .iter()
        .zip(nodes)
        .map(|(&load, node)| load / node.capacity)
        .collect();
    let mean = utils.iter().sum::<f64>() / utils.len() as f64;
    let variance = utils.iter().map(|u| (u - mean).powi(2)).sum::<f64>() / utils.len() as f64;
    variance.sqrt()
}

impl SelectionStrategy for FlowerPollination {
    fn name(&self) -> &'static str {
        "fpa"
    }

    fn select(&self, nodes: &[NodeSnapshot], task_size: f64) -> Option<Selection> {
        let nodes = eligible(nodes);
        if nodes.is_empty() {
            return None;
        }
        let size = scoring_size(task_size);
        let n = nodes.len();
        let mut rng = make_rng(self.config.seed);
        let mut evaluations = 0usize;

        // A candidate may not shed work the nodes already carry, nor
        // add more than this task.
        let clamp = |d: usize, value: f64| value.clamp(nodes[d].load, nodes[d].load + size);

        let mut population: Vec<Vec<f64>> = (0..self.config.population)
            .map(|_| {
                let mut loads: Vec<f64> = nodes.iter().map(|node| node.load).collect();
                loads[rng.random_range(0..n)] += size;
                loads
            })
            .collect();
        let mut fitness: Vec<f64> = population
            .iter()
            .map(|loads| {
                evaluations += 1;
                dispersion(loads, &nodes)
            })
            .collect();

        let best_idx = (0..population.len())
            .min_by(|&a, &b| fitness[a].total_cmp(&fitness[b]))
            .expect("population is non-empty");
        let mut best = population[best_idx].clone();
        let mut best_fitness = fitness[best_idx];

        for _ in 0..self.config.generations {
            for i in 0..population.len() {
                let mut candidate = population[i].clone();
                if rng.random_range(0.0..1.0) < self.config.switch_probability {
                    // Global pollination: Lévy flight toward the best.
                    for d in 0..n {
                        let step = levy::levy_step(&mut rng, self.config.levy_beta);
                        candidate[d] = clamp(d, candidate[d] + step * (best[d] - candidate[d]));
                    }
                } else {
                    // Local pollination: interpolate between two other
                    // members.
                    let a = rng.random_range(0..population.len());
                    let b = rng.random_range(0..population.len());
                    let epsilon: f64 = rng.random_range(0.0..1.0);
                    for d in 0..n {
                        candidate[d] = clamp(
                            d,
                            candidate[d] + epsilon * (population[a][d] - population[b][d]),
                        );
                    }
                }

                let candidate_fitness = dispersion(&candidate, &nodes);
                evaluations += 1;
                if candidate_fitness < fitness[i] {
                    population[i] = candidate.clone();
                    fitness[i] = candidate_fitness;
                }
                if candidate_fitness < best_fitness {
                    best = candidate;
                    best_fitness = candidate_fitness;
                }
            }
        }

        // The least-utilized node of the best hypothetical assignment.
        let chosen = (0..n)
            .min_by(|&a, &b| {
                (best[a] / nodes[a].capacity).total_cmp(&(best[b] / nodes[b].capacity))
            })
            .expect("at least one eligible node");

        Some(Selection {
            node: nodes[chosen].id,
            score: best_fitness,
            evaluations,
        })
    }
}
