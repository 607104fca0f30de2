//! Ant colony optimization over per-node pheromones.
//!
//! One pheromone value per node, initialized uniformly. Each
//! generation a fixed number of ants pick nodes by roulette-wheel over
//! `pheromone · (capacity/size)^beta`; pheromones then evaporate
//! geometrically (floored above zero so no node starves) and the
//! generation's best node is reinforced in proportion to its fitness.

use super::{eligible, make_rng, scoring_size, Selection, SelectionStrategy};
use crate::registry::NodeSnapshot;
use crate::stats;
use rand::rngs::StdRng;
use rand::Rng;

/// Configuration for [`AntColony`].
#[derive(Debug, Clone)]
pub struct AcoConfig {
    pub ants: usize,
    pub generations: usize,

    /// Heuristic exponent on the capacity-to-size ratio.
    pub beta: f64,

    /// Fraction of pheromone lost per generation, in (0, 1).
    pub evaporation_rate: f64,

    /// Lower bound keeping evaporated pheromone above zero.
    pub pheromone_floor: f64,

    pub seed: Option<u64>,
}

impl Default for AcoConfig {
    fn default() -> Self {
        Self {
            ants: 10,
            generations: 50,
            beta: 2.0,
            evaporation_rate: 0.1,
            pheromone_floor: 1e-12,
            seed: None,
        }
    }
}

impl AcoConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.ants == 0 || self.generations == 0 {
            return Err("ants and generations must be at least 1".into());
        }
        if !(0.0..1.0).contains(&self.evaporation_rate) || self.evaporation_rate == 0.0 {
            return Err(format!(
                "evaporation_rate must be in (0, 1), got {}",
                self.evaporation_rate
            ));
        }
        if self.pheromone_floor <= 0.0 {
            return Err("pheromone_floor must be positive".into());
        }
        Ok(())
    }
}

/// Outcome of one colony run, including the final trail state.
struct ColonyRun {
    chosen: usize,
    fitness: f64,
    evaluations: usize,
    pheromone: Vec<f64>,
}

/// Pheromone-family strategy (`aco`).
#[derive(Debug, Default)]
pub struct AntColony {
    config: AcoConfig,
}

impl AntColony {
    /// # Panics
    /// Panics if the configuration is invalid.
    pub fn with_config(config: AcoConfig) -> Self {
        config.validate().expect("invalid AcoConfig");
        Self { config }
    }

    fn run(&self, nodes: &[NodeSnapshot], size: f64, rng: &mut StdRng) -> ColonyRun {
        let n = nodes.len();
        let mut pheromone = vec![1.0; n];
        // Heuristic desirability is capacity-driven; guard the ratio
        // against a zero task size.
        let denom = size.max(1e-9);
        let heuristic: Vec<f64> = nodes
            .iter()
            .map(|node| (node.capacity / denom).powf(self.config.beta))
            .collect();

        let mut best: Option<(usize, f64)> = None;
        let mut evaluations = 0usize;

        for _ in 0..self.config.generations {
            let mut generation_best: Option<(usize, f64)> = None;

            for _ in 0..self.config.ants {
                let node = roulette(&pheromone, &heuristic, rng);
                let fitness = stats::node_cost(&nodes[node], size);
                evaluations += 1;
                if generation_best.is_none_or(|(_, f)| fitness < f) {
                    generation_best = Some((node, fitness));
                }
            }

            for p in &mut pheromone {
                *p = (*p * (1.0 - self.config.evaporation_rate)).max(self.config.pheromone_floor);
            }
            if let Some((node, fitness)) = generation_best {
                pheromone[node] += 1.0 / (1.0 + fitness);
                if best.is_none_or(|(_, f)| fitness < f) {
                    best = Some((node, fitness));
                }
            }
        }

        let (chosen, fitness) = best.expect("at least one generation ran");
        ColonyRun {
            chosen,
            fitness,
            evaluations,
            pheromone,
        }
    }
}

/// Roulette-wheel pick proportional to `pheromone · heuristic`; uniform
/// when every weight is zero or non-finite.
fn roulette(pheromone: &[f64], heuristic: &[f64], rng: &mut StdRng) -> usize {
    let weights: Vec<f64> = pheromone
        .iter()
        .zip(heuristic)
        .map(|(p, h)| p * h)
        .collect();
    let total: f64 = weights.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return rng.random_range(0..weights.len());
    }
    let mut spin = rng.random_range(0.0..total);
    for (i, w) in weights.iter().enumerate() {
        spin -= w;
        if spin <= 0.0 {
            return i;
        }
    }
    weights.len() - 1
}

impl SelectionStrategy for AntColony {
    fn name(&self) -> &'static str {
        "aco"
    }

    fn select(&self, nodes: &[NodeSnapshot], task_size: f64) -> Option<Selection> {
        let nodes = eligible(nodes);
        if nodes.is_empty() {
            return None;
        }
        let size = scoring_size(task_size);
        let mut rng = make_rng(self.config.seed);
        let run = self.run(&nodes, size, &mut rng);
        Some(Selection {
            node: nodes[run.chosen].id,
            score: run.fitness,
            evaluations: run.evaluations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::testutil::{cluster, one_empty};
    use crate::strategy::make_rng;

    #[test]
    fn test_config_validate() {
        assert!(AcoConfig::default().validate().is_ok());
        let bad = AcoConfig {
            evaporation_rate: 0.0,
            ..AcoConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = AcoConfig {
            pheromone_floor: 0.0,
            ..AcoConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_roulette_degenerate_weights() {
        let mut rng = make_rng(Some(5));
        // All-zero weights fall back to uniform.
        let idx = roulette(&[0.0, 0.0, 0.0], &[0.0, 0.0, 0.0], &mut rng);
        assert!(idx < 3);
        // A single dominant weight always wins.
        for _ in 0..50 {
            assert_eq!(roulette(&[0.0, 1.0], &[0.0, 5.0], &mut rng), 1);
        }
    }

    #[test]
    fn test_prefers_empty_node() {
        let nodes = one_empty(4, 2);
        let aco = AntColony::default();
        let hits = (0..200)
            .filter(|_| aco.select(&nodes, 500.0).unwrap().node.index() == 2)
            .count();
        assert!(hits >= 180, "empty node hit {hits}/200");
    }

    #[test]
    fn test_pheromone_bounded_on_identical_nodes() {
        // Two equal empty nodes carry no preference signal: evaporation
        // caps total deposited pheromone at deposit/rho, so the trails
        // stay bounded instead of diverging.
        let nodes = cluster(&[(1000.0, 0.0), (1000.0, 0.0)]);
        let config = AcoConfig {
            seed: Some(11),
            ..AcoConfig::default()
        };
        let deposit = 1.0 / (1.0 + stats::node_cost(&nodes[0], 500.0));
        let cap = deposit / config.evaporation_rate;
        let aco = AntColony::with_config(config.clone());
        let mut rng = make_rng(config.seed);
        let run = aco.run(&nodes, 500.0, &mut rng);
        for &p in &run.pheromone {
            assert!(p > 0.0);
            assert!(p <= 1.0 + cap, "pheromone {p} exceeded bound {cap}");
        }
        assert!((run.pheromone[0] - run.pheromone[1]).abs() <= cap);
    }

    #[test]
    fn test_capacity_bias_on_idle_cluster() {
        // Idle cluster: the heuristic term alone should steer the best
        // pick toward a 1000-capacity node.
        let nodes = crate::strategy::testutil::idle_six();
        let aco = AntColony::default();
        let hits = (0..100)
            .filter(|_| aco.select(&nodes, 4000.0).unwrap().node.index() % 2 == 1)
            .count();
        assert!(hits >= 95, "fast nodes hit {hits}/100");
    }
}
