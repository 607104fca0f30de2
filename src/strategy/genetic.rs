//! Generational genetic algorithm over node-index assignments.
//!
//! The chromosome for a single pending task is just the target node
//! index. Each generation draws parent pairs uniformly, applies
//! single-point crossover and uniform-random mutation, and fully
//! replaces the population (no elitism). Fitness is the load spread
//! (`max − mean`) after hypothetically applying the assignment; the
//! best individual seen across all generations is the answer.

use super::{eligible, make_rng, scoring_size, Selection, SelectionStrategy};
use crate::registry::NodeSnapshot;
use rand::Rng;

/// Configuration for [`Genetic`].
#[derive(Debug, Clone)]
pub struct GeneticConfig {
    pub population: usize,
    pub generations: usize,

    /// Probability that a child is produced by crossover instead of
    /// cloning the first parent.
    pub crossover_rate: f64,

    /// Probability that a child's index is replaced by a uniformly
    /// random node.
    pub mutation_rate: f64,

    pub seed: Option<u64>,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population: 20,
            generations: 50,
            crossover_rate: 0.8,
            mutation_rate: 0.1,
            seed: None,
        }
    }
}

impl GeneticConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.population == 0 || self.generations == 0 {
            return Err("population and generations must be at least 1".into());
        }
        for (name, p) in [
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(format!("{name} must be in [0, 1], got {p}"));
            }
        }
        Ok(())
    }
}

/// Evolutionary-family strategy (`ga`).
#[derive(Debug, Default)]
pub struct Genetic {
    config: GeneticConfig,
}

impl Genetic {
    /// # Panics
    /// Panics if the configuration is invalid.
    pub fn with_config(config: GeneticConfig) -> Self {
        config.validate().expect("invalid GeneticConfig");
        Self { config }
    }
}

/// Load spread after hypothetically assigning the task to `node`.
fn spread(nodes: &[NodeSnapshot], node: usize, size: f64) -> f64 {
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for (i, snapshot) in nodes.iter().enumerate() {
        let load = if i == node {
            snapshot.load + size
        } else {
            snapshot.load
        };
        max = max.max(load);
        sum += load;
    }
    max - sum / nodes.len() as f64
}

impl SelectionStrategy for Genetic {
    fn name(&self) -> &'static str {
        "ga"
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

        let mut population: Vec<usize> =
            (0..self.config.population).map(|_| rng.random_range(0..n)).collect();

        let mut best = population[0];
        let mut best_fitness = f64::INFINITY;
        for &individual in &population {
            let f = spread(&nodes, individual, size);
            evaluations += 1;
            if f < best_fitness {
                best = individual;
                best_fitness = f;
            }
        }

        for _ in 0..self.config.generations {
            let mut next: Vec<usize> = Vec::with_capacity(population.len());
            while next.len() < population.len() {
                let p1 = population[rng.random_range(0..population.len())];
                let p2 = population[rng.random_range(0..population.len())];

                // Single-point crossover on a one-gene chromosome:
                // the cut either keeps the first parent or takes the
                // second.
                let mut child = if rng.random_range(0.0..1.0) < self.config.crossover_rate {
                    if rng.random_range(0.0..1.0) < 0.5 {
                        p1
                    } else {
                        p2
                    }
                } else {
                    p1
                };

                if rng.random_range(0.0..1.0) < self.config.mutation_rate {
                    child = rng.random_range(0..n);
                }

                let f = spread(&nodes, child, size);
                evaluations += 1;
                if f < best_fitness {
                    best = child;
                    best_fitness = f;
                }
                next.push(child);
            }
            // Full generational replacement, no elitism.
            population = next;
        }

        Some(Selection {
            node: nodes[best].id,
            score: best_fitness,
            evaluations,
        })
    }
}
