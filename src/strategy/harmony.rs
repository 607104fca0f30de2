//! Harmony search and the hybrid SA-HS strategy.
//!
//! Both keep a fixed-size memory of scored node candidates. Plain
//! harmony search replaces the worst entry whenever a new candidate
//! beats it; the hybrid replaces through a cooling Metropolis criterion
//! and additionally tracks a global best across iterations.

use super::{eligible, make_rng, scoring_size, Selection, SelectionStrategy};
use crate::registry::NodeSnapshot;
use crate::stats;
use rand::rngs::StdRng;
use rand::Rng;

/// Shared tuning of the memory-based family. Defaults are the original
/// deployment's values.
#[derive(Debug, Clone)]
pub struct HarmonyConfig {
    /// Harmony memory size (HMS).
    pub memory_size: usize,

    /// Memory consideration rate (HMCR): probability of drawing from
    /// memory instead of generating a fresh random candidate.
    pub memory_rate: f64,

    /// Pitch adjustment rate (PAR): probability of perturbing a
    /// memory-drawn candidate.
    pub pitch_rate: f64,

    /// Pitch bandwidth (BW): the perturbation moves the scored task
    /// size by up to `±bandwidth · capacity`.
    pub bandwidth: f64,

    /// Iteration budget.
    pub max_iterations: usize,

    /// Random seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for HarmonyConfig {
    fn default() -> Self {
        Self {
            memory_size: 5,
            memory_rate: 0.9,
            pitch_rate: 0.3,
            bandwidth: 0.001,
            max_iterations: 1000,
            seed: None,
        }
    }
}

impl HarmonyConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.memory_size == 0 {
            return Err("memory_size must be at least 1".into());
        }
        for (name, p) in [("memory_rate", self.memory_rate), ("pitch_rate", self.pitch_rate)] {
            if !(0.0..=1.0).contains(&p) {
                return Err(format!("{name} must be in [0, 1], got {p}"));
            }
        }
        if self.bandwidth < 0.0 {
            return Err("bandwidth must be non-negative".into());
        }
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".into());
        }
        Ok(())
    }
}

/// One scored memory entry: a node index with its projected fitness.
#[derive(Debug, Clone, Copy)]
struct Entry {
    node: usize,
    fitness: f64,
}

fn init_memory(nodes: &[NodeSnapshot], size: f64, hms: usize, rng: &mut StdRng) -> Vec<Entry> {
    (0..hms)
        .map(|_| {
            let node = rng.random_range(0..nodes.len());
            Entry {
                node,
                fitness: stats::node_cost(&nodes[node], size),
            }
        })
        .collect()
}

/// Draws the next candidate: from memory (optionally pitch-adjusted) or
/// fresh at random.
fn next_candidate(
    memory: &[Entry],
    nodes: &[NodeSnapshot],
    size: f64,
    config: &HarmonyConfig,
    rng: &mut StdRng,
) -> Entry {
    if rng.random_range(0.0..1.0) < config.memory_rate {
        let node = memory[rng.random_range(0..memory.len())].node;
        let scored = if rng.random_range(0.0..1.0) < config.pitch_rate {
            let adjustment = rng.random_range(-1.0..1.0) * config.bandwidth;
            (size + nodes[node].capacity * adjustment).max(0.0)
        } else {
            size
        };
        Entry {
            node,
            fitness: stats::node_cost(&nodes[node], scored),
        }
    } else {
        let node = rng.random_range(0..nodes.len());
        Entry {
            node,
            fitness: stats::node_cost(&nodes[node], size),
        }
    }
}

fn worst_index(memory: &[Entry]) -> usize {
    memory
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.fitness.total_cmp(&b.1.fitness))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn best_entry(memory: &[Entry]) -> Entry {
    memory
        .iter()
        .copied()
        .min_by(|a, b| a.fitness.total_cmp(&b.fitness))
        .unwrap_or(memory[0])
}

/// Memory-based strategy (`hs`): replace-worst-if-better.
#[derive(Debug, Default)]
pub struct HarmonySearch {
    config: HarmonyConfig,
}

impl HarmonySearch {
    /// # Panics
    /// Panics if the configuration is invalid.
    pub fn with_config(config: HarmonyConfig) -> Self {
        config.validate().expect("invalid HarmonyConfig");
        Self { config }
    }
}

impl SelectionStrategy for HarmonySearch {
    fn name(&self) -> &'static str {
        "hs"
    }

    fn select(&self, nodes: &[NodeSnapshot], task_size: f64) -> Option<Selection> {
        let nodes = eligible(nodes);
        if nodes.is_empty() {
            return None;
        }
        let size = scoring_size(task_size);
        let mut rng = make_rng(self.config.seed);
        let mut memory = init_memory(&nodes, size, self.config.memory_size, &mut rng);

        for _ in 0..self.config.max_iterations {
            let candidate = next_candidate(&memory, &nodes, size, &self.config, &mut rng);
            let worst = worst_index(&memory);
            if candidate.fitness < memory[worst].fitness {
                memory[worst] = candidate;
            }
        }

        let best = best_entry(&memory);
        Some(Selection {
            node: nodes[best.node].id,
            score: best.fitness,
            evaluations: self.config.memory_size + self.config.max_iterations,
        })
    }
}

/// Tuning of the hybrid's annealing side.
#[derive(Debug, Clone)]
pub struct HybridConfig {
    pub harmony: HarmonyConfig,

    /// Initial temperature of the Metropolis replacement test.
    pub initial_temperature: f64,

    /// Geometric cooling factor, applied every `cooling_interval`
    /// iterations.
    pub alpha: f64,

    /// Iterations between cooling steps.
    pub cooling_interval: usize,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            harmony: HarmonyConfig {
                max_iterations: 500,
                ..HarmonyConfig::default()
            },
            initial_temperature: 1000.0,
            alpha: 0.95,
            cooling_interval: 7,
        }
    }
}

impl HybridConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.harmony.validate()?;
        if self.initial_temperature <= 0.0 {
            return Err("initial_temperature must be positive".into());
        }
        if self.alpha <= 0.0 || self.alpha >= 1.0 {
            return Err(format!("alpha must be in (0, 1), got {}", self.alpha));
        }
        if self.cooling_interval == 0 {
            return Err("cooling_interval must be at least 1".into());
        }
        Ok(())
    }
}

/// Memory-based strategy (`sahsh`): harmony memory with Metropolis
/// replacement against the worst entry, tracking a separate global best.
#[derive(Debug, Default)]
pub struct HybridSaHs {
    config: HybridConfig,
}

impl HybridSaHs {
    /// # Panics
    /// Panics if the configuration is invalid.
    pub fn with_config(config: HybridConfig) -> Self {
        config.validate().expect("invalid HybridConfig");
        Self { config }
    }
}

impl SelectionStrategy for HybridSaHs {
    fn name(&self) -> &'static str {
        "sahsh"
    }

    fn select(&self, nodes: &[NodeSnapshot], task_size: f64) -> Option<Selection> {
        let nodes = eligible(nodes);
        if nodes.is_empty() {
            return None;
        }
        let size = scoring_size(task_size);
        let harmony = &self.config.harmony;
        let mut rng = make_rng(harmony.seed);
        let mut memory = init_memory(&nodes, size, harmony.memory_size, &mut rng);
        let mut best = best_entry(&memory);
        let mut temperature = self.config.initial_temperature;

        for iter in 0..harmony.max_iterations {
            let candidate = next_candidate(&memory, &nodes, size, harmony, &mut rng);
            let worst = worst_index(&memory);
            let delta = candidate.fitness - memory[worst].fitness;

            let accept =
                delta < 0.0 || rng.random_range(0.0..1.0) < (-delta / temperature).exp();
            if accept {
                memory[worst] = candidate;
                if candidate.fitness < best.fitness {
                    best = candidate;
                }
            }

            if (iter + 1) % self.config.cooling_interval == 0 {
                temperature *= self.config.alpha;
            }
        }

        Some(Selection {
            node: nodes[best.node].id,
            score: best.fitness,
            evaluations: harmony.memory_size + harmony.max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::testutil::{cluster, one_empty};

    #[test]
    fn test_config_validate() {
        assert!(HarmonyConfig::default().validate().is_ok());
        assert!(HybridConfig::default().validate().is_ok());
        let bad = HarmonyConfig {
            memory_rate: 1.5,
            ..HarmonyConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = HybridConfig {
            cooling_interval: 0,
            ..HybridConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_hs_converges_to_cheapest_node() {
        let nodes = cluster(&[(500.0, 2000.0), (1000.0, 0.0), (500.0, 0.0)]);
        let hs = HarmonySearch::with_config(HarmonyConfig {
            seed: Some(1),
            ..HarmonyConfig::default()
        });
        let sel = hs.select(&nodes, 4000.0).unwrap();
        assert_eq!(sel.node.index(), 1);
        assert!((sel.score - 4.0).abs() < 0.01);
    }

    #[test]
    fn test_hs_prefers_empty_node() {
        let nodes = one_empty(6, 4);
        let hs = HarmonySearch::default();
        let hits = (0..200)
            .filter(|_| hs.select(&nodes, 500.0).unwrap().node.index() == 4)
            .count();
        assert!(hits >= 180, "empty node hit {hits}/200");
    }

    #[test]
    fn test_hybrid_global_best_survives_metropolis_churn() {
        // Even though the hybrid can accept worsening replacements, the
        // answer comes from the tracked global best.
        let nodes = one_empty(5, 1);
        let hybrid = HybridSaHs::default();
        let hits = (0..200)
            .filter(|_| hybrid.select(&nodes, 500.0).unwrap().node.index() == 1)
            .count();
        assert!(hits >= 180, "empty node hit {hits}/200");
    }

    #[test]
    fn test_hybrid_on_idle_six() {
        // The original benchmark cluster: a 4000 task on six idle nodes
        // must land on one of the 1000-capacity nodes.
        let nodes = crate::strategy::testutil::idle_six();
        let hybrid = HybridSaHs::default();
        for _ in 0..50 {
            let sel = hybrid.select(&nodes, 4000.0).unwrap();
            assert!(sel.node.index() % 2 == 1, "chose {}", sel.node);
        }
    }
}
