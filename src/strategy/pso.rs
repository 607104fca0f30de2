//! Particle swarm over a scalar node index.
//!
//! Each particle is one continuous position in `[0, n−1]` that rounds
//! to a node index; fitness is the projected utilization of that node.
//! Classic PSO velocity update with personal- and global-best
//! attraction and linearly decaying inertia.

use super::{eligible, make_rng, scoring_size, Selection, SelectionStrategy};
use crate::registry::NodeSnapshot;
use rand::Rng;

/// Configuration for [`ParticleSwarm`]. Acceleration coefficients are
/// the canonical `c1 = c2 = 2.0`.
#[derive(Debug, Clone)]
pub struct PsoConfig {
    pub population: usize,
    pub iterations: usize,

    /// Cognitive coefficient (pull toward the particle's own best).
    pub cognitive: f64,

    /// Social coefficient (pull toward the swarm's best).
    pub social: f64,

    /// Inertia at the first and last iteration.
    pub inertia_start: f64,
    pub inertia_end: f64,

    pub seed: Option<u64>,
}

impl Default for PsoConfig {
    fn default() -> Self {
        Self {
            population: 30,
            iterations: 100,
            cognitive: 2.0,
            social: 2.0,
            inertia_start: 0.9,
            inertia_end: 0.4,
            seed: None,
        }
    }
}

impl PsoConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.population == 0 || self.iterations == 0 {
            return Err("population and iterations must be at least 1".into());
        }
        if self.cognitive < 0.0 || self.social < 0.0 {
            return Err("acceleration coefficients must be non-negative".into());
        }
        if self.inertia_start < self.inertia_end {
            return Err("inertia must not grow over the run".into());
        }
        Ok(())
    }
}

/// Swarm-family strategy (`pso`).
#[derive(Debug, Default)]
pub struct ParticleSwarm {
    config: PsoConfig,
}

impl ParticleSwarm {
    /// # Panics
    /// Panics if the configuration is invalid.
    pub fn with_config(config: PsoConfig) -> Self {
        config.validate().expect("invalid PsoConfig");
        Self { config }
    }
}

fn round_index(position: f64, n: usize) -> usize {
    (position.round().max(0.0) as usize).min(n - 1)
}

impl SelectionStrategy for ParticleSwarm {
    fn name(&self) -> &'static str {
        "pso"
    }

    fn select(&self, nodes: &[NodeSnapshot], task_size: f64) -> Option<Selection> {
        let nodes = eligible(nodes);
        if nodes.is_empty() {
            return None;
        }
        let size = scoring_size(task_size);
        let n = nodes.len();
        let upper = (n - 1) as f64;
        let mut rng = make_rng(self.config.seed);
        let mut evaluations = 0usize;

        let fitness = |position: f64| {
            let node = &nodes[round_index(position, n)];
            (node.load + size) / node.capacity
        };

        struct Particle {
            position: f64,
            velocity: f64,
            best_position: f64,
            best_fitness: f64,
        }

        let mut swarm: Vec<Particle> = (0..self.config.population)
            .map(|_| {
                let position = if upper > 0.0 {
                    rng.random_range(0.0..=upper)
                } else {
                    0.0
                };
                let f = fitness(position);
                evaluations += 1;
                Particle {
                    position,
                    velocity: 0.0,
                    best_position: position,
                    best_fitness: f,
                }
            })
            .collect();

        let (mut global_position, mut global_fitness) = swarm
            .iter()
            .map(|p| (p.best_position, p.best_fitness))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .expect("population is non-empty");

        for iter in 0..self.config.iterations {
            let progress = iter as f64 / self.config.iterations as f64;
            let inertia = self.config.inertia_start
                - (self.config.inertia_start - self.config.inertia_end) * progress;

            for particle in &mut swarm {
                let r1: f64 = rng.random_range(0.0..1.0);
                let r2: f64 = rng.random_range(0.0..1.0);
                particle.velocity = inertia * particle.velocity
                    + self.config.cognitive * r1 * (particle.best_position - particle.position)
                    + self.config.social * r2 * (global_position - particle.position);
                // Velocity bounded to the index range so one step can
                // never overshoot the whole domain.
                particle.velocity = particle.velocity.clamp(-upper.max(1.0), upper.max(1.0));
                particle.position = (particle.position + particle.velocity).clamp(0.0, upper);

                let f = fitness(particle.position);
                evaluations += 1;
                if f < particle.best_fitness {
                    particle.best_fitness = f;
                    particle.best_position = particle.position;
                }
                if f < global_fitness {
                    global_fitness = f;
                    global_position = particle.position;
                }
            }
        }

        let chosen = round_index(global_position, n);
        Some(Selection {
            node: nodes[chosen].id,
            score: global_fitness,
            evaluations,
        })
    }
}
