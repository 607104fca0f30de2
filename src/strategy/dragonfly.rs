//! Dragonfly swarm strategy, with Brownian and Lévy random-walk
//! variants.
//!
//! Positions live in `[0,1]^n` where `n` is the node count; dimension
//! `j` expresses how strongly the swarm wants the task on node `j`.
//! Fitness is the squared deviation of every node's projected
//! utilization from 1.0. Individuals combine separation, alignment and
//! cohesion within a linearly shrinking interaction radius with
//! attraction to the swarm's best position and repulsion from its
//! worst; an individual with no neighbors in radius takes a random-walk
//! step instead, Brownian or Lévy depending on the variant.

use super::{eligible, make_rng, scoring_size, Selection, SelectionStrategy};
use crate::levy;
use crate::registry::NodeSnapshot;
use rand::rngs::StdRng;
use rand::Rng;

/// Random-walk flavor used when an individual has no swarm neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomWalk {
    /// Gaussian-weighted Brownian step.
    Brownian,

    /// Heavy-tailed Lévy step (Mantegna, index 1.5).
    Levy,
}

/// Configuration for [`Dragonfly`]. Swarm weights are the standard
/// dragonfly-algorithm values; inertia decays linearly over the run.
#[derive(Debug, Clone)]
pub struct DragonflyConfig {
    pub population: usize,
    pub iterations: usize,

    /// Separation weight.
    pub separation: f64,

    /// Alignment weight.
    pub alignment: f64,

    /// Cohesion weight.
    pub cohesion: f64,

    /// Attraction weight toward the best position.
    pub food: f64,

    /// Repulsion weight away from the worst position.
    pub enemy: f64,

    /// Inertia at the first and last iteration.
    pub inertia_start: f64,
    pub inertia_end: f64,

    /// Scale of random-walk steps.
    pub walk_scale: f64,

    /// Lévy index for the heavy-tailed variant.
    pub levy_beta: f64,

    pub walk: RandomWalk,
    pub seed: Option<u64>,
}

impl DragonflyConfig {
    pub fn new(walk: RandomWalk) -> Self {
        Self {
            population: 20,
            iterations: 100,
            separation: 0.1,
            alignment: 0.1,
            cohesion: 0.7,
            food: 1.0,
            enemy: 1.0,
            inertia_start: 0.9,
            inertia_end: 0.4,
            walk_scale: 0.1,
            levy_beta: 1.5,
            walk,
            seed: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.population == 0 || self.iterations == 0 {
            return Err("population and iterations must be at least 1".into());
        }
        if self.inertia_start < self.inertia_end {
            return Err("inertia must not grow over the run".into());
        }
        if !(1.0..2.0).contains(&self.levy_beta) {
            return Err(format!("levy_beta must be in [1, 2), got {}", self.levy_beta));
        }
        Ok(())
    }
}

struct Individual {
    position: Vec<f64>,
    velocity: Vec<f64>,
    fitness: f64,
}

/// Swarm-family strategy (`da` / `dalevy`).
#[derive(Debug)]
pub struct Dragonfly {
    config: DragonflyConfig,
}

impl Dragonfly {
    pub fn new(walk: RandomWalk) -> Self {
        Self {
            config: DragonflyConfig::new(walk),
        }
    }

    /// # Panics
    /// Panics if the configuration is invalid.
    pub fn with_config(config: DragonflyConfig) -> Self {
        config.validate().expect("invalid DragonflyConfig");
        Self { config }
    }

    /// Σ over nodes of `(utilization_j − 1)²` after weighting the task
    /// by dimension `j` of the position.
    fn fitness(position: &[f64], nodes: &[NodeSnapshot], size: f64) -> f64 {
        position
            .iter()
            .zip(nodes)
            .map(|(&x, node)| {
                let utilization = (node.load + x * size) / node.capacity;
                (utilization - 1.0).powi(2)
            })
            .sum()
    }

    fn random_walk(&self, individual: &mut Individual, rng: &mut StdRng) {
        for (x, v) in individual.position.iter_mut().zip(&mut individual.velocity) {
            let step = match self.config.walk {
                RandomWalk::Brownian => levy::gaussian(rng),
                RandomWalk::Levy => levy::levy_step(rng, self.config.levy_beta),
            };
            *x = (*x + self.config.walk_scale * step).clamp(0.0, 1.0);
            *v = 0.0;
        }
    }
}

impl SelectionStrategy for Dragonfly {
    fn name(&self) -> &'static str {
        match self.config.walk {
            RandomWalk::Brownian => "da",
            RandomWalk::Levy => "dalevy",
        }
    }

    fn select(&self, nodes: &[NodeSnapshot], task_size: f64) -> Option<Selection> {
        let nodes = eligible(nodes);
        if nodes.is_empty() {
            return None;
        }
        let size = scoring_size(task_size);
        let dim = nodes.len();
        let mut rng = make_rng(self.config.seed);
        let mut evaluations = 0usize;

        let mut swarm: Vec<Individual> = (0..self.config.population)
            .map(|_| {
                let position: Vec<f64> = (0..dim).map(|_| rng.random_range(0.0..1.0)).collect();
                let fitness = Self::fitness(&position, &nodes, size);
                evaluations += 1;
                Individual {
                    position,
                    velocity: vec![0.0; dim],
                    fitness,
                }
            })
            .collect();

        // Food = best position seen anywhere, enemy = worst of the
        // current swarm.
        let mut food = swarm[0].position.clone();
        let mut food_fitness = swarm[0].fitness;
        for ind in &swarm {
            if ind.fitness < food_fitness {
                food = ind.position.clone();
                food_fitness = ind.fitness;
            }
        }

        for iter in 0..self.config.iterations {
            let progress = iter as f64 / self.config.iterations as f64;
            let inertia = self.config.inertia_start
                - (self.config.inertia_start - self.config.inertia_end) * progress;
            // Interaction radius shrinks linearly; scaled by sqrt(dim)
            // so the neighborhood notion is dimension-independent.
            let radius = (dim as f64).sqrt() * (0.5 * (1.0 - progress) + 0.05);

            let enemy = swarm
                .iter()
                .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
                .map(|ind| ind.position.clone())
                .unwrap_or_else(|| food.clone());

            let positions: Vec<Vec<f64>> = swarm.iter().map(|i| i.position.clone()).collect();
            let velocities: Vec<Vec<f64>> = swarm.iter().map(|i| i.velocity.clone()).collect();

            for (i, individual) in swarm.iter_mut().enumerate() {
                let neighbors: Vec<usize> = (0..positions.len())
                    .filter(|&j| j != i)
                    .filter(|&j| euclidean(&positions[i], &positions[j]) <= radius)
                    .collect();

                if neighbors.is_empty() {
                    self.random_walk(individual, &mut rng);
                } else {
                    let count = neighbors.len() as f64;
                    for d in 0..dim {
                        let x = positions[i][d];
                        // Separation pushes away from crowded neighbors,
                        // alignment averages their velocities, cohesion
                        // pulls toward their center.
                        let mut separation = 0.0;
                        let mut alignment = 0.0;
                        let mut center = 0.0;
                        for &j in &neighbors {
                            separation -= positions[j][d] - x;
                            alignment += velocities[j][d];
                            center += positions[j][d];
                        }
                        alignment /= count;
                        let cohesion = center / count - x;
                        let food_pull = food[d] - x;
                        let enemy_push = x - enemy[d];

                        let v = inertia * individual.velocity[d]
                            + self.config.separation * separation
                            + self.config.alignment * alignment
                            + self.config.cohesion * cohesion
                            + self.config.food * food_pull
                            + self.config.enemy * enemy_push;
                        individual.velocity[d] = v.clamp(-1.0, 1.0);
                        individual.position[d] =
                            (individual.position[d] + individual.velocity[d]).clamp(0.0, 1.0);
                    }
                }

                individual.fitness = Self::fitness(&individual.position, &nodes, size);
                evaluations += 1;
                if individual.fitness < food_fitness {
                    food = individual.position.clone();
                    food_fitness = individual.fitness;
                }
            }
        }

        // Decode: among dimensions the swarm switched on (> 0.5), take
        // the node with the lowest projected utilization; if none are
        // on, fall back to a uniformly random node.
        let chosen = food
            .iter()
            .enumerate()
            .filter(|&(_, &x)| x > 0.5)
            .map(|(j, _)| j)
            .min_by(|&a, &b| {
                let ua = (nodes[a].load + size) / nodes[a].capacity;
                let ub = (nodes[b].load + size) / nodes[b].capacity;
                ua.total_cmp(&ub)
            })
            .unwrap_or_else(|| rng.random_range(0..nodes.len()));

        Some(Selection {
            node: nodes[chosen].id,
            score: food_fitness,
            evaluations,
        })
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
