//! Metaheuristic task-routing engine.
//!
//! Routes incoming compute tasks to one of several backend nodes. The
//! decision engine is a shared node-load model plus a family of selection
//! strategies that consume it:
//!
//! - **Simulated Annealing (`sa`)**: single-candidate trajectory search
//!   with Metropolis acceptance and geometric cooling.
//! - **Harmony Search (`hs`)** and **Hybrid SA-HS (`sahsh`)**: fixed-size
//!   solution memory with pitch adjustment; the hybrid replaces entries
//!   through a cooling Metropolis criterion.
//! - **Dragonfly (`da`, `dalevy`)**: swarm of `[0,1]^n` positions with
//!   separation/alignment/cohesion terms and Brownian or Lévy random
//!   walks when the swarm disperses.
//! - **Particle Swarm (`pso`)**: scalar node-index particles with
//!   personal/global best attraction.
//! - **Flower Pollination (`fpa`)**: load-vector population mixing Lévy
//!   global pollination and local interpolation.
//! - **Ant Colony (`aco`)**: per-node pheromones with evaporation and
//!   best-of-generation reinforcement.
//! - **Genetic Algorithm (`ga`)**: generational search over node-index
//!   assignments, full replacement, no elitism.
//! - **Round Robin (`rr`)**: stateless-cost cyclic baseline.
//!
//! # Architecture
//!
//! [`registry::NodeRegistry`] owns all live node state; strategies only
//! ever see an immutable [`registry::NodeSnapshot`] view and run their
//! internal search against private copies. The
//! [`dispatch::DispatchCoordinator`] serializes decision + commit: it
//! snapshots the registry, runs the named strategy, lets the
//! [`rebalance::Rebalancer`] override the choice when it would worsen
//! global imbalance, commits the tentative load, hands the task to the
//! transport collaborator, and reconciles the registry with the node's
//! self-reported realized load.

pub mod dispatch;
pub mod error;
pub mod levy;
pub mod rebalance;
pub mod registry;
pub mod stats;
pub mod strategy;

pub use error::{RouteError, RouteResult, TransportError};
pub use registry::{NodeId, NodeRegistry, NodeSnapshot, NodeSpec};
pub use strategy::{SelectionStrategy, StrategyKind};
