//! Selection strategies: the pluggable decision engine.
//!
//! Every family implements [`SelectionStrategy`] against the same
//! immutable registry snapshot and the shared cost model in
//! [`crate::stats`]. Strategies are pure in their inputs plus internal
//! randomness: they simulate against private copies and never touch the
//! live registry. Committing the chosen load is the coordinator's job.
//!
//! # Families
//!
//! | name     | family        | type                                      |
//! |----------|---------------|-------------------------------------------|
//! | `rr`     | baseline      | [`round_robin::RoundRobin`]                |
//! | `sa`     | local search  | [`annealing::Annealing`]                   |
//! | `hs`     | memory        | [`harmony::HarmonySearch`]                 |
//! | `sahsh`  | memory        | [`harmony::HybridSaHs`]                    |
//! | `da`     | swarm         | [`dragonfly::Dragonfly`]                   |
//! | `dalevy` | swarm         | [`dragonfly::Dragonfly`] (Lévy walk)       |
//! | `pso`    | swarm         | [`pso::ParticleSwarm`]                     |
//! | `fpa`    | pollination   | [`flower::FlowerPollination`]              |
//! | `aco`    | pheromone     | [`aco::AntColony`]                         |
//! | `ga`     | evolutionary  | [`genetic::Genetic`]                       |

pub mod aco;
pub mod annealing;
pub mod dragonfly;
pub mod flower;
pub mod genetic;
pub mod harmony;
pub mod pso;
pub mod round_robin;

use crate::registry::{NodeId, NodeSnapshot};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::str::FromStr;

/// A strategy's answer: the chosen node plus run diagnostics.
#[derive(Debug, Clone)]
pub struct Selection {
    /// The chosen node. Always a member of the input snapshot.
    pub node: NodeId,

    /// The score the strategy minimized, evaluated at the chosen node.
    /// Families score differently (projected cost, utilization
    /// dispersion, load spread), so this is comparable within one
    /// strategy, not across strategies.
    pub score: f64,

    /// Candidate evaluations performed by the internal search.
    pub evaluations: usize,
}

/// Common contract for all selection strategies.
///
/// `select` must be a pure function of the snapshot, the task size, and
/// internal randomness, and must terminate within the strategy's own
/// iteration budget. Nodes with non-positive capacity are excluded
/// before scoring; `None` means no eligible node remained.
pub trait SelectionStrategy: Send + Sync {
    /// Short wire name of the strategy (`sa`, `rr`, ...).
    fn name(&self) -> &'static str;

    /// Picks a node for a task of the given estimated size.
    fn select(&self, nodes: &[NodeSnapshot], task_size: f64) -> Option<Selection>;
}

/// Enumerated whitelist of strategy names, used by request validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    RoundRobin,
    Annealing,
    Harmony,
    HybridSaHs,
    Dragonfly,
    DragonflyLevy,
    ParticleSwarm,
    FlowerPollination,
    AntColony,
    Genetic,
}

impl StrategyKind {
    /// All known strategies, in a stable order.
    pub const ALL: [StrategyKind; 10] = [
        StrategyKind::RoundRobin,
        StrategyKind::Annealing,
        StrategyKind::Harmony,
        StrategyKind::HybridSaHs,
        StrategyKind::Dragonfly,
        StrategyKind::DragonflyLevy,
        StrategyKind::ParticleSwarm,
        StrategyKind::FlowerPollination,
        StrategyKind::AntColony,
        StrategyKind::Genetic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::RoundRobin => "rr",
            StrategyKind::Annealing => "sa",
            StrategyKind::Harmony => "hs",
            StrategyKind::HybridSaHs => "sahsh",
            StrategyKind::Dragonfly => "da",
            StrategyKind::DragonflyLevy => "dalevy",
            StrategyKind::ParticleSwarm => "pso",
            StrategyKind::FlowerPollination => "fpa",
            StrategyKind::AntColony => "aco",
            StrategyKind::Genetic => "ga",
        }
    }

    /// Builds the strategy with its default configuration.
    pub fn build(self) -> Box<dyn SelectionStrategy> {
        match self {
            StrategyKind::RoundRobin => Box::new(round_robin::RoundRobin::new()),
            StrategyKind::Annealing => Box::new(annealing::Annealing::default()),
            StrategyKind::Harmony => Box::new(harmony::HarmonySearch::default()),
            StrategyKind::HybridSaHs => Box::new(harmony::HybridSaHs::default()),
            StrategyKind::Dragonfly => {
                Box::new(dragonfly::Dragonfly::new(dragonfly::RandomWalk::Brownian))
            }
            StrategyKind::DragonflyLevy => {
                Box::new(dragonfly::Dragonfly::new(dragonfly::RandomWalk::Levy))
            }
            StrategyKind::ParticleSwarm => Box::new(pso::ParticleSwarm::default()),
            StrategyKind::FlowerPollination => Box::new(flower::FlowerPollination::default()),
            StrategyKind::AntColony => Box::new(aco::AntColony::default()),
            StrategyKind::Genetic => Box::new(genetic::Genetic::default()),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = crate::error::RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.name() == lower)
            .ok_or_else(|| crate::error::RouteError::UnknownStrategy(s.to_string()))
    }
}

/// Filters out degenerate nodes so no strategy divides by a zero
/// capacity. The registry rejects such nodes at construction; this
/// guard also covers snapshots assembled by hand.
pub(crate) fn eligible(nodes: &[NodeSnapshot]) -> Vec<NodeSnapshot> {
    nodes
        .iter()
        .filter(|n| n.capacity.is_finite() && n.capacity > 0.0)
        .cloned()
        .collect()
}

/// Clamps a degenerate task size to zero for scoring purposes.
pub(crate) fn scoring_size(task_size: f64) -> f64 {
    if task_size.is_finite() && task_size > 0.0 {
        task_size
    } else {
        0.0
    }
}

/// Seeded RNG when reproducibility is requested, entropy otherwise.
pub(crate) fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::seed_from_u64(rand::random()),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use testutil::{cluster, one_empty};

    #[test]
    fn test_kind_round_trip() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.name().parse::<StrategyKind>().unwrap(), kind);
        }
        assert_eq!("SAHSH".parse::<StrategyKind>().unwrap(), StrategyKind::HybridSaHs);
        assert!("annealed".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_every_strategy_returns_member_of_input() {
        let nodes = cluster(&[(500.0, 100.0), (1000.0, 2500.0), (750.0, 0.0)]);
        for kind in StrategyKind::ALL {
            let strategy = kind.build();
            for _ in 0..20 {
                let sel = strategy
                    .select(&nodes, 3000.0)
                    .unwrap_or_else(|| panic!("{kind} returned no selection"));
                assert!(
                    nodes.iter().any(|n| n.id == sel.node),
                    "{kind} chose {} outside the snapshot",
                    sel.node
                );
            }
        }
    }

    #[test]
    fn test_every_strategy_handles_single_node() {
        let nodes = cluster(&[(500.0, 42.0)]);
        for kind in StrategyKind::ALL {
            let sel = kind.build().select(&nodes, 1000.0).unwrap();
            assert_eq!(sel.node, nodes[0].id, "{kind}");
        }
    }

    #[test]
    fn test_degenerate_nodes_excluded() {
        // Zero- and negative-capacity nodes must never be chosen.
        let nodes = cluster(&[(0.0, 0.0), (1000.0, 0.0), (-5.0, 0.0)]);
        for kind in StrategyKind::ALL {
            let strategy = kind.build();
            for _ in 0..10 {
                let sel = strategy.select(&nodes, 2000.0).unwrap();
                assert_eq!(sel.node, nodes[1].id, "{kind}");
            }
        }
    }

    #[test]
    fn test_all_degenerate_yields_none() {
        let nodes = cluster(&[(0.0, 0.0), (-1.0, 0.0)]);
        for kind in StrategyKind::ALL {
            assert!(kind.build().select(&nodes, 2000.0).is_none(), "{kind}");
        }
    }

    #[test]
    fn test_stochastic_strategies_prefer_empty_node() {
        // One empty node in an otherwise saturated cluster: at least
        // 90% of 200 trials must pick it. Round-robin is the control
        // and exempt, it never looks at load.
        let nodes = one_empty(5, 2);
        for kind in StrategyKind::ALL {
            if kind == StrategyKind::RoundRobin {
                continue;
            }
            let strategy = kind.build();
            let hits = (0..200)
                .filter(|_| {
                    strategy
                        .select(&nodes, 500.0)
                        .expect("selection")
                        .node
                        .index()
                        == 2
                })
                .count();
            assert!(hits >= 180, "{kind} picked the empty node {hits}/200 times");
        }
    }
}
