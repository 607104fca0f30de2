//! Criterion benchmarks for the selection strategies.
//!
//! Measures pure decision overhead per strategy on synthetic snapshots,
//! independent of any transport.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use metaroute::registry::{NodeRegistry, NodeSpec};
use metaroute::strategy::StrategyKind;

fn snapshot(nodes: usize) -> Vec<metaroute::NodeSnapshot> {
    let specs = (0..nodes)
        .map(|i| {
            NodeSpec::new(
                format!("http://10.0.0.{i}:3000"),
                if i % 2 == 0 { 500.0 } else { 1000.0 },
            )
        })
        .collect();
    let registry = NodeRegistry::new(specs).expect("valid specs");
    for (i, id) in registry.ids().enumerate() {
        registry.commit(id, (i as f64) * 750.0).expect("known node");
    }
    registry.snapshot()
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("select");
    for kind in StrategyKind::ALL {
        let strategy = kind.build();
        for nodes in [6, 32] {
            let snap = snapshot(nodes);
            group.bench_with_input(
                BenchmarkId::new(kind.name(), nodes),
                &snap,
                |b, snap| {
                    b.iter(|| {
                        let selection = strategy
                            .select(black_box(snap), black_box(4000.0))
                            .expect("eligible nodes");
                        black_box(selection.node)
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_strategies);
criterion_main!(benches);
