//! Decision + commit orchestration.
//!
//! One coordinator serves many concurrent requests against the shared
//! registry. Strategy execution runs on an immutable snapshot and is
//! fully parallel; only the final commit serializes (per node, inside
//! the registry).

use super::audit::{AuditRecord, AuditSink};
use super::transport::{EndpointClass, TaskExecutor};
use crate::error::{RouteError, RouteResult};
use crate::rebalance::Rebalancer;
use crate::registry::{NodeId, NodeRegistry, NodeSnapshot};
use crate::stats;
use crate::strategy::{SelectionStrategy, StrategyKind};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, error};

/// Result of a successfully routed request.
#[derive(Debug, Clone)]
pub struct RouteOutcome {
    pub endpoint: EndpointClass,
    pub strategy: StrategyKind,

    /// The node the task ran on.
    pub node: NodeId,
    pub node_addr: String,

    /// Pre-dispatch size estimate committed tentatively.
    pub estimated_size: f64,

    /// Realized load the registry was reconciled with.
    pub realized_load: f64,

    /// Whether the rebalancer overrode the strategy's choice.
    pub rebalanced: bool,

    /// Cluster health signal after reconciliation.
    pub imbalanced: bool,

    pub decision_time: Duration,
    pub execution_time: Duration,
}

/// External-facing orchestrator: validates the request, runs the named
/// strategy, commits the tentative load, invokes the transport, and
/// reconciles the registry with the node's reported realized load.
pub struct DispatchCoordinator<E: TaskExecutor> {
    registry: Arc<NodeRegistry>,
    executor: E,
    rebalancer: Rebalancer,
    strategies: HashMap<StrategyKind, Box<dyn SelectionStrategy>>,
    audit: Option<Box<dyn AuditSink>>,
}

impl<E: TaskExecutor> DispatchCoordinator<E> {
    /// Builds a coordinator carrying every known strategy with its
    /// default configuration.
    pub fn new(registry: Arc<NodeRegistry>, executor: E) -> Self {
        let strategies = StrategyKind::ALL
            .into_iter()
            .map(|kind| (kind, kind.build()))
            .collect();
        Self {
            registry,
            executor,
            rebalancer: Rebalancer::default(),
            strategies,
            audit: None,
        }
    }

    pub fn with_rebalancer(mut self, rebalancer: Rebalancer) -> Self {
        self.rebalancer = rebalancer;
        self
    }

    pub fn with_audit(mut self, sink: Box<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Replaces one strategy instance, e.g. with a custom config.
    pub fn with_strategy(mut self, kind: StrategyKind, strategy: Box<dyn SelectionStrategy>) -> Self {
        self.strategies.insert(kind, strategy);
        self
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    /// Routes one request: validate, select, rebalance, commit,
    /// execute, reconcile.
    ///
    /// On transport failure the tentative commit is left in place (a
    /// wholesale rollback would oscillate under bursts) and the error
    /// is surfaced; the eventual drift is absorbed by later
    /// reconciliations.
    pub fn route(&self, endpoint: &str, strategy: &str) -> RouteResult<RouteOutcome> {
        // Whitelist validation happens before any registry access.
        let endpoint: EndpointClass = endpoint.parse()?;
        let kind: StrategyKind = strategy.parse()?;

        let decision_started = Instant::now();
        let estimate = estimate_size(endpoint);
        let snapshot = self.registry.snapshot();

        let strategy_impl = self
            .strategies
            .get(&kind)
            .expect("all StrategyKind variants are registered");
        let selection = strategy_impl
            .select(&snapshot, estimate)
            .ok_or(RouteError::NoEligibleNodes)?;
        let reviewed = self.rebalancer.review(&snapshot, selection.node, estimate);
        let decision_time = decision_started.elapsed();

        debug!(
            %endpoint,
            strategy = %kind,
            node = %reviewed.node,
            estimate,
            score = selection.score,
            evaluations = selection.evaluations,
            rebalanced = reviewed.overridden,
            "routing decision"
        );

        self.registry.commit(reviewed.node, estimate)?;
        let node_addr = self.registry.addr(reviewed.node)?.to_string();
        let capacity = capacity_of(&snapshot, reviewed.node);

        let execution_started = Instant::now();
        let realized = match self
            .executor
            .execute(&node_addr, endpoint)
            .and_then(|report| report.realized_load(capacity))
        {
            Ok(realized) => realized,
            Err(err) => {
                error!(node = %reviewed.node, addr = %node_addr, %err, "task execution failed");
                let err = RouteError::Transport(err);
                self.emit_audit(
                    endpoint,
                    kind,
                    reviewed.node,
                    &node_addr,
                    capacity,
                    decision_time,
                    None,
                    None,
                    err.to_string(),
                );
                return Err(err);
            }
        };
        let execution_time = execution_started.elapsed();

        self.registry
            .reconcile(reviewed.node, estimate, realized)?;
        let imbalanced = stats::is_imbalanced(
            &self.registry.snapshot(),
            stats::DEFAULT_IMBALANCE_THRESHOLD,
        );

        self.emit_audit(
            endpoint,
            kind,
            reviewed.node,
            &node_addr,
            capacity,
            decision_time,
            Some(execution_time),
            Some(realized),
            "ok".to_string(),
        );

        Ok(RouteOutcome {
            endpoint,
            strategy: kind,
            node: reviewed.node,
            node_addr,
            estimated_size: estimate,
            realized_load: realized,
            rebalanced: reviewed.overridden,
            imbalanced,
            decision_time,
            execution_time,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_audit(
        &self,
        endpoint: EndpointClass,
        strategy: StrategyKind,
        node: NodeId,
        node_addr: &str,
        capacity: f64,
        decision_time: Duration,
        execution_time: Option<Duration>,
        realized_load: Option<f64>,
        outcome: String,
    ) {
        let Some(sink) = &self.audit else {
            return;
        };
        let imbalanced = stats::is_imbalanced(
            &self.registry.snapshot(),
            stats::DEFAULT_IMBALANCE_THRESHOLD,
        );
        sink.record(&AuditRecord {
            endpoint,
            strategy: strategy.name().to_string(),
            node,
            node_addr: node_addr.to_string(),
            capacity,
            decision_wait_ms: decision_time.as_millis() as u64,
            execution_ms: execution_time.map(|t| t.as_millis() as u64),
            finish_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|t| t.as_millis() as u64)
                .unwrap_or(0),
            realized_load,
            imbalanced,
            outcome,
        });
    }
}

/// Pre-dispatch size estimate: the endpoint class's base load plus a
/// uniform jitter, matching the workload model the compute nodes run.
fn estimate_size(endpoint: EndpointClass) -> f64 {
    endpoint.base_load() + rand::rng().random_range(0.0..2000.0)
}

fn capacity_of(snapshot: &[NodeSnapshot], node: NodeId) -> f64 {
    snapshot
        .iter()
        .find(|n| n.id == node)
        .map(|n| n.capacity)
        .unwrap_or(super::transport::DEFAULT_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::transport::TaskReport;
    use crate::error::TransportError;
    use crate::registry::NodeSpec;
    use std::sync::Mutex;

    /// Scripted executor: answers every execution the same way.
    enum Script {
        Report(TaskReport),
        Fail(fn() -> TransportError),
    }

    struct MockExecutor {
        script: Script,
        calls: Mutex<Vec<(String, EndpointClass)>>,
    }

    impl MockExecutor {
        fn reporting(report: TaskReport) -> Self {
            Self {
                script: Script::Report(report),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(make: fn() -> TransportError) -> Self {
            Self {
                script: Script::Fail(make),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl TaskExecutor for MockExecutor {
        fn execute(
            &self,
            addr: &str,
            endpoint: EndpointClass,
        ) -> Result<TaskReport, TransportError> {
            self.calls
                .lock()
                .unwrap()
                .push((addr.to_string(), endpoint));
            match &self.script {
                Script::Report(report) => Ok(report.clone()),
                Script::Fail(make) => Err(make()),
            }
        }

        fn probe_capacity(&self, _: &str) -> Result<f64, TransportError> {
            Ok(1000.0)
        }
    }

    fn six_node_registry() -> Arc<NodeRegistry> {
        let specs = [500.0, 1000.0, 500.0, 1000.0, 500.0, 1000.0]
            .iter()
            .enumerate()
            .map(|(i, &c)| NodeSpec::new(format!("http://192.168.56.1{}:3100{i}", i / 2 + 1), c))
            .collect();
        Arc::new(NodeRegistry::new(specs).unwrap())
    }

    #[test]
    fn test_route_sahsh_commits_realized_load() {
        let registry = six_node_registry();
        let executor = MockExecutor::reporting(TaskReport {
            load: Some(4000.0),
            execution_time: None,
        });
        let coordinator = DispatchCoordinator::new(Arc::clone(&registry), executor);

        let outcome = coordinator.route("c", "sahsh").expect("routed");
        assert_eq!(outcome.strategy, StrategyKind::HybridSaHs);
        assert_eq!(outcome.realized_load, 4000.0);

        // Reconciliation replaced the estimate with the realized load;
        // every other node stayed untouched.
        for node in registry.snapshot() {
            if node.id == outcome.node {
                assert!((node.load - 4000.0).abs() < 1e-9);
            } else {
                assert_eq!(node.load, 0.0);
            }
        }
    }

    #[test]
    fn test_invalid_endpoint_rejected_without_mutation() {
        let registry = six_node_registry();
        let executor = MockExecutor::reporting(TaskReport::default());
        let coordinator = DispatchCoordinator::new(Arc::clone(&registry), executor);

        let err = coordinator.route("z", "sahsh").unwrap_err();
        assert!(err.is_invalid_request());
        assert!(registry.snapshot().iter().all(|n| n.load == 0.0));
        assert!(coordinator.executor.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_strategy_rejected_without_mutation() {
        let registry = six_node_registry();
        let executor = MockExecutor::reporting(TaskReport::default());
        let coordinator = DispatchCoordinator::new(Arc::clone(&registry), executor);

        let err = coordinator.route("a", "steepest-descent").unwrap_err();
        assert!(err.is_invalid_request());
        assert!(registry.snapshot().iter().all(|n| n.load == 0.0));
    }

    #[test]
    fn test_transport_failure_keeps_tentative_commit() {
        let registry = six_node_registry();
        let executor =
            MockExecutor::failing(|| TransportError::Unreachable("node went away".into()));
        let coordinator = DispatchCoordinator::new(Arc::clone(&registry), executor);

        let err = coordinator.route("a", "rr").unwrap_err();
        assert!(matches!(err, RouteError::Transport(_)));

        // The estimate stays committed: exactly one node carries load
        // in the endpoint's estimate range.
        let loaded: Vec<_> = registry
            .snapshot()
            .into_iter()
            .filter(|n| n.load > 0.0)
            .collect();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].load >= 2000.0 && loaded[0].load < 4000.0);
    }

    #[test]
    fn test_malformed_response_is_transport_failure() {
        let registry = six_node_registry();
        // Neither load nor execution time in the response.
        let executor = MockExecutor::reporting(TaskReport::default());
        let coordinator = DispatchCoordinator::new(Arc::clone(&registry), executor);

        let err = coordinator.route("b", "rr").unwrap_err();
        assert!(matches!(
            err,
            RouteError::Transport(TransportError::Malformed(_))
        ));
        // Tentative commit retained, as for any transport failure.
        assert_eq!(
            registry.snapshot().iter().filter(|n| n.load > 0.0).count(),
            1
        );
    }

    #[test]
    fn test_time_fallback_reconciliation() {
        let registry = six_node_registry();
        let executor = MockExecutor::reporting(TaskReport {
            load: None,
            execution_time: Some(Duration::from_secs(4)),
        });
        let coordinator = DispatchCoordinator::new(Arc::clone(&registry), executor);

        let outcome = coordinator.route("a", "rr").expect("routed");
        // Degraded estimate: 4s × capacity of the chosen node.
        let expected = 4.0 * capacity_of(&registry.snapshot(), outcome.node);
        assert!((outcome.realized_load - expected).abs() < 1e-9);
    }

    #[test]
    fn test_every_strategy_routes_end_to_end() {
        for kind in StrategyKind::ALL {
            let registry = six_node_registry();
            let executor = MockExecutor::reporting(TaskReport {
                load: Some(1234.0),
                execution_time: None,
            });
            let coordinator = DispatchCoordinator::new(Arc::clone(&registry), executor);
            let outcome = coordinator.route("d", kind.name()).expect("routed");
            assert_eq!(outcome.strategy, kind);
            let total: f64 = registry.snapshot().iter().map(|n| n.load).sum();
            assert!((total - 1234.0).abs() < 1e-9, "{kind}: total {total}");
        }
    }

    struct CountingSink {
        records: Mutex<Vec<AuditRecord>>,
    }

    impl AuditSink for CountingSink {
        fn record(&self, record: &AuditRecord) {
            self.records.lock().unwrap().push(record.clone());
        }
    }

    #[test]
    fn test_audit_emitted_on_success_and_failure() {
        let registry = six_node_registry();
        let executor = MockExecutor::reporting(TaskReport {
            load: Some(100.0),
            execution_time: None,
        });
        let sink = Arc::new(CountingSink {
            records: Mutex::new(Vec::new()),
        });

        struct SharedSink(Arc<CountingSink>);
        impl AuditSink for SharedSink {
            fn record(&self, record: &AuditRecord) {
                self.0.record(record);
            }
        }

        let coordinator = DispatchCoordinator::new(Arc::clone(&registry), executor)
            .with_audit(Box::new(SharedSink(Arc::clone(&sink))));
        coordinator.route("a", "sa").expect("routed");

        let failing = DispatchCoordinator::new(
            registry,
            MockExecutor::failing(|| TransportError::Unreachable("gone".into())),
        )
        .with_audit(Box::new(SharedSink(Arc::clone(&sink))));
        let _ = failing.route("a", "sa").unwrap_err();

        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].outcome, "ok");
        assert_eq!(records[0].realized_load, Some(100.0));
        assert!(records[1].outcome.contains("unreachable"));
        assert_eq!(records[1].realized_load, None);
    }
}
