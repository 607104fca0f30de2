//! Transport collaborator contract.
//!
//! The decision engine never performs network I/O itself; the caller
//! supplies a [`TaskExecutor`] wrapping its HTTP client. The executor
//! is expected to bound every call with its own timeout.

use crate::error::{RouteError, TransportError};
use crate::registry::NodeSpec;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Capacity assumed for a node whose capability probe fails.
pub const DEFAULT_CAPACITY: f64 = 500.0;

/// The fixed set of task endpoint classes, ordered by base workload.
///
/// Opaque to the decision engine beyond the size estimate it derives;
/// the transport uses it to pick the handler on the compute node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointClass {
    A,
    B,
    C,
    D,
    E,
}

impl EndpointClass {
    pub const ALL: [EndpointClass; 5] = [
        EndpointClass::A,
        EndpointClass::B,
        EndpointClass::C,
        EndpointClass::D,
        EndpointClass::E,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EndpointClass::A => "a",
            EndpointClass::B => "b",
            EndpointClass::C => "c",
            EndpointClass::D => "d",
            EndpointClass::E => "e",
        }
    }

    /// Base work units of this class; the pre-dispatch size estimate
    /// adds a uniform 0..2000 jitter on top.
    pub fn base_load(self) -> f64 {
        match self {
            EndpointClass::A => 2000.0,
            EndpointClass::B => 3000.0,
            EndpointClass::C => 4000.0,
            EndpointClass::D => 5000.0,
            EndpointClass::E => 6000.0,
        }
    }
}

impl fmt::Display for EndpointClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EndpointClass {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        EndpointClass::ALL
            .into_iter()
            .find(|class| class.name() == lower)
            .ok_or_else(|| RouteError::UnknownEndpoint(s.to_string()))
    }
}

/// A compute node's response to an executed task.
#[derive(Debug, Clone, Default)]
pub struct TaskReport {
    /// The node's self-reported realized load, in the same work units
    /// as capacity·time. Authoritative when present.
    pub load: Option<f64>,

    /// Wall-clock execution time measured by the node, used only as a
    /// degraded fallback (`time × capacity`) when `load` is absent.
    pub execution_time: Option<Duration>,
}

impl TaskReport {
    /// Resolves the realized load for reconciliation.
    ///
    /// The self-report wins; the time-based estimate is degraded mode
    /// and logged as such. A report carrying neither is malformed.
    pub fn realized_load(&self, capacity: f64) -> Result<f64, TransportError> {
        match self.load {
            Some(load) if load.is_finite() && load >= 0.0 => Ok(load),
            _ => match self.execution_time {
                Some(time) => {
                    let estimate = time.as_secs_f64() * capacity;
                    warn!(
                        ?time,
                        capacity, estimate, "load self-report missing, using time-based estimate"
                    );
                    Ok(estimate)
                }
                None => Err(TransportError::Malformed(
                    "response carries neither load nor execution time".into(),
                )),
            },
        }
    }
}

/// Outbound interface to a compute node.
///
/// `execute` is the only suspension point of a routing request; the
/// implementation must bound it with a timeout and map timeouts and
/// connection failures to [`TransportError`].
pub trait TaskExecutor: Send + Sync {
    /// Runs a task of the given class on the node at `addr`.
    fn execute(&self, addr: &str, endpoint: EndpointClass) -> Result<TaskReport, TransportError>;

    /// Queries the node's benchmark capability figure.
    fn probe_capacity(&self, addr: &str) -> Result<f64, TransportError>;
}

/// Startup helper: probes each address once for its capacity, falling
/// back to [`DEFAULT_CAPACITY`] when a node is unreachable or reports a
/// degenerate figure.
pub fn probe_capacities<E: TaskExecutor>(addrs: &[String], executor: &E) -> Vec<NodeSpec> {
    addrs
        .iter()
        .map(|addr| {
            let capacity = match executor.probe_capacity(addr) {
                Ok(capacity) if capacity.is_finite() && capacity > 0.0 => capacity,
                Ok(capacity) => {
                    warn!(%addr, capacity, "degenerate capacity probe, using fallback");
                    DEFAULT_CAPACITY
                }
                Err(err) => {
                    warn!(%addr, %err, "capacity probe failed, using fallback");
                    DEFAULT_CAPACITY
                }
            };
            NodeSpec::new(addr.clone(), capacity)
        })
        .collect()
}
