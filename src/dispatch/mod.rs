//! Dispatch boundary: request validation, commit, transport hand-off,
//! and reconciliation.
//!
//! The coordinator is the only component that mutates the registry. The
//! transport itself (HTTP client, timeouts, retries) is an external
//! collaborator behind the [`TaskExecutor`] trait.

mod audit;
mod coordinator;
mod transport;

pub use audit::{AuditRecord, AuditSink, JsonLinesAudit};
pub use coordinator::{DispatchCoordinator, RouteOutcome};
pub use transport::{
    probe_capacities, EndpointClass, TaskExecutor, TaskReport, DEFAULT_CAPACITY,
};
