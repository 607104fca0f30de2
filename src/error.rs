//! Routing error types.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced to the caller of a routing request.
///
/// No variant is fatal to the process; each request's error is isolated
/// to that request.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Unknown endpoint class. Rejected before any registry mutation.
    #[error("invalid request: unknown endpoint class {0:?}")]
    UnknownEndpoint(String),

    /// Unknown strategy name. Rejected before any registry mutation.
    #[error("invalid request: unknown strategy {0:?}")]
    UnknownStrategy(String),

    /// Commit or reconcile referenced a node id the registry does not hold.
    #[error("unknown node id: {0}")]
    UnknownNode(crate::registry::NodeId),

    /// Every node was excluded as degenerate (non-positive capacity),
    /// leaving the strategy nothing to choose from.
    #[error("no eligible nodes to select from")]
    NoEligibleNodes,

    /// The chosen node failed to execute the task. The tentative commit
    /// stays in place; retry policy belongs to the transport collaborator.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
}

impl RouteError {
    /// Whether this error was a rejection of the request itself, before
    /// any selection or commit happened.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            RouteError::UnknownEndpoint(_) | RouteError::UnknownStrategy(_)
        )
    }
}

/// Failures of the outbound call to a compute node.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The node could not be reached at all.
    #[error("node unreachable: {0}")]
    Unreachable(String),

    /// The call exceeded the transport's deadline.
    #[error("node call timed out after {0:?}")]
    Timeout(Duration),

    /// The node answered, but the response carried none of the fields
    /// needed for load reconciliation.
    #[error("malformed node response: {0}")]
    Malformed(String),
}

pub type RouteResult<T> = Result<T, RouteError>;
