//! Best-effort audit trail.
//!
//! One record per completed or failed request. Persisting a record must
//! never fail the request: sink errors are logged and swallowed.

use super::transport::EndpointClass;
use crate::registry::NodeId;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tracing::warn;

/// One request's audit entry.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub endpoint: EndpointClass,
    pub strategy: String,
    pub node: NodeId,
    pub node_addr: String,
    pub capacity: f64,

    /// Milliseconds spent deciding (snapshot + strategy + rebalancer).
    pub decision_wait_ms: u64,

    /// Milliseconds the transport call took; absent when it never
    /// completed.
    pub execution_ms: Option<u64>,

    /// Unix-epoch milliseconds when the request finished.
    pub finish_ms: u64,

    /// The node's realized load; absent on transport failure.
    pub realized_load: Option<f64>,

    /// Cluster health signal at completion time.
    pub imbalanced: bool,

    /// `"ok"` or the surfaced error message.
    pub outcome: String,
}

/// Append-only audit destination.
pub trait AuditSink: Send + Sync {
    /// Persists one record, best-effort.
    fn record(&self, record: &AuditRecord);
}

/// JSON-lines file sink: one serialized record per line.
pub struct JsonLinesAudit {
    file: Mutex<File>,
}

impl JsonLinesAudit {
    /// Opens (or creates) the log file in append mode.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for JsonLinesAudit {
    fn record(&self, record: &AuditRecord) {
        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(err) => {
                warn!(%err, "audit record serialization failed");
                return;
            }
        };
        let mut file = match self.file.lock() {
            Ok(file) => file,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(err) = writeln!(file, "{line}") {
            warn!(%err, "audit append failed");
        }
    }
}
