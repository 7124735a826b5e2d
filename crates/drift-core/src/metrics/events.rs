//! Internal events for drift metrics emission.
//!
//! Per-table metrics carry a `target` label holding the table name.

use metrics::{counter, histogram};
use std::time::Duration;
use tracing::trace;

/// Trait for internal events that can be emitted as metrics.
pub trait InternalEvent {
    /// Emit this event as a metric.
    fn emit(self);
}

/// Event emitted when raw bytes are read from a source.
pub struct BytesRead {
    pub bytes: u64,
    pub target: String,
}

impl InternalEvent for BytesRead {
    fn emit(self) {
        trace!(bytes = self.bytes, target = %self.target, "Bytes read");
        counter!("drift_bytes_read_total", "target" => self.target).increment(self.bytes);
    }
}

/// Event emitted when top-level documents or rows are decoded.
pub struct RecordsDecoded {
    pub count: u64,
    pub target: String,
}

impl InternalEvent for RecordsDecoded {
    fn emit(self) {
        trace!(count = self.count, target = %self.target, "Records decoded");
        counter!("drift_records_decoded_total", "target" => self.target).increment(self.count);
    }
}

/// Stage at which table assembly failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Read,
    Decode,
    Query,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Read => "read",
            FailureStage::Decode => "decode",
            FailureStage::Query => "query",
        }
    }
}

/// Event emitted when a table is registered with its inferred columns.
pub struct TableRegistered {
    pub columns: usize,
    pub duration: Duration,
    pub target: String,
}

impl InternalEvent for TableRegistered {
    fn emit(self) {
        trace!(columns = self.columns, target = %self.target, "Table registered");
        counter!("drift_tables_registered_total", "target" => self.target.clone()).increment(1);
        histogram!("drift_table_assembly_duration_seconds", "target" => self.target)
            .record(self.duration.as_secs_f64());
    }
}

/// Event emitted when a table could not be assembled.
pub struct TableFailed {
    pub stage: FailureStage,
    pub target: String,
}

impl InternalEvent for TableFailed {
    fn emit(self) {
        trace!(stage = self.stage.as_str(), target = %self.target, "Table failed");
        counter!("drift_tables_failed_total", "stage" => self.stage.as_str(), "target" => self.target)
            .increment(1);
    }
}

/// Event emitted when a resolver delivers a table snapshot.
pub struct TableResolved {
    pub success: bool,
    pub target: String,
}

impl InternalEvent for TableResolved {
    fn emit(self) {
        let status = if self.success { "success" } else { "error" };
        trace!(status, target = %self.target, "Table resolved");
        counter!("drift_table_resolutions_total", "status" => status, "target" => self.target)
            .increment(1);
    }
}

/// Storage operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOperation {
    /// Opening a local file.
    Open,
    /// Fetching an object.
    Get,
}

/// Event emitted once per storage request, with its outcome and latency.
pub struct StorageRequest {
    pub operation: StorageOperation,
    pub success: bool,
    pub duration: Duration,
}

impl InternalEvent for StorageRequest {
    fn emit(self) {
        let operation = match self.operation {
            StorageOperation::Open => "open",
            StorageOperation::Get => "get",
        };
        let status = if self.success { "success" } else { "error" };

        trace!(operation, status, duration = ?self.duration, "Storage request");
        counter!("drift_storage_requests_total", "operation" => operation, "status" => status)
            .increment(1);
        histogram!("drift_storage_request_duration_seconds", "operation" => operation)
            .record(self.duration.as_secs_f64());
    }
}
