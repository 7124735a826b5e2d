//! Table resolvers.
//!
//! A resolver hands the host the rows of one table. Tables are materialized
//! once at registration, so resolvers replay a stored snapshot and never
//! touch the source again.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use drift_core::emit;
use drift_core::metrics::events::TableResolved;

use crate::error::{ResolveError, TableError};
use crate::query::FilteredResult;

/// Channel the host receives table results on.
pub type ResultSink = mpsc::Sender<Arc<FilteredResult>>;

/// Produces the rows of a table into a host-provided sink.
#[async_trait]
pub trait Resolver: Send + Sync + std::fmt::Debug {
    /// Send the table's result into `sink`.
    ///
    /// The whole result is delivered as a single message.
    async fn resolve(&self, sink: &ResultSink) -> Result<(), ResolveError>;
}

/// Replays the result captured when the table was assembled, or the error
/// that prevented assembly.
#[derive(Debug, Clone)]
pub struct SnapshotResolver {
    table: String,
    snapshot: Result<Arc<FilteredResult>, Arc<TableError>>,
}

impl SnapshotResolver {
    pub fn new(table: impl Into<String>, result: Arc<FilteredResult>) -> Self {
        Self {
            table: table.into(),
            snapshot: Ok(result),
        }
    }

    pub fn failed(table: impl Into<String>, error: Arc<TableError>) -> Self {
        Self {
            table: table.into(),
            snapshot: Err(error),
        }
    }
}

#[async_trait]
impl Resolver for SnapshotResolver {
    async fn resolve(&self, sink: &ResultSink) -> Result<(), ResolveError> {
        let result = match &self.snapshot {
            Ok(result) => Arc::clone(result),
            Err(error) => {
                emit!(TableResolved {
                    success: false,
                    target: self.table.clone(),
                });
                return Err(ResolveError::Assembly {
                    table: self.table.clone(),
                    source: Arc::clone(error),
                });
            }
        };

        let records = result.len();
        if sink.send(result).await.is_err() {
            emit!(TableResolved {
                success: false,
                target: self.table.clone(),
            });
            return Err(ResolveError::SinkClosed {
                table: self.table.clone(),
            });
        }

        debug!(target = %self.table, "Delivered {records} record(s)");
        emit!(TableResolved {
            success: true,
            target: self.table.clone(),
        });
        Ok(())
    }
}
