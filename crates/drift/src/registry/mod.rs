//! Table registration for the host.
//!
//! [`FileClient`] is the handle the host passes to registration. It owns the
//! validated file list, the registration settings and the source reader.
//! [`dynamic_tables`] assembles every file and applies the failure policy.

use futures::StreamExt;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use drift_core::emit;
use drift_core::metrics::events::{FailureStage, TableFailed, TableRegistered};

use crate::config::{Config, FileSourceSpec, GlobalSettings, OnTableError};
use crate::error::{DecodeError, RegistrationError, TableError};
use crate::source::SourceReader;
use crate::table::{self, TableDescriptor};

/// Client handle for one configured set of files.
#[derive(Debug, Clone)]
pub struct FileClient {
    id: String,
    files: Vec<FileSourceSpec>,
    settings: GlobalSettings,
    reader: SourceReader,
}

impl FileClient {
    pub fn new(
        id: impl Into<String>,
        files: Vec<FileSourceSpec>,
        settings: GlobalSettings,
        reader: SourceReader,
    ) -> Self {
        Self {
            id: id.into(),
            files,
            settings,
            reader,
        }
    }

    /// Build a client from a loaded configuration.
    pub fn from_config(id: impl Into<String>, config: Config) -> Self {
        let reader = SourceReader::new(config.storage);
        Self::new(id, config.files, config.global, reader)
    }

    /// Identifier the host uses in its own logs.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn files(&self) -> &[FileSourceSpec] {
        &self.files
    }

    pub fn settings(&self) -> &GlobalSettings {
        &self.settings
    }

    pub fn reader(&self) -> &SourceReader {
        &self.reader
    }

    /// Assemble every file, returning one result per file in configuration
    /// order. At most `concurrency` files are in flight at once.
    pub async fn assemble_all(&self) -> Vec<Result<TableDescriptor, TableError>> {
        let concurrency = self.settings.concurrency_for(self.files.len());

        futures::stream::iter(&self.files)
            .map(|spec| self.assemble_one(spec))
            .buffered(concurrency)
            .collect()
            .await
    }

    async fn assemble_one(&self, spec: &FileSourceSpec) -> Result<TableDescriptor, TableError> {
        let start = Instant::now();
        let result = table::assemble(spec, &self.reader).await;

        match &result {
            Ok(table) => {
                info!(
                    target = %table.name,
                    "Registered table with columns {:?}",
                    table.column_names()
                );
                emit!(TableRegistered {
                    columns: table.columns.len(),
                    duration: start.elapsed(),
                    target: table.name.clone(),
                });
            }
            Err(e) => {
                warn!(
                    target = %spec.table,
                    kind = e.kind().as_str(),
                    permanent = e.is_permanent(),
                    "Failed to assemble table: {e}"
                );
                emit!(TableFailed {
                    stage: failure_stage(e),
                    target: spec.table.clone(),
                });
            }
        }

        result
    }
}

fn failure_stage(error: &TableError) -> FailureStage {
    match error {
        TableError::Source { .. }
        | TableError::Decode {
            source: DecodeError::Read { .. },
            ..
        } => FailureStage::Read,
        TableError::Decode { .. } | TableError::TaskJoin { .. } => FailureStage::Decode,
        TableError::Query { .. } => FailureStage::Query,
    }
}

/// Registration hook: the tables for every file the client was configured
/// with, in configuration order.
///
/// Failed files are registered as zero-column tables whose resolver reports
/// the failure, unless `on_table_error` is `abort`, in which case the first
/// failure in configuration order is returned.
pub async fn dynamic_tables(
    client: &FileClient,
    cancel: &CancellationToken,
) -> Result<Vec<TableDescriptor>, RegistrationError> {
    info!(
        "Registering {} table(s) for client {}",
        client.files.len(),
        client.id
    );

    let results = tokio::select! {
        biased;

        _ = cancel.cancelled() => {
            warn!("Table registration for client {} cancelled", client.id);
            return Err(RegistrationError::Cancelled);
        }
        results = client.assemble_all() => results,
    };

    let mut tables = Vec::with_capacity(results.len());
    let mut failed = 0usize;

    for (spec, result) in client.files.iter().zip(results) {
        match result {
            Ok(table) => tables.push(table),
            Err(source) => match client.settings.on_table_error() {
                OnTableError::Abort => return Err(RegistrationError::Table { source }),
                OnTableError::Isolate => {
                    failed += 1;
                    tables.push(TableDescriptor::failed(spec, source));
                }
            },
        }
    }

    if failed > 0 {
        warn!(
            "Registered {} table(s) for client {}, {failed} failed",
            tables.len(),
            client.id
        );
    } else {
        info!("Registered {} table(s) for client {}", tables.len(), client.id);
    }

    Ok(tables)
}
