//! Table assembly.
//!
//! Each configured file is read, decoded, filtered and sampled exactly once.
//! The outcome is a [`TableDescriptor`] whose resolver replays the filtered
//! result, or the error that stopped assembly.

mod resolver;

pub use resolver::{Resolver, ResultSink, SnapshotResolver};

use arrow_schema::SchemaRef;
use indexmap::IndexMap;
use snafu::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use drift_core::emit;
use drift_core::metrics::events::RecordsDecoded;

use crate::config::FileSourceSpec;
use crate::error::{DecodeSnafu, QuerySnafu, SourceSnafu, TableError, TaskJoinSnafu};
use crate::query::{self, FilteredResult};
use crate::schema::{self, InferredColumn, Projection};
use crate::source::{SourceReader, decoder_for};

/// A registered table: its name, ordered columns and resolver.
#[derive(Debug, Clone)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<InferredColumn>,
    /// Index hints from the configuration, passed through to the host.
    pub indexes: IndexMap<String, bool>,
    resolver: Arc<dyn Resolver>,
    error: Option<Arc<TableError>>,
}

impl TableDescriptor {
    pub fn new(spec: &FileSourceSpec, columns: Vec<InferredColumn>, result: FilteredResult) -> Self {
        Self {
            name: spec.table.clone(),
            columns,
            indexes: spec.indexes.clone(),
            resolver: Arc::new(SnapshotResolver::new(&spec.table, Arc::new(result))),
            error: None,
        }
    }

    /// A zero-column table whose resolver always fails with `error`.
    pub fn failed(spec: &FileSourceSpec, error: TableError) -> Self {
        let error = Arc::new(error);
        Self {
            name: spec.table.clone(),
            columns: Vec::new(),
            indexes: spec.indexes.clone(),
            resolver: Arc::new(SnapshotResolver::failed(&spec.table, Arc::clone(&error))),
            error: Some(error),
        }
    }

    pub fn resolver(&self) -> &Arc<dyn Resolver> {
        &self.resolver
    }

    /// The assembly error, for tables registered after a failure.
    pub fn error(&self) -> Option<&TableError> {
        self.error.as_deref()
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn arrow_schema(&self) -> SchemaRef {
        schema::arrow_schema(&self.columns)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Read, decode, filter and infer the table for `spec`.
pub async fn assemble(
    spec: &FileSourceSpec,
    reader: &SourceReader,
) -> Result<TableDescriptor, TableError> {
    let table = spec.table.as_str();
    let start = Instant::now();

    let mut source = reader
        .open_blocking(&spec.path, table)
        .await
        .context(SourceSnafu { table })?;

    let decoder = decoder_for(spec);
    let location = spec.path.clone();
    let query = spec.query().map(str::to_string);
    let projection = Projection::from_spec(spec);
    let owned_table = table.to_string();

    // Decoding pulls from the source stream, and querying is CPU-bound
    let (result, columns) = tokio::task::spawn_blocking(move || {
        let table = owned_table.as_str();
        let decoded = decoder.decode(&mut source, &location);
        drop(source);
        let document = decoded.context(DecodeSnafu { table })?;

        emit!(RecordsDecoded {
            count: document.len() as u64,
            target: table.to_string(),
        });

        let result = query::apply(document.into_value(), query.as_deref())
            .context(QuerySnafu { table })?;
        let columns = schema::build(&result, &projection, table);

        Ok::<_, TableError>((result, columns))
    })
    .await
    .context(TaskJoinSnafu { table })??;

    debug!(
        target = %table,
        "Assembled {} column(s) over {} record(s) in {:?}",
        columns.len(),
        result.len(),
        start.elapsed()
    );

    Ok(TableDescriptor::new(spec, columns, result))
}
