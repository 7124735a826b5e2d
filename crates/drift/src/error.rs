//! Error types for the drift table engine.

use snafu::prelude::*;
use std::sync::Arc;

// Re-export common errors
pub use drift_core::error::{ConfigError, StorageError};

/// Errors that can occur while decoding a document.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DecodeError {
    /// Malformed JSON document.
    #[snafu(display("Failed to decode JSON in {location}: {source}"))]
    Json {
        location: String,
        source: serde_json::Error,
    },

    /// Malformed CSV input.
    #[snafu(display("Failed to decode CSV in {location}: {source}"))]
    Csv {
        location: String,
        source: csv::Error,
    },

    /// The CSV header names the same column twice.
    #[snafu(display("Duplicate CSV header '{name}' in {location}"))]
    DuplicateHeader { location: String, name: String },

    /// A CSV row length differs from the header and the policy is reject.
    ///
    /// `line` is the 1-based line the row starts on.
    #[snafu(display(
        "CSV line {line} in {location} has {found} fields, header has {expected}"
    ))]
    FieldCount {
        location: String,
        line: u64,
        expected: usize,
        found: usize,
    },

    /// The source stream failed part way through decoding.
    #[snafu(display("Failed to read {location}: {message}"))]
    Read { location: String, message: String },
}

impl DecodeError {
    /// Classify a JSON error, splitting read failures from bad input.
    pub fn from_json(location: &str, source: serde_json::Error) -> Self {
        if source.is_io() {
            return DecodeError::Read {
                location: location.to_string(),
                message: source.to_string(),
            };
        }
        DecodeError::Json {
            location: location.to_string(),
            source,
        }
    }

    /// Classify a CSV error, splitting read failures from bad input.
    pub fn from_csv(location: &str, source: csv::Error) -> Self {
        if let csv::ErrorKind::Io(e) = source.kind() {
            return DecodeError::Read {
                location: location.to_string(),
                message: e.to_string(),
            };
        }
        DecodeError::Csv {
            location: location.to_string(),
            source,
        }
    }
}

/// Errors that can occur while applying a JMESPath query.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum QueryError {
    /// The expression does not parse.
    #[snafu(display("Invalid JMESPath expression '{expression}': {message}"))]
    InvalidExpression { expression: String, message: String },

    /// The expression failed at evaluation time.
    #[snafu(display("Failed to evaluate JMESPath expression '{expression}': {message}"))]
    Evaluation { expression: String, message: String },
}

/// Error taxonomy exposed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    SourceUnavailable,
    Decode,
    QueryEvaluation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::SourceUnavailable => "source_unavailable",
            ErrorKind::Decode => "decode",
            ErrorKind::QueryEvaluation => "query_evaluation",
        }
    }
}

/// Errors that fail the assembly of one table.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TableError {
    /// The source file could not be opened or read.
    #[snafu(display("Table '{table}': {source}"))]
    Source { table: String, source: StorageError },

    /// The source file could not be decoded.
    #[snafu(display("Table '{table}': {source}"))]
    Decode { table: String, source: DecodeError },

    /// The query could not be applied.
    #[snafu(display("Table '{table}': {source}"))]
    Query { table: String, source: QueryError },

    /// The blocking decode task panicked or was cancelled.
    #[snafu(display("Table '{table}': decode task failed: {source}"))]
    TaskJoin {
        table: String,
        source: tokio::task::JoinError,
    },
}

impl TableError {
    /// The table this error belongs to.
    pub fn table(&self) -> &str {
        match self {
            TableError::Source { table, .. }
            | TableError::Decode { table, .. }
            | TableError::Query { table, .. }
            | TableError::TaskJoin { table, .. } => table,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TableError::Source { .. }
            | TableError::Decode {
                source: DecodeError::Read { .. },
                ..
            } => ErrorKind::SourceUnavailable,
            TableError::Decode { .. } | TableError::TaskJoin { .. } => ErrorKind::Decode,
            TableError::Query { .. } => ErrorKind::QueryEvaluation,
        }
    }

    /// Whether retrying the same file is pointless.
    ///
    /// Storage failures defer to [`StorageError::is_permanent`]. A stream
    /// that broke mid-read may succeed on a later attempt; bad content and
    /// bad queries will not.
    pub fn is_permanent(&self) -> bool {
        match self {
            TableError::Source { source, .. } => source.is_permanent(),
            TableError::Decode {
                source: DecodeError::Read { .. },
                ..
            } => false,
            TableError::Decode { .. } | TableError::Query { .. } => true,
            TableError::TaskJoin { .. } => false,
        }
    }
}

impl From<&ConfigError> for ErrorKind {
    fn from(_: &ConfigError) -> Self {
        ErrorKind::Configuration
    }
}

/// Errors returned by a table resolver.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ResolveError {
    /// The table failed to assemble; the stored error is returned on every call.
    #[snafu(display("Table '{table}' is unavailable: {source}"))]
    Assembly {
        table: String,
        source: Arc<TableError>,
    },

    /// The receiving side of the sink was dropped.
    #[snafu(display("Result sink for table '{table}' is closed"))]
    SinkClosed { table: String },
}

impl ResolveError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ResolveError::Assembly { source, .. } => Some(source.kind()),
            ResolveError::SinkClosed { .. } => None,
        }
    }
}

/// Errors that fail table registration as a whole.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RegistrationError {
    /// A table failed and the policy is abort.
    #[snafu(display("Table registration aborted: {source}"))]
    Table { source: TableError },

    /// The host cancelled registration.
    #[snafu(display("Table registration cancelled"))]
    Cancelled,
}
