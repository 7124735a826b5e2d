//! drift: expose JSON and CSV files as typed tables.
//!
//! Each configured file is read from local disk or object storage, decoded,
//! narrowed with an optional JMESPath query, and sampled to infer a column
//! schema. The result is a table descriptor whose resolver replays the
//! filtered records.
//!
//! - `config/` - File specs, registration settings and validation
//! - `source/` - Source reader and JSON/CSV document decoders
//! - `query/` - JMESPath filtering
//! - `schema/` - Value classification, column types and projection
//! - `table/` - Table assembly and resolvers
//! - `registry/` - Client handle and the `dynamic_tables` registration hook

pub mod config;
pub mod error;
pub mod query;
pub mod registry;
pub mod schema;
pub mod source;
pub mod table;

// Re-export commonly used items
pub use config::{CliArgs, Config, FileSourceSpec, GlobalSettings, OnTableError, SourceFormat};
pub use drift_core::init_tracing;
pub use error::{
    ConfigError, DecodeError, ErrorKind, QueryError, RegistrationError, ResolveError, TableError,
};
pub use query::FilteredResult;
pub use registry::{FileClient, dynamic_tables};
pub use schema::{ColumnType, InferredColumn};
pub use table::{Resolver, TableDescriptor, assemble};
