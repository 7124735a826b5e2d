//! drift-core: shared plumbing for the drift table engine.
//!
//! - `storage/` - Location parsing and byte streams over S3, GCS, Azure and local disk
//! - `resource/` - Storage provider pool shared across tables
//! - `config/` - Multi-file config loading, environment variable interpolation, CLI paths
//! - `metrics/` - Internal events recorded through the `metrics` facade
//! - `error` - Storage and config error types
//! - `tracing` - Subscriber initialization

pub mod config;
pub mod error;
pub mod metrics;
pub mod resource;
pub mod storage;
pub mod tracing;

// Re-export commonly used items
pub use config::{CliArgs, ConfigPath, Mergeable, StorageConfig, load_from_paths};
pub use error::{ConfigError, StorageError};
pub use resource::{StoragePool, StoragePoolRef};
pub use storage::{BackendConfig, ByteStream, StorageProvider, StorageProviderRef};
pub use tracing::init_tracing;
