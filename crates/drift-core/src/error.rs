//! Common error types shared by the drift crates.
//!
//! Storage errors cover location parsing and reads from local disk or object
//! storage. Config errors cover loading, interpolation and validation.

use snafu::prelude::*;

// ============ Storage Errors ============

/// Errors that can occur during storage operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StorageError {
    /// Invalid storage URL format.
    #[snafu(display("Invalid storage URL: {url}"))]
    InvalidUrl { url: String },

    /// Object-store URL without an object key.
    #[snafu(display("Storage URL has no object key: {url}"))]
    MissingKey { url: String },

    /// Object key that cannot be addressed verbatim.
    #[snafu(display("Object key '{key}' cannot be used verbatim: {source}"))]
    InvalidKey {
        key: String,
        source: object_store::path::Error,
    },

    /// The object or file does not exist.
    #[snafu(display("Source not found: {location}"))]
    NotFound { location: String },

    /// Credentials were rejected or missing permissions.
    #[snafu(display("Access denied: {location}"))]
    AccessDenied { location: String },

    /// Object store operation failed.
    #[snafu(display("Storage operation failed for {location}: {source}"))]
    ObjectStore {
        location: String,
        source: object_store::Error,
    },

    /// IO error while reading a local file.
    #[snafu(display("IO error for {location}: {source}"))]
    Io {
        location: String,
        source: std::io::Error,
    },

    /// S3 configuration error.
    #[snafu(display("S3 configuration error: {source}"))]
    S3Config { source: object_store::Error },

    /// GCS configuration error.
    #[snafu(display("GCS configuration error: {source}"))]
    GcsConfig { source: object_store::Error },

    /// Azure configuration error.
    #[snafu(display("Azure configuration error: {source}"))]
    AzureConfig { source: object_store::Error },
}

impl StorageError {
    /// Map an object store failure for `location`, lifting not-found and
    /// permission failures into their own variants.
    pub fn from_object_store(location: &str, source: object_store::Error) -> Self {
        match source {
            object_store::Error::NotFound { .. } => StorageError::NotFound {
                location: location.to_string(),
            },
            object_store::Error::PermissionDenied { .. }
            | object_store::Error::Unauthenticated { .. } => StorageError::AccessDenied {
                location: location.to_string(),
            },
            source => StorageError::ObjectStore {
                location: location.to_string(),
                source,
            },
        }
    }

    /// Map a local IO failure for `location`.
    pub fn from_io(location: &str, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound {
                location: location.to_string(),
            },
            std::io::ErrorKind::PermissionDenied => StorageError::AccessDenied {
                location: location.to_string(),
            },
            _ => StorageError::Io {
                location: location.to_string(),
                source,
            },
        }
    }

    /// Check if this error represents a "not found" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }

    /// Errors that retrying will not fix.
    ///
    /// Transient object store failures are already retried with backoff by the
    /// client, so only the remaining `ObjectStore`/`Io` failures count as
    /// transient here.
    pub fn is_permanent(&self) -> bool {
        !matches!(
            self,
            StorageError::ObjectStore { .. } | StorageError::Io { .. }
        )
    }
}

// ============ Config Errors ============

/// Errors that can occur during configuration parsing and validation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// A file entry has no table name.
    #[snafu(display("File entry #{index} has an empty table name"))]
    EmptyTableName { index: usize },

    /// A file entry has no path.
    #[snafu(display("Table '{table}' has empty path"))]
    EmptyPathForTable { table: String },

    /// A file entry path is not a supported location.
    #[snafu(display("Table '{table}' has an unsupported path: {source}"))]
    InvalidPathForTable { table: String, source: StorageError },

    /// CSV delimiter must be a single byte.
    #[snafu(display("Table '{table}' has an invalid CSV delimiter '{delimiter}'"))]
    InvalidDelimiter { table: String, delimiter: String },

    /// Environment variable interpolation failed.
    #[snafu(display("Environment variable interpolation failed:\n{message}"))]
    EnvInterpolation { message: String },

    /// Failed to parse YAML configuration.
    #[snafu(display("Failed to parse YAML: {source}"))]
    YamlParse { source: serde_yaml::Error },

    /// Failed to read configuration file.
    #[snafu(display("Failed to read configuration file: {source}"))]
    ReadFile { source: std::io::Error },

    /// Duplicate table names found across config files.
    #[snafu(display("Duplicate table names: {}", tables.join(", ")))]
    DuplicateTables { tables: Vec<String> },

    /// Unsupported config file format.
    #[snafu(display("Unsupported config format for {}: only .yaml/.yml/.json supported", path.display()))]
    UnsupportedFormat { path: std::path::PathBuf },

    /// Failed to read configuration directory.
    #[snafu(display("Failed to read directory {}", path.display()))]
    ReadDir {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    /// Multiple configuration errors occurred.
    #[snafu(display("Multiple config errors:\n{}", errors.join("\n")))]
    MultipleErrors { errors: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let err = StorageError::from_io(
            "/tmp/missing.json",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(err.is_not_found());
        assert!(err.is_permanent());
        assert_eq!(err.to_string(), "Source not found: /tmp/missing.json");
    }

    #[test]
    fn test_io_permission_maps_to_access_denied() {
        let err = StorageError::from_io(
            "/root/secret.json",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, StorageError::AccessDenied { .. }));
        assert!(err.is_permanent());
    }

    #[test]
    fn test_other_io_is_transient() {
        let err = StorageError::from_io(
            "/tmp/file.json",
            std::io::Error::from(std::io::ErrorKind::Interrupted),
        );
        assert!(!err.is_not_found());
        assert!(!err.is_permanent());
    }

    #[test]
    fn test_object_store_not_found() {
        let source = object_store::Error::NotFound {
            path: "dir/file.json".to_string(),
            source: "missing".into(),
        };
        let err = StorageError::from_object_store("s3://bucket/dir/file.json", source);
        assert!(err.is_not_found());
    }
}
