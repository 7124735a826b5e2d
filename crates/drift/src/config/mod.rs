//! Configuration for drift tables.
//!
//! A config lists the files to expose as tables, the object storage client
//! settings, and registration settings. Several files or directories can be
//! merged; table names must stay unique across all of them.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use drift_core::storage::BackendConfig;
pub use drift_core::config::{
    CliArgs, ConfigPath, InterpolationResult, Mergeable, StorageConfig, interpolate,
    load_from_paths,
};

use crate::error::ConfigError;

/// Upper bound on default assembly concurrency.
const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Document format of a source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// A stream of concatenated JSON documents.
    #[default]
    Json,
    /// Delimited text with a header row.
    Csv,
}

/// What to do with a CSV row whose length differs from the header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCountMismatch {
    /// Fill missing cells with empty strings and drop extra cells.
    #[default]
    Pad,
    /// Drop the row.
    Skip,
    /// Fail the whole file.
    Reject,
}

/// CSV decoding options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CsvOptions {
    /// Field delimiter, a single byte (default: `,`).
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default)]
    pub on_field_count_mismatch: FieldCountMismatch,
}

fn default_delimiter() -> String {
    ",".to_string()
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            on_field_count_mismatch: FieldCountMismatch::default(),
        }
    }
}

impl CsvOptions {
    /// The delimiter as a byte, if it is exactly one byte long.
    pub fn delimiter_byte(&self) -> Option<u8> {
        match self.delimiter.as_bytes() {
            [byte] => Some(*byte),
            _ => None,
        }
    }
}

/// One configured file, exposed as one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSourceSpec {
    /// Table name, unique across the configuration.
    pub table: String,
    /// Local path or object storage URI (`s3://`, `gs://`, `abfss://`, `file://`).
    pub path: String,
    /// JMESPath expression narrowing the document. Absent means identity.
    #[serde(default)]
    pub jmespath: Option<String>,
    /// Fields to include, in order. Empty includes nothing.
    #[serde(default)]
    pub only: IndexSet<String>,
    /// Fields to always exclude, even when listed in `only`.
    #[serde(default)]
    pub except: IndexSet<String>,
    /// Index hints per field. Carried for the host; inference ignores them.
    #[serde(default)]
    pub indexes: IndexMap<String, bool>,
    #[serde(default)]
    pub format: SourceFormat,
    #[serde(default)]
    pub csv: CsvOptions,
}

impl FileSourceSpec {
    /// Create a JSON file spec with no query and an empty projection.
    pub fn new(table: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            path: path.into(),
            jmespath: None,
            only: IndexSet::new(),
            except: IndexSet::new(),
            indexes: IndexMap::new(),
            format: SourceFormat::Json,
            csv: CsvOptions::default(),
        }
    }

    /// The query expression, or `None` when absent or blank.
    pub fn query(&self) -> Option<&str> {
        self.jmespath
            .as_deref()
            .filter(|expression| !expression.trim().is_empty())
    }

    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        if self.table.trim().is_empty() {
            return Err(ConfigError::EmptyTableName { index });
        }
        if self.path.trim().is_empty() {
            return Err(ConfigError::EmptyPathForTable {
                table: self.table.clone(),
            });
        }
        BackendConfig::parse_url(&self.path).map_err(|source| {
            ConfigError::InvalidPathForTable {
                table: self.table.clone(),
                source,
            }
        })?;
        if self.format == SourceFormat::Csv && self.csv.delimiter_byte().is_none() {
            return Err(ConfigError::InvalidDelimiter {
                table: self.table.clone(),
                delimiter: self.csv.delimiter.clone(),
            });
        }
        Ok(())
    }
}

/// Failure policy for table registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnTableError {
    /// Register the failed table with a resolver that reports its error.
    #[default]
    Isolate,
    /// Fail registration on the first failed table.
    Abort,
}

/// Registration settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalSettings {
    /// Maximum number of files assembled at once.
    /// Defaults to the number of files, capped at 8.
    #[serde(default)]
    pub concurrency: Option<usize>,
    /// Unset means [`OnTableError::Isolate`].
    #[serde(default)]
    pub on_table_error: Option<OnTableError>,
}

impl GlobalSettings {
    /// Effective concurrency for `file_count` files, never below one.
    pub fn concurrency_for(&self, file_count: usize) -> usize {
        self.concurrency
            .unwrap_or_else(|| file_count.min(DEFAULT_MAX_CONCURRENCY))
            .max(1)
    }

    pub fn on_table_error(&self) -> OnTableError {
        self.on_table_error.unwrap_or_default()
    }

    /// Merge values from another GlobalSettings (last-write-wins).
    pub fn merge_from(&mut self, other: Self) {
        if other.concurrency.is_some() {
            self.concurrency = other.concurrency;
        }
        if other.on_table_error.is_some() {
            self.on_table_error = other.on_table_error;
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Files to expose, in registration order.
    #[serde(default)]
    pub files: Vec<FileSourceSpec>,
    /// Object storage client settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Registration settings.
    #[serde(default)]
    pub global: GlobalSettings,
}

impl Mergeable for Config {
    fn keys(&self) -> Vec<String> {
        self.files.iter().map(|spec| spec.table.clone()).collect()
    }

    fn absorb(&mut self, other: Self) {
        self.files.extend(other.files);
        self.storage.merge_from(other.storage);
        self.global.merge_from(other.global);
    }

    fn parse_yaml(contents: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(contents).map_err(|source| ConfigError::YamlParse { source })
    }
}

impl Config {
    /// Load configuration from multiple paths (files or directories).
    pub fn from_paths(paths: &[ConfigPath]) -> Result<Self, ConfigError> {
        let config: Self = load_from_paths(paths)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        // Interpolate environment variables
        let result = interpolate(contents);
        if !result.is_ok() {
            return Err(ConfigError::EnvInterpolation {
                message: result.errors.join("\n"),
            });
        }

        let config = Self::parse_yaml(&result.text)?;
        config.validate()?;

        Ok(config)
    }

    /// Validate every file entry and table name uniqueness.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();

        for (index, spec) in self.files.iter().enumerate() {
            spec.validate(index)?;
            if !seen.insert(spec.table.as_str()) {
                duplicates.push(spec.table.clone());
            }
        }

        if !duplicates.is_empty() {
            return Err(ConfigError::DuplicateTables { tables: duplicates });
        }
        Ok(())
    }

    /// Number of configured files.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}
