//! Common configuration types.

mod loader;
mod path;
mod vars;

pub use loader::{Mergeable, load_from_paths};
pub use path::{CliArgs, ConfigPath, is_config_file};
pub use vars::{InterpolationResult, interpolate};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Object storage client settings shared by every remote file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Connection timeout in seconds (default: 5).
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Maximum retries for transient failures (default: 10).
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// Upper bound on the time spent retrying one request (default: 180).
    #[serde(default = "default_retry_timeout_secs")]
    pub retry_timeout_secs: u64,
    /// Backend options passed to the object store builder
    /// (e.g. `aws_region`, `aws_endpoint`, `google_service_account`).
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_retries: default_max_retries(),
            retry_timeout_secs: default_retry_timeout_secs(),
            options: HashMap::new(),
        }
    }
}

impl StorageConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn retry_timeout(&self) -> Duration {
        Duration::from_secs(self.retry_timeout_secs)
    }

    /// Merge values from another StorageConfig (last-write-wins).
    pub fn merge_from(&mut self, other: Self) {
        let defaults = Self::default();
        if other.timeout_secs != defaults.timeout_secs {
            self.timeout_secs = other.timeout_secs;
        }
        if other.connect_timeout_secs != defaults.connect_timeout_secs {
            self.connect_timeout_secs = other.connect_timeout_secs;
        }
        if other.max_retries != defaults.max_retries {
            self.max_retries = other.max_retries;
        }
        if other.retry_timeout_secs != defaults.retry_timeout_secs {
            self.retry_timeout_secs = other.retry_timeout_secs;
        }
        self.options.extend(other.options);
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_max_retries() -> usize {
    10
}

fn default_retry_timeout_secs() -> u64 {
    180
}
