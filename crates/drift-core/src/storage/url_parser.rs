//! Location parsing for storage backends.
//!
//! Splits a configured file location into a backend and an object key. Object
//! keys are kept exactly as written: segments are never cleaned, collapsed or
//! re-encoded.

use regex::{Captures, Regex};
use snafu::prelude::*;
use std::path::PathBuf;
use std::sync::LazyLock;

use crate::error::{InvalidUrlSnafu, MissingKeySnafu, StorageError};

use super::{AzureConfig, GcsConfig, LocalConfig, S3Config};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheme {
    S3,
    Gcs,
    Azure,
    File,
}

/// Location patterns, tried in order. Host-specific https forms come before
/// the generic scheme forms.
const LOCATION_PATTERNS: &[(Scheme, &str)] = &[
    (
        Scheme::S3,
        r"^https://s3\.(?P<region>[\w\-]+)\.amazonaws\.com/(?P<bucket>[a-z0-9\-\.]+)(/(?P<key>.+))?$",
    ),
    (
        Scheme::S3,
        r"^https://(?P<bucket>[a-z0-9\-\.]+)\.s3\.(?P<region>[\w\-]+)\.amazonaws\.com(/(?P<key>.+))?$",
    ),
    (
        Scheme::S3,
        r"^[sS]3[aA]?::(?P<protocol>https?)://(?P<endpoint>[^:/]+):(?P<port>\d+)/(?P<bucket>[a-z0-9\-\.]+)(/(?P<key>.+))?$",
    ),
    (
        Scheme::S3,
        r"^[sS]3[aA]?://(?P<bucket>[a-z0-9\-\.]+)(/(?P<key>.+))?$",
    ),
    (
        Scheme::Gcs,
        r"^https://storage\.googleapis\.com/(?P<bucket>[a-z0-9\-_\.]+)(/(?P<key>.+))?$",
    ),
    (
        Scheme::Gcs,
        r"^https://(?P<bucket>[a-z0-9\-_\.]+)\.storage\.googleapis\.com(/(?P<key>.+))?$",
    ),
    (
        Scheme::Gcs,
        r"^[gG][sS]://(?P<bucket>[a-z0-9\-\._]+)(/(?P<key>.+))?$",
    ),
    (
        Scheme::Azure,
        r"^abfss?://(?P<container>[a-z0-9\-]+)@(?P<account>[a-z0-9]+)\.dfs\.core\.windows\.net(/(?P<key>.+))?$",
    ),
    (
        Scheme::Azure,
        r"^https://(?P<account>[a-z0-9]+)\.(blob|dfs)\.core\.windows\.net/(?P<container>[a-z0-9\-]+)(/(?P<key>.+))?$",
    ),
    (Scheme::File, r"^file://(?P<path>.+)$"),
    (Scheme::File, r"^file:(?P<path>.+)$"),
];

static LOCATION_MATCHERS: LazyLock<Vec<(Scheme, Regex)>> = LazyLock::new(|| {
    LOCATION_PATTERNS
        .iter()
        .map(|(scheme, pattern)| (*scheme, Regex::new(pattern).expect("Invalid location pattern")))
        .collect()
});

// Anything that looks like `scheme://` but matched no pattern above.
static UNKNOWN_SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:(//|:)").expect("Invalid scheme pattern")
});

/// Backend configuration for a single file location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    S3(S3Config),
    Gcs(GcsConfig),
    Azure(AzureConfig),
    Local(LocalConfig),
}

impl BackendConfig {
    /// Parse a file location into a backend configuration.
    ///
    /// Object-store locations must name an object. Strings that match no
    /// object-store pattern and carry no URL scheme are local paths, relative
    /// or absolute.
    pub fn parse_url(url: &str) -> Result<Self, StorageError> {
        let matched = LOCATION_MATCHERS
            .iter()
            .find_map(|(scheme, regex)| regex.captures(url).map(|caps| (*scheme, caps)));

        if let Some((scheme, caps)) = matched {
            return match scheme {
                Scheme::S3 => Self::parse_s3(url, &caps),
                Scheme::Gcs => Self::parse_gcs(url, &caps),
                Scheme::Azure => Self::parse_azure(url, &caps),
                Scheme::File => Ok(Self::parse_local(&caps["path"])),
            };
        }

        if url.is_empty() || UNKNOWN_SCHEME.is_match(url) {
            return InvalidUrlSnafu {
                url: url.to_string(),
            }
            .fail();
        }

        Ok(Self::parse_local(url))
    }

    fn required_key(url: &str, caps: &Captures) -> Result<String, StorageError> {
        caps.name("key")
            .map(|key| key.as_str().to_string())
            .context(MissingKeySnafu { url })
    }

    fn parse_s3(url: &str, caps: &Captures) -> Result<Self, StorageError> {
        let group = |name: &str| caps.name(name).map(|m| m.as_str());

        // Explicit environment settings take precedence over the URL.
        let region = std::env::var("AWS_DEFAULT_REGION")
            .ok()
            .or_else(|| group("region").map(str::to_string));
        let endpoint = std::env::var("AWS_ENDPOINT").ok().or_else(|| {
            let host = group("endpoint")?;
            let protocol = group("protocol").unwrap_or("https");
            let port = group("port").and_then(|p| p.parse::<u16>().ok()).unwrap_or(443);
            Some(format!("{protocol}://{host}:{port}"))
        });

        Ok(BackendConfig::S3(S3Config {
            endpoint,
            region,
            bucket: caps["bucket"].to_string(),
            key: Self::required_key(url, caps)?,
        }))
    }

    fn parse_gcs(url: &str, caps: &Captures) -> Result<Self, StorageError> {
        Ok(BackendConfig::Gcs(GcsConfig {
            bucket: caps["bucket"].to_string(),
            key: Self::required_key(url, caps)?,
        }))
    }

    fn parse_azure(url: &str, caps: &Captures) -> Result<Self, StorageError> {
        Ok(BackendConfig::Azure(AzureConfig {
            account: caps["account"].to_string(),
            container: caps["container"].to_string(),
            key: Self::required_key(url, caps)?,
        }))
    }

    fn parse_local(path: &str) -> Self {
        BackendConfig::Local(LocalConfig {
            path: PathBuf::from(path),
        })
    }

    /// The object key within the bucket, or `None` for local files.
    pub fn key(&self) -> Option<&str> {
        match self {
            BackendConfig::S3(s3) => Some(&s3.key),
            BackendConfig::Gcs(gcs) => Some(&gcs.key),
            BackendConfig::Azure(azure) => Some(&azure.key),
            BackendConfig::Local(_) => None,
        }
    }

    /// Identifier of the bucket/container, used to share clients between
    /// files that live in the same place.
    pub fn bucket_key(&self) -> String {
        match self {
            BackendConfig::S3(s3) => match &s3.endpoint {
                Some(endpoint) => format!("s3::{endpoint}/{}", s3.bucket),
                None => format!("s3://{}", s3.bucket),
            },
            BackendConfig::Gcs(gcs) => format!("gs://{}", gcs.bucket),
            BackendConfig::Azure(azure) => format!("az://{}@{}", azure.container, azure.account),
            BackendConfig::Local(_) => "file://".to_string(),
        }
    }
}
