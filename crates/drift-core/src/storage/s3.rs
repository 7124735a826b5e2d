//! S3 storage backend implementation.

use object_store::ObjectStore;
use object_store::aws::AmazonS3Builder;
use snafu::prelude::*;
use std::sync::Arc;

use crate::config::StorageConfig;
use crate::error::{S3ConfigSnafu, StorageError};

use super::{StorageProvider, client_options, retry_config};

/// S3 object location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub bucket: String,
    pub key: String,
}

impl StorageProvider {
    pub(super) fn construct_s3(
        config: &S3Config,
        storage: &StorageConfig,
    ) -> Result<Self, StorageError> {
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(&config.bucket);

        for (key, value) in &storage.options {
            builder = builder.with_config(key.parse().context(S3ConfigSnafu)?, value.clone());
        }

        builder = builder
            .with_retry(retry_config(storage))
            .with_client_options(client_options(storage));

        if let Some(region) = &config.region {
            builder = builder.with_region(region);
        }

        if let Some(endpoint) = &config.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_virtual_hosted_style_request(false)
                .with_allow_http(true);
        }

        let canonical_url = match &config.endpoint {
            Some(endpoint) => format!("s3::{}/{}", endpoint, config.bucket),
            None => format!("s3://{}", config.bucket),
        };

        let object_store: Arc<dyn ObjectStore> =
            Arc::new(builder.build().context(S3ConfigSnafu)?);

        Ok(Self {
            object_store,
            canonical_url,
        })
    }
}
