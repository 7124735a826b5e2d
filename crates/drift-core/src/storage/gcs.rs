//! Google Cloud Storage backend implementation.

use object_store::ObjectStore;
use object_store::gcp::GoogleCloudStorageBuilder;
use snafu::prelude::*;
use std::sync::Arc;
use tracing::debug;

use crate::config::StorageConfig;
use crate::error::{GcsConfigSnafu, StorageError};

use super::{StorageProvider, client_options, retry_config};

/// Google Cloud Storage object location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcsConfig {
    pub bucket: String,
    pub key: String,
}

impl StorageProvider {
    pub(super) fn construct_gcs(
        config: &GcsConfig,
        storage: &StorageConfig,
    ) -> Result<Self, StorageError> {
        let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(&config.bucket);

        for (key, value) in &storage.options {
            builder = builder.with_config(key.parse().context(GcsConfigSnafu)?, value.clone());
        }

        builder = builder
            .with_retry(retry_config(storage))
            .with_client_options(client_options(storage));

        if let Ok(service_account_key) = std::env::var("GOOGLE_SERVICE_ACCOUNT_KEY") {
            debug!("Constructing GCS builder with service account key");
            builder = builder.with_service_account_key(&service_account_key);
        }

        let object_store: Arc<dyn ObjectStore> =
            Arc::new(builder.build().context(GcsConfigSnafu)?);

        Ok(Self {
            object_store,
            canonical_url: format!("gs://{}", config.bucket),
        })
    }
}
