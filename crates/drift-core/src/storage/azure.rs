//! Azure Blob Storage backend implementation.

use object_store::ObjectStore;
use object_store::azure::MicrosoftAzureBuilder;
use snafu::prelude::*;
use std::sync::Arc;

use crate::config::StorageConfig;
use crate::error::{AzureConfigSnafu, StorageError};

use super::{StorageProvider, client_options, retry_config};

/// Azure Blob Storage object location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureConfig {
    pub account: String,
    pub container: String,
    pub key: String,
}

impl StorageProvider {
    pub(super) fn construct_azure(
        config: &AzureConfig,
        storage: &StorageConfig,
    ) -> Result<Self, StorageError> {
        let mut builder = MicrosoftAzureBuilder::from_env()
            .with_account(&config.account)
            .with_container_name(&config.container);

        for (key, value) in &storage.options {
            builder = builder.with_config(key.parse().context(AzureConfigSnafu)?, value.clone());
        }

        builder = builder
            .with_retry(retry_config(storage))
            .with_client_options(client_options(storage));

        let canonical_url = format!(
            "https://{}.blob.core.windows.net/{}",
            config.account, config.container
        );

        let object_store: Arc<dyn ObjectStore> =
            Arc::new(builder.build().context(AzureConfigSnafu)?);

        Ok(Self {
            object_store,
            canonical_url,
        })
    }
}
