//! Connection pooling for storage providers.
//!
//! Files living in the same bucket share one object store client, so their
//! requests reuse the same HTTP connections. Keys are passed per request, so
//! a single provider serves every object in its bucket.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::storage::{BackendConfig, StorageProvider, StorageProviderRef};

/// Reference-counted handle to a [`StoragePool`].
pub type StoragePoolRef = Arc<StoragePool>;

/// Pool of storage providers keyed by bucket.
#[derive(Default)]
pub struct StoragePool {
    providers: RwLock<HashMap<String, StorageProviderRef>>,
}

impl std::fmt::Debug for StoragePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoragePool").finish_non_exhaustive()
    }
}

impl StoragePool {
    /// Create a new empty storage pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the provider for the bucket that `config` points into.
    pub async fn get_or_create(
        &self,
        config: &BackendConfig,
        storage: &StorageConfig,
    ) -> Result<StorageProviderRef, StorageError> {
        let bucket_key = config.bucket_key();

        // Fast path: provider already exists
        {
            let providers = self.providers.read().await;
            if let Some(provider) = providers.get(&bucket_key) {
                return Ok(provider.clone());
            }
        }

        let mut providers = self.providers.write().await;

        // Double-check after acquiring write lock
        if let Some(provider) = providers.get(&bucket_key) {
            return Ok(provider.clone());
        }

        let provider = Arc::new(StorageProvider::for_backend(config, storage)?);
        debug!("Created storage provider for {bucket_key}");
        providers.insert(bucket_key, provider.clone());

        Ok(provider)
    }

    /// Insert a pre-built provider for a bucket. Used by tests with an
    /// in-memory store.
    pub async fn insert(&self, bucket_key: impl Into<String>, provider: StorageProviderRef) {
        self.providers
            .write()
            .await
            .insert(bucket_key.into(), provider);
    }

    /// Number of cached providers.
    pub async fn provider_count(&self) -> usize {
        self.providers.read().await.len()
    }
}
