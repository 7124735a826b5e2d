//! Multi-cloud storage abstraction.
//!
//! Provides scoped byte streams over S3, GCS, Azure Blob Storage and the
//! local filesystem.

mod azure;
mod gcs;
mod local;
mod s3;
mod url_parser;

pub use url_parser::BackendConfig;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use object_store::path::Path;
use object_store::{ClientOptions, ObjectStore, RetryConfig};
use snafu::prelude::*;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tracing::debug;

use crate::config::StorageConfig;
use crate::emit;
use crate::error::{InvalidKeySnafu, InvalidUrlSnafu, StorageError};
use crate::metrics::events::{StorageOperation, StorageRequest};

pub use azure::AzureConfig;
pub use gcs::GcsConfig;
pub use local::{LocalConfig, open_local};
pub use s3::S3Config;

/// A reference-counted storage provider.
pub type StorageProviderRef = Arc<StorageProvider>;

/// Object store client for one bucket or container.
///
/// Keys passed to [`StorageProvider::get_stream`] are resolved against the
/// bucket root.
#[derive(Clone)]
pub struct StorageProvider {
    pub(crate) object_store: Arc<dyn ObjectStore>,
    pub(crate) canonical_url: String,
}

impl std::fmt::Debug for StorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StorageProvider<{}>", self.canonical_url)
    }
}

impl StorageProvider {
    /// Create a provider for the bucket that `config` points into.
    pub fn for_backend(
        config: &BackendConfig,
        storage: &StorageConfig,
    ) -> Result<Self, StorageError> {
        match config {
            BackendConfig::S3(config) => Self::construct_s3(config, storage),
            BackendConfig::Gcs(config) => Self::construct_gcs(config, storage),
            BackendConfig::Azure(config) => Self::construct_azure(config, storage),
            // Local files are opened directly, see `open_local`.
            BackendConfig::Local(local) => InvalidUrlSnafu {
                url: local.path.display().to_string(),
            }
            .fail(),
        }
    }

    /// Wrap an existing object store. Used by tests with an in-memory store.
    pub fn with_store(object_store: Arc<dyn ObjectStore>, canonical_url: impl Into<String>) -> Self {
        Self {
            object_store,
            canonical_url: canonical_url.into(),
        }
    }

    /// Base URL of the bucket this provider reads from.
    pub fn canonical_url(&self) -> &str {
        &self.canonical_url
    }

    /// Open a stream over the object stored under `key`.
    ///
    /// The key is used verbatim. Keys that object storage cannot address
    /// without rewriting them are rejected rather than cleaned up.
    pub async fn get_stream(&self, key: &str) -> Result<ByteStream, StorageError> {
        let path = Path::parse(key).context(InvalidKeySnafu { key })?;
        let location = format!("{}/{key}", self.canonical_url);

        let start = Instant::now();
        let result = self.object_store.get(&path).await;

        emit!(StorageRequest {
            operation: StorageOperation::Get,
            success: result.is_ok(),
            duration: start.elapsed(),
        });

        let result = result.map_err(|e| StorageError::from_object_store(&location, e))?;
        debug!("Opened {location} ({} bytes)", result.meta.size);

        let stream_location = location.clone();
        let inner = result
            .into_stream()
            .map(move |chunk| chunk.map_err(|e| StorageError::from_object_store(&stream_location, e)))
            .boxed();

        Ok(ByteStream::new(location, inner))
    }
}

/// Retry policy applied to every remote client: exponential backoff on
/// transient failures, bounded by `max_retries` and the retry timeout.
pub(crate) fn retry_config(storage: &StorageConfig) -> RetryConfig {
    RetryConfig {
        max_retries: storage.max_retries,
        retry_timeout: storage.retry_timeout(),
        ..RetryConfig::default()
    }
}

/// Client options with the per-request timeout applied.
pub(crate) fn client_options(storage: &StorageConfig) -> ClientOptions {
    ClientOptions::new()
        .with_timeout(storage.timeout())
        .with_connect_timeout(storage.connect_timeout())
}

/// A stream of bytes read from one location.
///
/// The stream owns the underlying file handle or response body, which is
/// released as soon as the stream is dropped.
pub struct ByteStream {
    location: String,
    inner: BoxStream<'static, Result<Bytes, StorageError>>,
}

impl std::fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ByteStream<{}>", self.location)
    }
}

impl ByteStream {
    pub fn new(
        location: impl Into<String>,
        inner: BoxStream<'static, Result<Bytes, StorageError>>,
    ) -> Self {
        Self {
            location: location.into(),
            inner,
        }
    }

    /// The location this stream reads from.
    pub fn location(&self) -> &str {
        &self.location
    }
}

impl Stream for ByteStream {
    type Item = Result<Bytes, StorageError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use object_store::memory::InMemory;
    use object_store::PutPayload;

    async fn memory_provider(objects: &[(&str, &str)]) -> StorageProvider {
        let store = InMemory::new();
        for (key, body) in objects {
            store
                .put(&Path::from(*key), PutPayload::from(body.to_string()))
                .await
                .unwrap();
        }
        StorageProvider::with_store(Arc::new(store), "memory://bucket")
    }

    async fn contents(provider: &StorageProvider, key: &str) -> Result<Vec<u8>, StorageError> {
        let chunks: Vec<Bytes> = provider.get_stream(key).await?.try_collect().await?;
        Ok(chunks.concat())
    }

    #[tokio::test]
    async fn test_get_stream_yields_object_contents() {
        let provider = memory_provider(&[("dir/sub/file.json", r#"{"id": 1}"#)]).await;

        let stream = provider.get_stream("dir/sub/file.json").await.unwrap();
        assert_eq!(stream.location(), "memory://bucket/dir/sub/file.json");

        let bytes = contents(&provider, "dir/sub/file.json").await.unwrap();
        assert_eq!(bytes, br#"{"id": 1}"#);
    }

    #[tokio::test]
    async fn test_get_stream_missing_object_is_not_found() {
        let provider = memory_provider(&[]).await;

        let err = contents(&provider, "missing.json").await.unwrap_err();
        assert!(err.is_not_found(), "unexpected error: {err}");
        assert!(err.to_string().contains("memory://bucket/missing.json"));
    }

    #[tokio::test]
    async fn test_get_stream_rejects_unaddressable_key() {
        let provider = memory_provider(&[]).await;

        let err = contents(&provider, "a//b.json").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey { .. }));
    }

    #[test]
    fn test_retry_config_uses_storage_settings() {
        let storage = StorageConfig {
            max_retries: 3,
            ..StorageConfig::default()
        };
        let retry = retry_config(&storage);
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.retry_timeout, storage.retry_timeout());
    }
}
