//! Source reader over local files and object storage.

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use snafu::prelude::*;
use std::sync::Arc;
use tokio_util::io::{StreamReader, SyncIoBridge};
use tracing::debug;

use drift_core::emit;
use drift_core::error::MissingKeySnafu;
use drift_core::metrics::events::BytesRead;
use drift_core::storage::{BackendConfig, ByteStream, open_local};
use drift_core::{StorageConfig, StoragePool, StoragePoolRef};

use crate::error::StorageError;

/// Blocking `Read` over an open source stream.
///
/// Must be read from a blocking task, never from async code.
pub type BlockingRead =
    SyncIoBridge<StreamReader<BoxStream<'static, std::io::Result<Bytes>>, Bytes>>;

/// Opens configured file locations.
///
/// Remote files in the same bucket share one object store client through the
/// storage pool.
#[derive(Debug, Clone)]
pub struct SourceReader {
    pool: StoragePoolRef,
    storage: StorageConfig,
}

impl SourceReader {
    pub fn new(storage: StorageConfig) -> Self {
        Self::with_pool(Arc::new(StoragePool::new()), storage)
    }

    pub fn with_pool(pool: StoragePoolRef, storage: StorageConfig) -> Self {
        Self { pool, storage }
    }

    pub fn pool(&self) -> &StoragePoolRef {
        &self.pool
    }

    /// Open a stream over the file at `location`.
    ///
    /// Object storage keys are used exactly as written after the bucket.
    pub async fn open(&self, location: &str) -> Result<ByteStream, StorageError> {
        let backend = BackendConfig::parse_url(location)?;

        if let BackendConfig::Local(local) = &backend {
            return open_local(local).await;
        }

        let key = backend
            .key()
            .context(MissingKeySnafu { url: location })?;
        let provider = self.pool.get_or_create(&backend, &self.storage).await?;
        provider.get_stream(key).await
    }

    /// Open `location` for decoding on a blocking thread.
    ///
    /// Bytes are pulled from the stream as the caller reads, so the file is
    /// never held in memory as a whole. Dropping the reader releases the
    /// underlying handle.
    pub async fn open_blocking(
        &self,
        location: &str,
        table: &str,
    ) -> Result<BlockingRead, StorageError> {
        let stream = self.open(location).await?;
        debug!(target = %table, "Streaming {}", stream.location());

        let target = table.to_string();
        let chunks = stream
            .inspect_ok(move |chunk| {
                emit!(BytesRead {
                    bytes: chunk.len() as u64,
                    target: target.clone(),
                })
            })
            .map_err(std::io::Error::other)
            .boxed();

        // The bridge captures the current runtime handle.
        Ok(SyncIoBridge::new(StreamReader::new(chunks)))
    }
}
