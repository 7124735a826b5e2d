//! Local filesystem reads.
//!
//! Local files bypass object_store and are opened directly, so not-found and
//! permission failures surface as their own error variants.

use futures::{StreamExt, TryStreamExt};
use std::path::PathBuf;
use std::time::Instant;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::emit;
use crate::error::StorageError;
use crate::metrics::events::{StorageOperation, StorageRequest};

use super::ByteStream;

/// Local filesystem location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalConfig {
    pub path: PathBuf,
}

/// Open a local file as a byte stream.
pub async fn open_local(config: &LocalConfig) -> Result<ByteStream, StorageError> {
    let location = config.path.display().to_string();

    let start = Instant::now();
    let opened = tokio::fs::File::open(&config.path).await;
    emit!(StorageRequest {
        operation: StorageOperation::Open,
        success: opened.is_ok(),
        duration: start.elapsed(),
    });

    let file = opened.map_err(|e| StorageError::from_io(&location, e))?;
    debug!("Opened {location}");

    let stream_location = location.clone();
    let inner = ReaderStream::new(file)
        .map_err(move |e| StorageError::from_io(&stream_location, e))
        .boxed();

    Ok(ByteStream::new(location, inner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tempfile::TempDir;

    /// Number of descriptors this process holds open on `path`.
    #[cfg(target_os = "linux")]
    fn open_handles(path: &std::path::Path) -> usize {
        let target = std::fs::canonicalize(path).unwrap();
        std::fs::read_dir("/proc/self/fd")
            .unwrap()
            .filter_map(|entry| std::fs::read_link(entry.ok()?.path()).ok())
            .filter(|link| *link == target)
            .count()
    }

    #[tokio::test]
    async fn test_open_local_reads_contents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.json");
        std::fs::write(&path, b"{\"a\": 1}\n{\"a\": 2}\n").unwrap();

        let stream = open_local(&LocalConfig { path }).await.unwrap();
        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
        assert_eq!(chunks.concat(), b"{\"a\": 1}\n{\"a\": 2}\n");
    }

    #[tokio::test]
    async fn test_open_local_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.json");

        let err = open_local(&LocalConfig { path }).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_stream_holds_handle_until_dropped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.csv");
        std::fs::write(&path, b"a,b\n1,2\n").unwrap();
        assert_eq!(open_handles(&path), 0);

        let stream = open_local(&LocalConfig { path: path.clone() }).await.unwrap();
        assert_eq!(open_handles(&path), 1);

        drop(stream);
        assert_eq!(open_handles(&path), 0);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_drained_stream_releases_handle() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.json");
        std::fs::write(&path, b"[1, 2, 3]").unwrap();

        let stream = open_local(&LocalConfig { path: path.clone() }).await.unwrap();
        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
        assert_eq!(chunks.concat(), b"[1, 2, 3]");
        assert_eq!(open_handles(&path), 0);
    }
}
