//! Filesystem storage for uploaded images and documents.

use std::error::Error as StdError;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use futures::{StreamExt, pin_mut};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

/// Errors that can occur while interacting with the upload storage backend.
#[derive(Debug, Error)]
pub enum UploadStorageError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("uploaded file exceeds {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("request body exceeds configured limit")]
    PayloadTooLarge {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    #[error("uploaded file stream failed")]
    PayloadStream {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    #[error("uploaded file is empty")]
    EmptyPayload,
}

/// Result of storing an upload payload.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    /// Path relative to the storage root, always with `/` separators.
    pub stored_path: String,
    pub size_bytes: u64,
}

/// Filesystem-backed upload storage rooted at one directory.
#[derive(Debug)]
pub struct UploadStorage {
    root: PathBuf,
}

impl UploadStorage {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Streams the payload to `uploads/{bucket}/{unix_ts}_{uuid}.{extension}`.
    ///
    /// The partial file is removed when the stream fails, runs past `max_bytes` or turns out
    /// to be empty.
    pub async fn store_stream<S>(
        &self,
        bucket: &str,
        extension: &str,
        max_bytes: u64,
        stream: S,
    ) -> Result<StoredUpload, UploadStorageError>
    where
        S: futures::Stream<Item = Result<Bytes, UploadStorageError>>,
    {
        let stored_path = build_stored_path(bucket, extension, OffsetDateTime::now_utc());
        let absolute = self.resolve(&stored_path)?;

        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&absolute).await?;
        let mut total_bytes: u64 = 0;

        pin_mut!(stream);
        while let Some(chunk_result) = stream.next().await {
            let chunk = match chunk_result {
                Ok(chunk) => chunk,
                Err(err) => {
                    drop(file);
                    let _ = fs::remove_file(&absolute).await;
                    return Err(err);
                }
            };

            total_bytes = total_bytes.saturating_add(chunk.len() as u64);
            if total_bytes > max_bytes {
                drop(file);
                let _ = fs::remove_file(&absolute).await;
                return Err(UploadStorageError::TooLarge { limit: max_bytes });
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;

        if total_bytes == 0 {
            drop(file);
            let _ = fs::remove_file(&absolute).await;
            return Err(UploadStorageError::EmptyPayload);
        }

        Ok(StoredUpload {
            stored_path,
            size_bytes: total_bytes,
        })
    }

    /// Store a fully-buffered payload.
    pub async fn store(
        &self,
        bucket: &str,
        extension: &str,
        max_bytes: u64,
        data: Bytes,
    ) -> Result<StoredUpload, UploadStorageError> {
        let stream = futures::stream::once(async move { Ok::<_, UploadStorageError>(data) });
        self.store_stream(bucket, extension, max_bytes, stream).await
    }

    /// Attempt to read the stored payload into memory.
    pub async fn read(&self, stored_path: &str) -> Result<Bytes, UploadStorageError> {
        let absolute = self.resolve(stored_path)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    /// Rejects absolute paths and any `..` component so reads stay under the root.
    fn resolve(&self, stored_path: &str) -> Result<PathBuf, UploadStorageError> {
        let relative = Path::new(stored_path);
        if stored_path.is_empty()
            || relative.is_absolute()
            || relative.components().any(|component| {
                matches!(
                    component,
                    Component::ParentDir | Component::Prefix(_) | Component::RootDir
                )
            })
        {
            return Err(UploadStorageError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }
}

fn build_stored_path(bucket: &str, extension: &str, now: OffsetDateTime) -> String {
    let identifier = Uuid::new_v4().simple();
    format!(
        "uploads/{bucket}/{}_{identifier}.{extension}",
        now.unix_timestamp()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn stored_names_carry_timestamp_and_unique_token() {
        let now = datetime!(2025-01-02 03:04:05 UTC);
        let first = build_stored_path("forums", "png", now);
        let second = build_stored_path("forums", "png", now);
        assert!(first.starts_with("uploads/forums/1735787045_"));
        assert!(first.ends_with(".png"));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn stores_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path().to_path_buf()).unwrap();
        let stored = storage
            .store("news", "jpg", 1024, Bytes::from_static(b"jpeg-bytes"))
            .await
            .unwrap();
        assert_eq!(stored.size_bytes, 10);
        assert_eq!(
            storage.read(&stored.stored_path).await.unwrap(),
            Bytes::from_static(b"jpeg-bytes")
        );
    }

    #[tokio::test]
    async fn oversized_and_empty_payloads_leave_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path().to_path_buf()).unwrap();

        let err = storage
            .store("products", "png", 4, Bytes::from_static(b"too-large"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadStorageError::TooLarge { limit: 4 }));

        let err = storage
            .store("products", "png", 4, Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadStorageError::EmptyPayload));

        let bucket = dir.path().join("uploads/products");
        let mut entries = std::fs::read_dir(bucket).unwrap();
        assert!(entries.next().is_none());
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path().to_path_buf()).unwrap();
        for path in ["../secret", "/etc/passwd", "uploads/../../x", ""] {
            assert!(matches!(
                storage.read(path).await,
                Err(UploadStorageError::InvalidPath)
            ));
        }
    }
}
