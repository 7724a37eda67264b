//! Uploaded images and verification documents.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tracing::info;

use crate::application::error::ServiceError;
use crate::domain::validation::{Rule, ValidationErrors};
use crate::infra::uploads::{UploadStorage, UploadStorageError};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    VerificationDocument,
}

impl AssetKind {
    /// Multipart field carrying the file.
    pub fn field(self) -> &'static str {
        match self {
            AssetKind::Image => "image",
            AssetKind::VerificationDocument => "file",
        }
    }

    fn extensions(self) -> &'static [&'static str] {
        match self {
            AssetKind::Image => IMAGE_EXTENSIONS,
            AssetKind::VerificationDocument => DOCUMENT_EXTENSIONS,
        }
    }

    fn accepted(self) -> &'static str {
        match self {
            AssetKind::Image => "jpg, jpeg, png, gif, webp",
            AssetKind::VerificationDocument => "pdf, jpg, jpeg, png",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredAsset {
    pub url: String,
    pub path: String,
}

#[derive(Clone)]
pub struct AssetService {
    storage: Arc<UploadStorage>,
    public_prefix: String,
    max_bytes: u64,
}

impl AssetService {
    pub fn new(storage: Arc<UploadStorage>, public_prefix: impl Into<String>, max_bytes: u64) -> Self {
        let public_prefix = public_prefix.into().trim_end_matches('/').to_string();
        Self {
            storage,
            public_prefix,
            max_bytes,
        }
    }

    pub fn storage(&self) -> Arc<UploadStorage> {
        self.storage.clone()
    }

    /// Lower-cased extension of `file_name` when it is accepted for `kind`.
    pub fn check_extension(kind: AssetKind, file_name: Option<&str>) -> Result<String, ValidationErrors> {
        let Some(file_name) = file_name.filter(|name| !name.trim().is_empty()) else {
            return Err(ValidationErrors::single(kind.field(), Rule::Required));
        };
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if kind.extensions().contains(&extension.as_str()) {
            Ok(extension)
        } else {
            Err(ValidationErrors::single(kind.field(), Rule::FileType(kind.accepted())))
        }
    }

    pub async fn store_stream<S>(
        &self,
        kind: AssetKind,
        bucket: &'static str,
        file_name: Option<&str>,
        stream: S,
    ) -> Result<StoredAsset, ServiceError>
    where
        S: futures::Stream<Item = Result<Bytes, UploadStorageError>>,
    {
        let extension = Self::check_extension(kind, file_name)?;
        let stored = self
            .storage
            .store_stream(bucket, &extension, self.max_bytes, stream)
            .await
            .map_err(|err| self.storage_error(kind, err))?;
        info!(
            target: "alumni::uploads",
            bucket,
            path = %stored.stored_path,
            size_bytes = stored.size_bytes,
            "Stored upload"
        );
        Ok(StoredAsset {
            url: format!("{}/{}", self.public_prefix, stored.stored_path),
            path: stored.stored_path,
        })
    }

    pub async fn store(
        &self,
        kind: AssetKind,
        bucket: &'static str,
        file_name: Option<&str>,
        data: Bytes,
    ) -> Result<StoredAsset, ServiceError> {
        let stream = futures::stream::once(async move { Ok::<_, UploadStorageError>(data) });
        self.store_stream(kind, bucket, file_name, stream).await
    }

    fn storage_error(&self, kind: AssetKind, err: UploadStorageError) -> ServiceError {
        match err {
            UploadStorageError::TooLarge { limit } => {
                ServiceError::invalid(kind.field(), Rule::MaxKilobytes(limit / 1024))
            }
            UploadStorageError::EmptyPayload => ServiceError::invalid(kind.field(), Rule::Required),
            other => ServiceError::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_are_checked_per_kind() {
        assert_eq!(
            AssetService::check_extension(AssetKind::Image, Some("Foto.PNG")).unwrap(),
            "png"
        );
        let err = AssetService::check_extension(AssetKind::Image, Some("ijazah.pdf")).unwrap_err();
        assert_eq!(err.violations()[0].field, "image");
        assert!(AssetService::check_extension(AssetKind::VerificationDocument, Some("ijazah.pdf")).is_ok());
        assert!(AssetService::check_extension(AssetKind::Image, None).is_err());
        assert!(AssetService::check_extension(AssetKind::Image, Some("noext")).is_err());
    }

    #[tokio::test]
    async fn urls_use_public_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(UploadStorage::new(dir.path().to_path_buf()).unwrap());
        let assets = AssetService::new(storage, "/storage/", 5 * 1024 * 1024);
        let stored = assets
            .store(AssetKind::Image, "forums", Some("a.webp"), Bytes::from_static(b"RIFF"))
            .await
            .unwrap();
        assert!(stored.url.starts_with("/storage/uploads/forums/"));
        assert!(stored.url.ends_with(".webp"));
    }

    #[tokio::test]
    async fn oversized_upload_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(UploadStorage::new(dir.path().to_path_buf()).unwrap());
        let assets = AssetService::new(storage, "/storage", 2048);
        let err = assets
            .store(AssetKind::Image, "news", Some("big.jpg"), Bytes::from(vec![0u8; 4096]))
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation(errors) => {
                assert_eq!(errors.violations()[0].rule, Rule::MaxKilobytes(2));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
