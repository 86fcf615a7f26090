//! Resume file storage. Handlers only see `ResumeStorage`; the backend is
//! picked at startup from `STORAGE_BACKEND`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::Utc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::applications::validation::resume_extension;

/// Public prefix under which the local backend's files are served.
pub const UPLOADS_PREFIX: &str = "uploads";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),
}

/// A file accepted by a backend. `storage_path` is what gets recorded on the
/// application and later passed back to `delete`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub storage_path: String,
}

#[async_trait]
pub trait ResumeStorage: Send + Sync {
    async fn put(
        &self,
        original_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<StoredFile, StorageError>;

    async fn delete(&self, storage_path: &str) -> Result<(), StorageError>;
}

/// `resume-<millis>-<random><ext>`; the original extension is kept so the
/// static route serves it with a sensible content type.
pub fn generate_file_name(original_name: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "resume-{}-{}{}",
        Utc::now().timestamp_millis(),
        &suffix[..12],
        resume_extension(original_name)
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Local disk
// ────────────────────────────────────────────────────────────────────────────

/// Writes resumes into a single directory; storage paths look like
/// `uploads/<file>`.
pub struct LocalDiskStorage {
    root: PathBuf,
}

impl LocalDiskStorage {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, storage_path: &str) -> Result<PathBuf, StorageError> {
        let file_name = storage_path
            .strip_prefix(UPLOADS_PREFIX)
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(storage_path);
        // Only bare file names ever come out of `put`.
        if file_name.is_empty() || file_name.contains('/') || file_name.contains("..") {
            return Err(StorageError::InvalidPath(storage_path.to_string()));
        }
        Ok(self.root.join(file_name))
    }
}

#[async_trait]
impl ResumeStorage for LocalDiskStorage {
    async fn put(
        &self,
        original_name: &str,
        _content_type: &str,
        data: Bytes,
    ) -> Result<StoredFile, StorageError> {
        let file_name = generate_file_name(original_name);
        tokio::fs::write(self.root.join(&file_name), &data).await?;
        info!("Stored resume '{original_name}' as {file_name} ({} bytes)", data.len());
        Ok(StoredFile {
            storage_path: format!("{UPLOADS_PREFIX}/{file_name}"),
        })
    }

    async fn delete(&self, storage_path: &str) -> Result<(), StorageError> {
        let path = self.resolve(storage_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted resume file {}", path.display());
                Ok(())
            }
            // Already gone: nothing left to clean up.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// S3 / MinIO
// ────────────────────────────────────────────────────────────────────────────

pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl ResumeStorage for S3Storage {
    async fn put(
        &self,
        original_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<StoredFile, StorageError> {
        let key = format!("resumes/{}", generate_file_name(original_name));
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::S3(format!("upload failed: {e}")))?;

        info!("Uploaded resume to s3://{}/{}", self.bucket, key);
        Ok(StoredFile { storage_path: key })
    }

    async fn delete(&self, storage_path: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(storage_path)
            .send()
            .await
            .map_err(|e| StorageError::S3(format!("delete failed: {e}")))?;

        info!("Deleted s3://{}/{}", self.bucket, storage_path);
        Ok(())
    }
}
