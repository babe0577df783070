//! Byte storage for attachment files.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use catalog_core::error::{AppError, ErrorKind};
use catalog_core::result::AppResult;
use catalog_entity::FileRecord;

/// Stores and discards the bytes behind a [`FileRecord`].
///
/// The catalog itself only keeps the relative path returned by
/// [`FileProcessor::store`].
#[async_trait]
pub trait FileProcessor: Send + Sync + 'static {
    /// Persist `payload` for `record`. Returns the path relative to the
    /// processor's root.
    async fn store(&self, record: &FileRecord, payload: Bytes) -> AppResult<String>;

    /// Remove previously stored bytes. Missing files are not an error.
    async fn discard(&self, relative_path: &str) -> AppResult<()>;
}

/// Writes files below a local root directory, grouped by upload month.
#[derive(Debug, Clone)]
pub struct LocalFileProcessor {
    root: PathBuf,
}

impl LocalFileProcessor {
    /// Create a processor rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create upload root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative path inside the root, refusing anything that
    /// would escape it.
    fn resolve(&self, relative_path: &str) -> AppResult<PathBuf> {
        let relative = Path::new(relative_path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::validation(format!(
                "Invalid storage path '{relative_path}'"
            )));
        }
        Ok(self.root.join(relative))
    }
}

/// `{yyyy}/{mm}/{file_name}` for a record.
fn relative_path_for(record: &FileRecord) -> String {
    format!(
        "{}/{}",
        record.created_at.format("%Y/%m"),
        record.file_name
    )
}

#[async_trait]
impl FileProcessor for LocalFileProcessor {
    async fn store(&self, record: &FileRecord, payload: Bytes) -> AppResult<String> {
        let relative = relative_path_for(record);
        let full_path = self.resolve(&relative)?;
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create directory: {}", parent.display()),
                    e,
                )
            })?;
        }

        fs::write(&full_path, &payload).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write file: {relative}"),
                e,
            )
        })?;

        debug!(path = %relative, bytes = payload.len(), "Stored attachment bytes");
        Ok(relative)
    }

    async fn discard(&self, relative_path: &str) -> AppResult<()> {
        let full_path = self.resolve(relative_path)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => {
                debug!(path = %relative_path, "Discarded attachment bytes");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete file: {relative_path}"),
                e,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_and_discard() {
        let dir = tempfile::tempdir().unwrap();
        let processor = LocalFileProcessor::new(dir.path()).await.unwrap();
        let record = FileRecord::new("brochure.pdf", None, 5, None);

        let relative = processor
            .store(&record, Bytes::from_static(b"hello"))
            .await
            .unwrap();
        assert!(relative.ends_with(&record.file_name));
        let written = tokio::fs::read(dir.path().join(&relative)).await.unwrap();
        assert_eq!(written, b"hello");

        processor.discard(&relative).await.unwrap();
        assert!(!dir.path().join(&relative).exists());
        processor.discard(&relative).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let processor = LocalFileProcessor::new(dir.path()).await.unwrap();
        let err = processor.discard("../outside.txt").await.unwrap_err();
        assert!(err.is(ErrorKind::Validation));
    }
}
