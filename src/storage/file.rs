//! Local filesystem storage adapter
//!
//! Used by dev-mode registries that publish to a directory on disk. The
//! `is_public` flag has no meaning on a local filesystem and is ignored.

use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::StorageAdapter;
use crate::error::StorageError;

/// Default concurrency ceiling for local disk access.
const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 20;

/// Filesystem-backed [`StorageAdapter`] rooted at a base directory.
pub struct FileSystemStorage {
    root: PathBuf,
    max_concurrent: usize,
}

impl FileSystemStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_concurrent: DEFAULT_MAX_CONCURRENT_REQUESTS,
        }
    }

    /// Override the declared concurrency ceiling.
    pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let mut full = self.root.clone();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            full.push(segment);
        }
        full
    }

    fn map_io_error(err: std::io::Error, path: &str) -> StorageError {
        if err.kind() == ErrorKind::NotFound {
            StorageError::NotFound(path.to_string())
        } else {
            StorageError::Backend(format!("{path}: {err}"))
        }
    }
}

#[async_trait]
impl StorageAdapter for FileSystemStorage {
    async fn get_json(&self, path: &str) -> Result<Value, StorageError> {
        let full = self.resolve(path);
        let contents = tokio::fs::read_to_string(&full)
            .await
            .map_err(|err| Self::map_io_error(err, path))?;
        serde_json::from_str(&contents).map_err(|err| StorageError::Malformed {
            path: path.to_string(),
            reason: err.to_string(),
        })
    }

    async fn list_subdirectories(&self, path: &str) -> Result<Vec<String>, StorageError> {
        let full = self.resolve(path);
        let mut entries = tokio::fs::read_dir(&full)
            .await
            .map_err(|err| Self::map_io_error(err, path))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| Self::map_io_error(err, path))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|err| Self::map_io_error(err, path))?;
            if file_type.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        // read_dir order is platform dependent; keep listings stable.
        names.sort();
        Ok(names)
    }

    async fn put_file_content(
        &self,
        data: &str,
        path: &str,
        _is_public: bool,
    ) -> Result<(), StorageError> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| StorageError::Write {
                    path: path.to_string(),
                    reason: err.to_string(),
                })?;
        }
        tokio::fs::write(&full, data)
            .await
            .map_err(|err| StorageError::Write {
                path: path.to_string(),
                reason: err.to_string(),
            })
    }

    fn max_concurrent_requests(&self) -> usize {
        self.max_concurrent
    }
}
