//! In-memory storage adapter
//!
//! Backend for embedded and test registries. Holds documents in a plain
//! map and derives directory listings from the stored keys, including the
//! visibility flag so tests can assert what would be CDN-servable.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::RwLock;

use super::StorageAdapter;
use crate::error::StorageError;

/// A stored document with its visibility flag.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub data: String,
    pub is_public: bool,
}

/// In-memory [`StorageAdapter`] implementation.
pub struct InMemoryStorage {
    files: RwLock<BTreeMap<String, StoredFile>>,
    max_concurrent: usize,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            files: RwLock::new(BTreeMap::new()),
            max_concurrent: 10,
        }
    }

    /// Override the declared concurrency ceiling.
    pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    /// Seed a published component version by writing its package manifest,
    /// which is what makes the version directory visible to listings.
    pub fn add_component_version(&self, components_dir: &str, name: &str, version: &str) {
        let path = format!("{components_dir}/{name}/{version}/package.json");
        let manifest = format!(r#"{{"name":"{name}","version":"{version}"}}"#);
        self.insert(&path, &manifest, false);
    }

    /// Remove every stored document under a prefix.
    pub fn remove_prefix(&self, prefix: &str) {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        let with_slash = format!("{}/", prefix.trim_end_matches('/'));
        files.retain(|path, _| path != prefix && !path.starts_with(&with_slash));
    }

    /// Read back a stored document, for test assertions.
    pub fn file(&self, path: &str) -> Option<StoredFile> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.get(path).cloned()
    }

    fn insert(&self, path: &str, data: &str, is_public: bool) {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.insert(
            path.to_string(),
            StoredFile {
                data: data.to_string(),
                is_public,
            },
        );
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageAdapter for InMemoryStorage {
    async fn get_json(&self, path: &str) -> Result<Value, StorageError> {
        let data = self
            .file(path)
            .ok_or_else(|| StorageError::NotFound(path.to_string()))?
            .data;
        serde_json::from_str(&data).map_err(|err| StorageError::Malformed {
            path: path.to_string(),
            reason: err.to_string(),
        })
    }

    async fn list_subdirectories(&self, path: &str) -> Result<Vec<String>, StorageError> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());

        let mut names = Vec::new();
        for key in files.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            // Only entries that still have a path separator are directories.
            if let Some((first, _)) = rest.split_once('/') {
                if !names.iter().any(|n| n == first) {
                    names.push(first.to_string());
                }
            }
        }

        if names.is_empty() && !files.keys().any(|k| k.starts_with(&prefix)) {
            return Err(StorageError::NotFound(path.to_string()));
        }
        Ok(names)
    }

    async fn put_file_content(
        &self,
        data: &str,
        path: &str,
        is_public: bool,
    ) -> Result<(), StorageError> {
        self.insert(path, data, is_public);
        Ok(())
    }

    fn max_concurrent_requests(&self) -> usize {
        self.max_concurrent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_subdirectories_returns_immediate_children() {
        let storage = InMemoryStorage::new();
        storage.add_component_version("component", "hello-world", "1.0.0");
        storage.add_component_version("component", "hello-world", "1.0.2");
        storage.add_component_version("component", "navbar", "2.1.0");

        let names = storage.list_subdirectories("component").await.unwrap();
        assert_eq!(names, vec!["hello-world", "navbar"]);

        let versions = storage
            .list_subdirectories("component/hello-world")
            .await
            .unwrap();
        assert_eq!(versions, vec!["1.0.0", "1.0.2"]);
    }

    #[tokio::test]
    async fn test_list_subdirectories_missing_path() {
        let storage = InMemoryStorage::new();
        let err = storage.list_subdirectories("component").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_plain_files_are_not_directories() {
        let storage = InMemoryStorage::new();
        storage
            .put_file_content("{}", "component/components.json", true)
            .await
            .unwrap();
        storage.add_component_version("component", "hello-world", "1.0.0");

        let names = storage.list_subdirectories("component").await.unwrap();
        assert_eq!(names, vec!["hello-world"]);
    }

    #[tokio::test]
    async fn test_get_json_roundtrip() {
        let storage = InMemoryStorage::new();
        storage
            .put_file_content(r#"{"lastEdit":12345678,"components":{}}"#, "c/components.json", true)
            .await
            .unwrap();

        let value = storage.get_json("c/components.json").await.unwrap();
        assert_eq!(value["lastEdit"], 12345678);
        assert!(storage.file("c/components.json").unwrap().is_public);
    }

    #[tokio::test]
    async fn test_get_json_missing_and_malformed() {
        let storage = InMemoryStorage::new();
        assert!(storage.get_json("c/missing.json").await.unwrap_err().is_not_found());

        storage
            .put_file_content("not json", "c/broken.json", false)
            .await
            .unwrap();
        let err = storage.get_json("c/broken.json").await.unwrap_err();
        assert!(matches!(err, StorageError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_remove_prefix_evicts_versions() {
        let storage = InMemoryStorage::new();
        storage.add_component_version("component", "hello-world", "1.0.0");
        storage.add_component_version("component", "navbar", "1.0.0");

        storage.remove_prefix("component/hello-world");

        let names = storage.list_subdirectories("component").await.unwrap();
        assert_eq!(names, vec!["navbar"]);
    }
}
