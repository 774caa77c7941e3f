//! Storage adapter boundary
//!
//! The registry treats its backend (S3, CDN, local filesystem) as a
//! pluggable adapter holding published component packages and the persisted
//! components list. Real backends live behind the [`StorageAdapter`] trait;
//! this crate ships an in-memory adapter and a local filesystem adapter for
//! dev-mode registries and tests.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;

pub mod file;
pub mod memory;
#[cfg(test)]
pub mod mock;

pub use file::FileSystemStorage;
pub use memory::InMemoryStorage;

/// Name of the persisted components list document.
pub const COMPONENTS_LIST_FILE: &str = "components.json";

/// Pluggable object-storage backend.
///
/// Paths are `/`-separated keys relative to the backend root. Adapters
/// declare how many concurrent requests they tolerate; callers fanning out
/// requests are responsible for staying below that ceiling.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Fetch and parse a JSON document. Fails with a distinguishable
    /// not-found error if the path does not exist.
    async fn get_json(&self, path: &str) -> Result<Value, StorageError>;

    /// List the immediate sub-entries of a directory-like path, in backend
    /// order.
    async fn list_subdirectories(&self, path: &str) -> Result<Vec<String>, StorageError>;

    /// Write a document. `is_public` marks it world-readable on backends
    /// that support visibility (CDN-servable artifacts).
    async fn put_file_content(
        &self,
        data: &str,
        path: &str,
        is_public: bool,
    ) -> Result<(), StorageError>;

    /// Maximum number of concurrent requests this adapter tolerates (>= 1).
    fn max_concurrent_requests(&self) -> usize;
}

/// Well-known path of the persisted components list.
pub fn components_list_path(components_dir: &str) -> String {
    format!(
        "{}/{}",
        components_dir.trim_end_matches('/'),
        COMPONENTS_LIST_FILE
    )
}
