//! Directory scanner producing ground truth from the storage backend
//!
//! Walks the two-level layout `<componentsDir>/<component>/<version>` with
//! a bounded fan-out over the per-component version listings. Any listing
//! failure aborts the whole scan: an incomplete listing treated as
//! authoritative would evict genuinely published versions from the
//! snapshot.

use std::future::Future;
use std::pin::Pin;

use futures::stream::{FuturesUnordered, StreamExt};
use log::debug;

use super::snapshot::ComponentVersions;
use crate::error::StorageError;
use crate::storage::StorageAdapter;

/// Type alias for boxed version-listing futures
type VersionsFuture<'a> =
    Pin<Box<dyn Future<Output = (String, Result<Vec<String>, StorageError>)> + Send + 'a>>;

fn list_versions<'a>(
    storage: &'a dyn StorageAdapter,
    components_dir: &'a str,
    name: String,
) -> VersionsFuture<'a> {
    Box::pin(async move {
        let path = format!("{components_dir}/{name}");
        let result = storage.list_subdirectories(&path).await;
        (name, result)
    })
}

/// Scan the storage backend for all published components and versions.
///
/// Version listings run with at most `max_concurrent_requests()` in flight.
/// Version order within a component is the adapter's listing order.
pub async fn scan(
    storage: &dyn StorageAdapter,
    components_dir: &str,
) -> Result<ComponentVersions, StorageError> {
    let names = storage.list_subdirectories(components_dir).await?;
    let max_concurrent = storage.max_concurrent_requests().max(1);

    debug!(
        "scanning {} components under {} with max {} concurrent listings",
        names.len(),
        components_dir,
        max_concurrent
    );

    let mut futures: FuturesUnordered<VersionsFuture<'_>> = FuturesUnordered::new();
    let mut pending = names.into_iter();

    // Seed initial batch up to the adapter's ceiling
    for name in pending.by_ref().take(max_concurrent) {
        futures.push(list_versions(storage, components_dir, name));
    }

    let mut components = ComponentVersions::new();
    while let Some((name, result)) = futures.next().await {
        let versions = result?;
        debug!("component {} has {} versions", name, versions.len());
        if !versions.is_empty() {
            components.insert(name, versions);
        }

        if let Some(next) = pending.next() {
            futures.push(list_versions(storage, components_dir, next));
        }
    }

    Ok(components)
}
