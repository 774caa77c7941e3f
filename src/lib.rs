//! Registry core for versioned micro-frontend components
//!
//! Publishers push packaged components into an object-storage backend laid
//! out as `<componentsDir>/<component>/<version>`; this crate keeps an
//! in-memory, periodically refreshed index of everything published there so
//! the registry can answer listing and resolution queries without touching
//! the backend on every request.
//!
//! The index is reconciled against a full backend scan on a polling
//! interval and persisted back to storage as a publicly readable
//! `components.json`, which both accelerates cold starts and lets multiple
//! registry instances converge on the same view. Storage remains the sole
//! source of truth; refresh failures keep the last good snapshot and are
//! reported on the injected event bus.
//!
//! ```no_run
//! use std::sync::Arc;
//! use mfe_registry::{ComponentsCache, EventEmitter, RegistryConfig};
//! use mfe_registry::storage::FileSystemStorage;
//!
//! # async fn example() -> mfe_registry::Result<()> {
//! let config = RegistryConfig::new("components");
//! let storage = Arc::new(FileSystemStorage::new("/var/lib/registry"));
//! let events = Arc::new(EventEmitter::new());
//! events.on("error", |payload| {
//!     eprintln!("registry error: {payload}");
//!     Ok(())
//! });
//!
//! let cache = ComponentsCache::load(&config, storage, events).await?;
//! let snapshot = cache.get();
//! println!("{} components published", snapshot.components.len());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod storage;

pub use cache::snapshot::{ComponentVersions, Snapshot};
pub use cache::{CACHE_REFRESH_ERROR_CODE, ComponentsCache};
pub use config::RegistryConfig;
pub use error::{Error, Result, StorageError};
pub use events::EventEmitter;
pub use storage::StorageAdapter;
