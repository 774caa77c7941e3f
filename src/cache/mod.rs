//! Components cache: the in-memory index of published components
//!
//! Owns the current [`Snapshot`], drives the load/refresh lifecycle against
//! the storage backend, and schedules the polling loop. Readers (route
//! handlers, the publish pipeline) only ever see a fully reconciled
//! snapshot; a failed refresh keeps the previous one and is reported
//! through the injected [`EventEmitter`].

pub mod scanner;
pub mod snapshot;

use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use chrono::Utc;
use log::{debug, warn};
use serde_json::json;
use tokio::task::JoinHandle;

use crate::config::RegistryConfig;
use crate::error::Result;
use crate::events::EventEmitter;
use crate::storage::{StorageAdapter, components_list_path};
use snapshot::{Snapshot, reconcile};

/// Error code carried by `"error"` events fired on failed refreshes.
pub const CACHE_REFRESH_ERROR_CODE: &str = "components_cache_refresh";

fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Periodically refreshed cache of all published components and versions.
///
/// Constructed via [`ComponentsCache::load`], which fails if the backend
/// cannot be scanned: there is no cache without an initial ground truth.
/// Once built, [`get`](Self::get) never touches storage.
pub struct ComponentsCache {
    storage: Arc<dyn StorageAdapter>,
    events: Arc<EventEmitter>,
    components_dir: String,
    list_path: String,
    polling_interval: Duration,
    snapshot: RwLock<Snapshot>,
    /// Serializes refresh cycles so no two ever overlap
    refresh_lock: tokio::sync::Mutex<()>,
    /// At most one pending timer; arming always cancels the previous one
    refresh_timer: Mutex<Option<JoinHandle<()>>>,
    stopped: std::sync::atomic::AtomicBool,
    /// Handle to ourselves for the timer task; holding it weakly lets a
    /// dropped cache stop the polling loop
    weak_self: Weak<ComponentsCache>,
}

impl ComponentsCache {
    /// Initialise the cache from storage and arm the polling loop.
    ///
    /// Fetches the persisted snapshot from `<componentsDir>/components.json`
    /// (absence or a malformed document just means "no previous snapshot"),
    /// scans the backend for ground truth, reconciles, and persists the
    /// result publicly if it changed. Scan or persistence failure here is
    /// fatal: the surrounding registry must not start without a cache.
    pub async fn load(
        config: &RegistryConfig,
        storage: Arc<dyn StorageAdapter>,
        events: Arc<EventEmitter>,
    ) -> Result<Arc<Self>> {
        config.validate()?;

        let list_path = components_list_path(&config.components_dir);
        let previous = match storage.get_json(&list_path).await {
            Ok(value) => match serde_json::from_value::<Snapshot>(value) {
                Ok(snapshot) => Some(snapshot),
                Err(err) => {
                    warn!("ignoring malformed {}: {}", list_path, err);
                    None
                }
            },
            Err(err) => {
                if !err.is_not_found() {
                    warn!("could not fetch {}: {}", list_path, err);
                }
                None
            }
        };

        let ground_truth = scanner::scan(storage.as_ref(), &config.components_dir).await?;
        let (snapshot, changed) = reconcile(previous, ground_truth, unix_now());
        if changed {
            Self::persist(storage.as_ref(), &list_path, &snapshot).await?;
        }

        let cache = Arc::new_cyclic(|weak_self| Self {
            storage,
            events,
            components_dir: config.components_dir.clone(),
            list_path,
            polling_interval: Duration::from_secs(config.polling_interval),
            snapshot: RwLock::new(snapshot),
            refresh_lock: tokio::sync::Mutex::new(()),
            refresh_timer: Mutex::new(None),
            stopped: std::sync::atomic::AtomicBool::new(false),
            weak_self: weak_self.clone(),
        });
        cache.arm_refresh_timer();
        Ok(cache)
    }

    /// Current snapshot. Always the last successfully reconciled state,
    /// never a partial update; safe to call while a refresh is in flight.
    pub fn get(&self) -> Snapshot {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Run one refresh cycle and re-arm the polling timer.
    ///
    /// Never returns an error: a failed cycle (scan or persistence) fires
    /// one `"error"` event with code [`CACHE_REFRESH_ERROR_CODE`], leaves
    /// the in-memory snapshot unchanged, and still reschedules the next
    /// cycle. Stale-but-valid data beats no data during backend outages.
    pub async fn refresh(&self) {
        {
            let _serialized = self.refresh_lock.lock().await;
            if let Err(err) = self.run_refresh_cycle().await {
                let message = format!("components cache refresh failed: {err}");
                warn!("{}", message);
                self.events.fire(
                    "error",
                    json!({
                        "code": CACHE_REFRESH_ERROR_CODE,
                        "message": message,
                    }),
                );
            }
        }
        self.arm_refresh_timer();
    }

    /// Cancel the pending refresh timer and stop the polling loop.
    ///
    /// An in-flight refresh is left to finish; it will not re-arm.
    pub fn stop(&self) {
        self.stopped
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let mut slot = self
            .refresh_timer
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }

    async fn run_refresh_cycle(&self) -> Result<()> {
        let ground_truth = scanner::scan(self.storage.as_ref(), &self.components_dir).await?;
        let previous = self.get();
        let (snapshot, changed) = reconcile(Some(previous), ground_truth, unix_now());

        if changed {
            // Persist before exposing, so a write failure keeps readers on
            // the previous snapshot.
            Self::persist(self.storage.as_ref(), &self.list_path, &snapshot).await?;
            debug!(
                "components cache updated: {} components, lastEdit {}",
                snapshot.components.len(),
                snapshot.last_edit
            );
        }

        let mut current = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
        *current = snapshot;
        Ok(())
    }

    async fn persist(
        storage: &dyn StorageAdapter,
        path: &str,
        snapshot: &Snapshot,
    ) -> Result<()> {
        let body = snapshot.to_json_string()?;
        storage.put_file_content(&body, path, true).await?;
        Ok(())
    }

    fn arm_refresh_timer(&self) {
        let mut slot = self
            .refresh_timer
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        if self.stopped.load(std::sync::atomic::Ordering::SeqCst) {
            return;
        }

        let weak = self.weak_self.clone();
        let interval = self.polling_interval;
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            if let Some(cache) = weak.upgrade() {
                cache.refresh().await;
            }
        }));
    }

    #[cfg(test)]
    fn has_pending_timer(&self) -> bool {
        self.refresh_timer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

impl Drop for ComponentsCache {
    fn drop(&mut self) {
        self.stop();
    }
}
