//! Snapshot of published components and the reconciliation algorithm
//!
//! The snapshot is the canonical index of everything published to storage:
//! a `lastEdit` Unix timestamp plus a map of component name to version
//! list. Reconciliation compares a previous snapshot with freshly scanned
//! ground truth and only mints a new snapshot (and a new `lastEdit`) when
//! the content genuinely changed.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Component name to ordered version list.
///
/// Version order is the storage backend's listing order, never re-sorted.
/// A component with no versions is never present.
pub type ComponentVersions = BTreeMap<String, Vec<String>>;

/// Canonical index of published components, persisted to storage as
/// `components.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Unix seconds of the last content change, not the last scan
    #[serde(rename = "lastEdit")]
    pub last_edit: i64,

    /// Published component versions
    pub components: ComponentVersions,
}

impl Snapshot {
    /// Serialize for persistence to the storage backend.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Compare a previous snapshot against scanned ground truth.
///
/// Returns the effective snapshot plus whether the content changed. If the
/// component/version sets are equal the previous snapshot is returned as is,
/// preserving its `last_edit`; otherwise a new snapshot is stamped with
/// `now` (Unix seconds).
pub fn reconcile(
    previous: Option<Snapshot>,
    ground_truth: ComponentVersions,
    now: i64,
) -> (Snapshot, bool) {
    match previous {
        Some(prev) if same_contents(&prev.components, &ground_truth) => (prev, false),
        _ => (
            Snapshot {
                last_edit: now,
                components: ground_truth,
            },
            true,
        ),
    }
}

/// Set-of-sets equality: same component names, and per component the same
/// version set. Listing order is not stable between scans, so version
/// lists are compared as sets.
fn same_contents(a: &ComponentVersions, b: &ComponentVersions) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|(name, versions)| {
        b.get(name).is_some_and(|other| {
            let lhs: HashSet<&str> = versions.iter().map(String::as_str).collect();
            let rhs: HashSet<&str> = other.iter().map(String::as_str).collect();
            lhs == rhs
        })
    })
}
