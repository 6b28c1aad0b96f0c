// # History Store Trait
//
// Defines the interface for the persisted last-seen-version snapshot.
//
// ## Purpose
//
// The history store is what turns a poll into a diff: it remembers, per
// platform, the last version token seen for each title. The reconciler reads
// it before deciding anything and writes it back only after a notification
// is confirmed delivered (or on silent first-sight recording).
//
// ## Lifecycle
//
// Loaded once at process start, mutated in memory during the run, persisted
// at most once at the end of the run, and only when something changed and
// persistence is not suppressed by the debug flag.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::platform::Platform;

/// The serialized history shape.
///
/// All four platform keys are always present, even when empty; the typed
/// struct with defaulted maps guarantees that on both load and save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    #[serde(default)]
    pub battle: BTreeMap<String, String>,
    #[serde(default)]
    pub prospero: BTreeMap<String, String>,
    #[serde(default)]
    pub orbis: BTreeMap<String, String>,
    #[serde(default)]
    pub steam: BTreeMap<String, String>,
}

impl HistorySnapshot {
    /// Borrow the map for one platform.
    pub fn platform(&self, platform: Platform) -> &BTreeMap<String, String> {
        match platform {
            Platform::Battlenet => &self.battle,
            Platform::Prospero => &self.prospero,
            Platform::Orbis => &self.orbis,
            Platform::Steam => &self.steam,
        }
    }

    /// Mutably borrow the map for one platform.
    pub fn platform_mut(&mut self, platform: Platform) -> &mut BTreeMap<String, String> {
        match platform {
            Platform::Battlenet => &mut self.battle,
            Platform::Prospero => &mut self.prospero,
            Platform::Orbis => &mut self.orbis,
            Platform::Steam => &mut self.steam,
        }
    }

    /// Total number of tracked entries across all platforms.
    pub fn len(&self) -> usize {
        Platform::ALL
            .iter()
            .map(|p| self.platform(*p).len())
            .sum()
    }

    /// Whether no entries exist on any platform.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Trait for history store implementations
///
/// Implementations must be thread-safe; the reconciler itself is strictly
/// sequential, but the store is shared behind a boxed trait object.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Get the last seen version for a title.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(version))`: the title has been seen before
    /// - `Ok(None)`: previously untracked
    /// - `Err(Error)`: storage error
    async fn get(&self, platform: Platform, title_id: &str) -> crate::Result<Option<String>>;

    /// Record a version for a title.
    ///
    /// Mutates in-memory state only and marks the store dirty; nothing is
    /// persisted until [`save`](HistoryStore::save).
    async fn set(
        &self,
        platform: Platform,
        title_id: &str,
        version: &str,
    ) -> crate::Result<()>;

    /// Whether any mutation happened since load.
    async fn is_dirty(&self) -> bool;

    /// Persist the snapshot.
    ///
    /// A no-op (logged) when `suppress` is true. Persistence failure is fatal
    /// to the run: the process must not exit silently having lost state.
    async fn save(&self, suppress: bool) -> crate::Result<()>;

    /// Clone the current in-memory snapshot (used by tests and diagnostics).
    async fn snapshot(&self) -> HistorySnapshot;
}
