// # Memory History Store
//
// In-memory implementation of HistoryStore.
//
// ## Purpose
//
// Provides a history store with no persistence, for tests and throwaway
// runs. Every title looks previously-untracked on the first cycle, so a run
// against this store records first-sights silently and notifies nothing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::platform::Platform;
use crate::traits::history_store::{HistorySnapshot, HistoryStore};

/// In-memory history store implementation
#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    state: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    snapshot: HistorySnapshot,
    dirty: bool,
}

impl MemoryHistoryStore {
    /// Create a new empty memory history store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a snapshot (for tests).
    pub fn with_snapshot(snapshot: HistorySnapshot) -> Self {
        Self {
            state: Arc::new(RwLock::new(Inner {
                snapshot,
                dirty: false,
            })),
        }
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn get(&self, platform: Platform, title_id: &str) -> crate::Result<Option<String>> {
        let guard = self.state.read().await;
        Ok(guard.snapshot.platform(platform).get(title_id).cloned())
    }

    async fn set(
        &self,
        platform: Platform,
        title_id: &str,
        version: &str,
    ) -> crate::Result<()> {
        let mut guard = self.state.write().await;
        guard
            .snapshot
            .platform_mut(platform)
            .insert(title_id.to_string(), version.to_string());
        guard.dirty = true;
        Ok(())
    }

    async fn is_dirty(&self) -> bool {
        self.state.read().await.dirty
    }

    async fn save(&self, suppress: bool) -> crate::Result<()> {
        if suppress {
            tracing::warn!("debug is active, not saving title history");
        }
        // Nothing to persist either way.
        Ok(())
    }

    async fn snapshot(&self) -> HistorySnapshot {
        self.state.read().await.snapshot.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_and_get() {
        let store = MemoryHistoryStore::new();

        assert_eq!(store.get(Platform::Orbis, "CUSA05678").await.unwrap(), None);
        assert!(!store.is_dirty().await);

        store.set(Platform::Orbis, "CUSA05678", "1.52").await.unwrap();

        assert_eq!(
            store.get(Platform::Orbis, "CUSA05678").await.unwrap(),
            Some("1.52".to_string())
        );
        assert!(store.is_dirty().await);
    }

    #[tokio::test]
    async fn platforms_do_not_share_entries() {
        let store = MemoryHistoryStore::new();
        store.set(Platform::Prospero, "PPSA01234", "01.000.000").await.unwrap();

        assert_eq!(store.get(Platform::Orbis, "PPSA01234").await.unwrap(), None);
    }
}
