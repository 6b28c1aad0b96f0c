// # File History Store
//
// File-based implementation of HistoryStore.
//
// ## File Format
//
// ```json
// {
//   "battle": { "pro": "2.5.0.93232" },
//   "prospero": { "PPSA01234": "01.000.000" },
//   "orbis": {},
//   "steam": { "1938090": "13066848" }
// }
// ```
//
// All four platform keys are always present. On first run the empty skeleton
// is written out immediately, so operators can seed the file by hand.
//
// ## Durability
//
// - Mutations are in-memory; one guarded write happens at the end of a run
// - Atomic writes: new state goes to a temporary file, then a rename
// - A corrupt or unreadable file is fatal; silently dropping history would
//   cause a notification storm on the next successful save

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::platform::Platform;
use crate::traits::history_store::{HistorySnapshot, HistoryStore};

/// File-based history store
///
/// # Example
///
/// ```rust,no_run
/// use patchwatch_core::history::FileHistoryStore;
/// use patchwatch_core::traits::HistoryStore;
/// use patchwatch_core::Platform;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileHistoryStore::load("history.json").await?;
///
///     store.set(Platform::Steam, "1938090", "13066848").await?;
///     store.save(false).await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileHistoryStore {
    path: PathBuf,
    state: Arc<RwLock<Inner>>,
}

#[derive(Debug)]
struct Inner {
    snapshot: HistorySnapshot,
    dirty: bool,
}

impl FileHistoryStore {
    /// Load the history file, creating an empty skeleton if it is absent.
    ///
    /// # Errors
    ///
    /// An unreadable or unparsable file is an error; callers treat it as
    /// fatal and exit non-zero rather than overwrite state they cannot read.
    pub async fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::history(format!(
                    "failed to create history directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let snapshot = if path.exists() {
            let content = fs::read_to_string(&path).await.map_err(|e| {
                Error::history(format!(
                    "failed to read history file {}: {}",
                    path.display(),
                    e
                ))
            })?;

            let snapshot: HistorySnapshot = serde_json::from_str(&content).map_err(|e| {
                Error::history(format!(
                    "failed to parse history file {}: {}",
                    path.display(),
                    e
                ))
            })?;

            tracing::debug!("loaded title history: {} entries", snapshot.len());
            snapshot
        } else {
            // First run: persist the skeleton immediately so all four
            // platform keys exist on disk from the start.
            let snapshot = HistorySnapshot::default();
            write_snapshot(&path, &snapshot).await?;

            tracing::info!("title history not found, created empty file");
            snapshot
        };

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(Inner {
                snapshot,
                dirty: false,
            })),
        })
    }
}

/// Write the snapshot atomically (temp file, then rename).
async fn write_snapshot(path: &Path, snapshot: &HistorySnapshot) -> crate::Result<()> {
    let json = serde_json::to_string_pretty(snapshot)
        .map_err(|e| Error::history(format!("failed to serialize history: {}", e)))?;

    let mut temp_path = path.to_path_buf();
    temp_path.set_extension("tmp");

    {
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            Error::history(format!(
                "failed to create temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        file.write_all(json.as_bytes()).await.map_err(|e| {
            Error::history(format!(
                "failed to write temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        file.flush().await.map_err(|e| {
            Error::history(format!(
                "failed to flush temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;
    }

    fs::rename(&temp_path, path).await.map_err(|e| {
        Error::history(format!(
            "failed to rename {} to {}: {}",
            temp_path.display(),
            path.display(),
            e
        ))
    })?;

    tracing::trace!("history written to {}", path.display());
    Ok(())
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
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
            return Ok(());
        }

        let snapshot = {
            let guard = self.state.read().await;
            if !guard.dirty {
                tracing::debug!("history unchanged, skipping save");
                return Ok(());
            }
            guard.snapshot.clone()
        };

        write_snapshot(&self.path, &snapshot).await?;

        let mut guard = self.state.write().await;
        guard.dirty = false;

        tracing::info!("saved title history ({} entries)", snapshot.len());
        Ok(())
    }

    async fn snapshot(&self) -> HistorySnapshot {
        self.state.read().await.snapshot.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_file_yields_skeleton_with_all_platforms() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");

        let store = FileHistoryStore::load(&path).await.unwrap();
        assert!(store.snapshot().await.is_empty());

        // Skeleton must be persisted immediately, with every platform key.
        let raw = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        for platform in Platform::ALL {
            assert!(json.get(platform.key()).is_some());
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");

        let store = FileHistoryStore::load(&path).await.unwrap();
        store
            .set(Platform::Steam, "1938090", "13066848")
            .await
            .unwrap();
        store
            .set(Platform::Battlenet, "pro", "2.5.0.93232")
            .await
            .unwrap();
        assert!(store.is_dirty().await);
        store.save(false).await.unwrap();

        let reloaded = FileHistoryStore::load(&path).await.unwrap();
        assert!(!reloaded.is_dirty().await);
        assert_eq!(
            reloaded.get(Platform::Steam, "1938090").await.unwrap(),
            Some("13066848".to_string())
        );
        assert_eq!(
            reloaded.get(Platform::Battlenet, "pro").await.unwrap(),
            Some("2.5.0.93232".to_string())
        );
        assert_eq!(store.snapshot().await, reloaded.snapshot().await);
    }

    #[tokio::test]
    async fn suppressed_save_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");

        let store = FileHistoryStore::load(&path).await.unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        store.set(Platform::Orbis, "CUSA05678", "1.52").await.unwrap();
        store.save(true).await.unwrap();

        let after = std::fs::read_to_string(&path).unwrap();
        assert_eq!(before, after);

        // The mutation is still pending in memory.
        assert!(store.is_dirty().await);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "not json").unwrap();

        let result = FileHistoryStore::load(&path).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn unchanged_store_skips_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");

        let store = FileHistoryStore::load(&path).await.unwrap();
        let before = std::fs::metadata(&path).unwrap().modified().unwrap();

        store.save(false).await.unwrap();

        let after = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }
}
