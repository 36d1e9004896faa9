/// Database handle: the record store behind a lock, plus an optional snapshot file
///
/// Mutations take the write lock for their whole duration, so a search never
/// sees a half-cleared collection. If the snapshot cannot be opened the
/// handle keeps working in memory and never touches the disk again.

use crate::db::store::RecordStore;
use crate::error::{Result, SearchError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Database wrapper around the in-memory store
pub struct Database {
    store: RwLock<RecordStore>,
    snapshot_path: Option<PathBuf>,
}

impl Database {
    /// Open a database backed by a JSON snapshot at `path`
    ///
    /// Creates the parent directory and loads the snapshot if there is one.
    ///
    /// # Returns
    /// * `Ok(Database)` - Loaded (or fresh) persistent database
    /// * `Err(SearchError::StoreInit)` - If the directory or snapshot is unusable
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let store = Self::load_snapshot(&path).map_err(|e| SearchError::StoreInit {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        tracing::debug!(
            path = %path.display(),
            commands = store.command_count(),
            list_items = store.list_count(),
            "record store opened"
        );

        Ok(Self {
            store: RwLock::new(store),
            snapshot_path: Some(path),
        })
    }

    /// Open a database, falling back to memory if the snapshot is unusable
    ///
    /// The initialization error is handed back once so the caller can report
    /// it; the returned database is usable either way.
    pub fn open_or_degrade<P: AsRef<Path>>(path: P) -> (Self, Option<SearchError>) {
        match Self::open(path) {
            Ok(db) => (db, None),
            Err(e) => {
                tracing::debug!(error = %e, "record store unavailable, continuing in memory");
                (Self::in_memory(), Some(e))
            }
        }
    }

    /// Database that never touches disk
    pub fn in_memory() -> Self {
        Self {
            store: RwLock::new(RecordStore::new()),
            snapshot_path: None,
        }
    }

    fn load_snapshot(path: &Path) -> Result<RecordStore> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if !path.exists() {
            return Ok(RecordStore::new());
        }

        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Snapshot file location, if this database is persistent
    pub fn path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    pub fn is_persistent(&self) -> bool {
        self.snapshot_path.is_some()
    }

    /// Shared read access to the current store snapshot
    pub fn read(&self) -> RwLockReadGuard<'_, RecordStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RecordStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a mutation under the write lock, then persist the result
    pub(crate) fn mutate<T>(&self, f: impl FnOnce(&mut RecordStore) -> T) -> T {
        let mut store = self.write();
        let out = f(&mut store);
        self.persist(&store);
        out
    }

    fn persist(&self, store: &RecordStore) {
        let Some(path) = &self.snapshot_path else {
            return;
        };

        let result = serde_json::to_vec_pretty(store)
            .map_err(SearchError::from)
            .and_then(|bytes| {
                let tmp = path.with_extension("json.tmp");
                fs::write(&tmp, bytes)?;
                fs::rename(&tmp, path)?;
                Ok(())
            });

        match result {
            Ok(()) => tracing::debug!(
                path = %path.display(),
                commands = store.command_count(),
                list_items = store.list_count(),
                "snapshot saved"
            ),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to save snapshot"),
        }
    }

    /// Get database statistics
    pub fn stats(&self) -> DatabaseStats {
        let store = self.read();
        DatabaseStats {
            total_commands: store.command_count(),
            total_list_items: store.list_count(),
            distinct_lists: store.list_names().len(),
            persistent: self.is_persistent(),
        }
    }
}

/// Database statistics
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseStats {
    pub total_commands: usize,
    pub total_list_items: usize,
    pub distinct_lists: usize,
    pub persistent: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{CommandInput, ListItemInput};
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_directory() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("index.json");

        let db = Database::open(&path).unwrap();
        assert!(db.is_persistent());
        assert!(path.parent().unwrap().exists());
        assert_eq!(db.stats().total_commands, 0);
    }

    #[test]
    fn test_snapshot_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.json");

        {
            let db = Database::open(&path).unwrap();
            db.insert_command(CommandInput::new("open", "key(ctrl-o)", "/user/a/f.talon"));
            db.insert_list_item(ListItemInput::new("user.emoji", "angry", "😠"));
        }

        let db = Database::open(&path).unwrap();
        let stats = db.stats();
        assert_eq!(stats.total_commands, 1);
        assert_eq!(stats.total_list_items, 1);
        assert_eq!(stats.distinct_lists, 1);
        assert_eq!(db.insert_command(CommandInput::new("close", "", "/f")), 2);
    }

    #[test]
    fn test_corrupt_snapshot_is_init_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.json");
        fs::write(&path, "{ not json").unwrap();

        match Database::open(&path) {
            Err(SearchError::StoreInit { .. }) => {}
            Err(e) => panic!("Expected StoreInit error, got {:?}", e),
            Ok(_) => panic!("Expected StoreInit error"),
        }
    }

    #[test]
    fn test_degraded_database_still_works() {
        let temp = TempDir::new().unwrap();
        // A file where the parent directory should be
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let (db, err) = Database::open_or_degrade(blocker.join("index.json"));
        assert!(err.is_some());
        assert!(!db.is_persistent());
        assert_eq!(db.command_count(), 0);

        db.insert_command(CommandInput::new("open", "", "/f"));
        assert_eq!(db.command_count(), 1);
    }

    #[test]
    fn test_in_memory_has_no_path() {
        let db = Database::in_memory();
        assert!(db.path().is_none());
        assert!(!db.stats().persistent);
    }

    #[test]
    fn test_readers_never_see_half_refreshed_store() {
        let batch = |n: usize| -> Vec<CommandInput> {
            (0..n)
                .map(|i| CommandInput::new(&format!("cmd {}", i), "", "/f"))
                .collect()
        };

        let db = Arc::new(Database::in_memory());
        db.insert_commands_batch(batch(50));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let db = Arc::clone(&db);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let count = db.command_count();
                        assert!(count == 50 || count == 20, "saw {} commands", count);
                    }
                })
            })
            .collect();

        for round in 0..100 {
            let size = if round % 2 == 0 { 20 } else { 50 };
            db.refresh_commands_batch(batch(size));
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }
}
