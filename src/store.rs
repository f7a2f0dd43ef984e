//! The persistence collaborator.
//!
//! The engine talks to storage only through [`ProjectStore`]. Whatever sits
//! behind it (a REST service, a local database) owns durability and its own
//! validation; its failures come back as [`StoreError`] and the engine
//! passes them through untouched.

mod sqlite;

pub use sqlite::SqliteStore;

use std::io;

use crate::classify::CardStats;
use crate::model::{Priority, ProjectPatch, ProjectRecord};

/// Errors reported by a store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("project not found: {0}")]
    NotFound(String),

    #[error("project already exists: {0}")]
    AlreadyExists(String),

    /// The store refused the write on its own validation.
    #[error("rejected by store: {0}")]
    Rejected(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = core::result::Result<T, StoreError>;

/// Durable storage for project records.
pub trait ProjectStore {
    /// Every project, in no guaranteed order.
    fn list(&self) -> Result<Vec<ProjectRecord>>;

    fn get(&self, pid: &str) -> Result<ProjectRecord>;

    fn create(&self, record: &ProjectRecord) -> Result<()>;

    /// Apply a partial update and return the record as stored afterwards.
    fn update(&self, pid: &str, patch: &ProjectPatch) -> Result<ProjectRecord>;

    fn set_priority(&self, pid: &str, priority: Option<Priority>) -> Result<ProjectRecord>;

    /// Set or clear priority on every listed project, all or nothing.
    ///
    /// Returns the number of projects updated.
    fn set_priority_bulk(&self, pids: &[String], priority: Option<Priority>) -> Result<usize>;

    /// Card counts as computed by the store.
    fn card_stats(&self) -> Result<CardStats>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! A scriptable store for exercising failure and conflict paths.

    use std::cell::Cell;

    use tempfile::TempDir;

    use super::*;

    pub(crate) struct ScriptedStore {
        _dir: TempDir,
        pub inner: SqliteStore,
        /// Every call fails as if the connection dropped.
        pub offline: Cell<bool>,
        /// Another operator's priority that lands alongside ours.
        pub concurrent_priority: Cell<Option<Option<Priority>>>,
    }

    impl ScriptedStore {
        pub fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let inner = SqliteStore::open(&dir.path().join("projects.sqlite")).unwrap();
            Self {
                _dir: dir,
                inner,
                offline: Cell::new(false),
                concurrent_priority: Cell::new(None),
            }
        }

        fn reachable(&self) -> Result<()> {
            if self.offline.get() {
                return Err(StoreError::Io(io::Error::other("connection reset")));
            }
            Ok(())
        }
    }

    impl ProjectStore for ScriptedStore {
        fn list(&self) -> Result<Vec<ProjectRecord>> {
            self.reachable()?;
            self.inner.list()
        }

        fn get(&self, pid: &str) -> Result<ProjectRecord> {
            self.reachable()?;
            self.inner.get(pid)
        }

        fn create(&self, record: &ProjectRecord) -> Result<()> {
            self.reachable()?;
            self.inner.create(record)
        }

        fn update(&self, pid: &str, patch: &ProjectPatch) -> Result<ProjectRecord> {
            self.reachable()?;
            self.inner.update(pid, patch)
        }

        fn set_priority(&self, pid: &str, priority: Option<Priority>) -> Result<ProjectRecord> {
            self.reachable()?;
            let winner = self.concurrent_priority.get().unwrap_or(priority);
            self.inner.set_priority(pid, winner)
        }

        fn set_priority_bulk(&self, pids: &[String], priority: Option<Priority>) -> Result<usize> {
            self.reachable()?;
            self.inner.set_priority_bulk(pids, priority)
        }

        fn card_stats(&self) -> Result<CardStats> {
            self.reachable()?;
            self.inner.card_stats()
        }
    }
}
