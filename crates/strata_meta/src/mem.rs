//! In-memory metadata store with snapshot persistence.

use crate::store::{MetaError, MetaResult, MetaStore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use strata_core::{ActionRecord, CmdletId, CmdletRecord, CmdletState, FileCompressionInfo};

/// All tables in one snapshot-able struct. BTreeMaps keep id order, which
/// is submission order because ids are allocated monotonically.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Tables {
    cmdlets: BTreeMap<u64, CmdletRecord>,
    actions: BTreeMap<u64, ActionRecord>,
    compression: HashMap<String, FileCompressionInfo>,
}

/// In-process reference implementation of [`MetaStore`].
///
/// Tables live behind one `RwLock`; [`MemMetaStore::save`] and
/// [`MemMetaStore::load`] snapshot them with postcard so tests can
/// simulate a process restart against durable state.
pub struct MemMetaStore {
    tables: RwLock<Tables>,
    ready: AtomicBool,
}

impl MemMetaStore {
    /// Create an empty store, ready immediately
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            ready: AtomicBool::new(true),
        }
    }

    /// Flip the readiness signal the safe-mode controller watches
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Snapshot all tables to `path` (postcard encoding)
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the file write fails.
    pub fn save(&self, path: &Path) -> MetaResult<()> {
        let tables = self.tables.read().unwrap();
        let bytes = postcard::to_allocvec(&*tables).map_err(|e| MetaError::Encoding {
            reason: e.to_string(),
        })?;
        fs::write(path, bytes)?;
        tracing::debug!(path = %path.display(), "metadata snapshot written");
        Ok(())
    }

    /// Restore a store from a snapshot written by [`MemMetaStore::save`]
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn load(path: &Path) -> MetaResult<Self> {
        let bytes = fs::read(path)?;
        let tables: Tables = postcard::from_bytes(&bytes).map_err(|e| MetaError::Encoding {
            reason: e.to_string(),
        })?;
        Ok(Self {
            tables: RwLock::new(tables),
            ready: AtomicBool::new(true),
        })
    }
}

impl Default for MemMetaStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaStore for MemMetaStore {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn insert_cmdlet(&self, record: &CmdletRecord) -> MetaResult<()> {
        let mut tables = self.tables.write().unwrap();
        tables.cmdlets.insert(record.id.as_u64(), record.clone());
        Ok(())
    }

    fn update_cmdlet(&self, record: &CmdletRecord) -> MetaResult<()> {
        self.insert_cmdlet(record)
    }

    fn get_cmdlet(&self, id: CmdletId) -> MetaResult<Option<CmdletRecord>> {
        let tables = self.tables.read().unwrap();
        Ok(tables.cmdlets.get(&id.as_u64()).cloned())
    }

    fn cmdlets_in_state(&self, state: CmdletState) -> MetaResult<Vec<CmdletRecord>> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .cmdlets
            .values()
            .filter(|r| r.state == state)
            .cloned()
            .collect())
    }

    fn max_cmdlet_id(&self) -> MetaResult<u64> {
        let tables = self.tables.read().unwrap();
        Ok(tables.cmdlets.keys().next_back().copied().unwrap_or(0))
    }

    fn insert_actions(&self, records: &[ActionRecord]) -> MetaResult<()> {
        let mut tables = self.tables.write().unwrap();
        for record in records {
            tables.actions.insert(record.id.as_u64(), record.clone());
        }
        Ok(())
    }

    fn update_action(&self, record: &ActionRecord) -> MetaResult<()> {
        let mut tables = self.tables.write().unwrap();
        tables.actions.insert(record.id.as_u64(), record.clone());
        Ok(())
    }

    fn actions_for_cmdlet(&self, id: CmdletId) -> MetaResult<Vec<ActionRecord>> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .actions
            .values()
            .filter(|r| r.cmdlet_id == id)
            .cloned()
            .collect())
    }

    fn max_action_id(&self) -> MetaResult<u64> {
        let tables = self.tables.read().unwrap();
        Ok(tables.actions.keys().next_back().copied().unwrap_or(0))
    }

    fn put_compression_info(&self, info: &FileCompressionInfo) -> MetaResult<()> {
        let mut tables = self.tables.write().unwrap();
        tables.compression.insert(info.path.clone(), info.clone());
        Ok(())
    }

    fn compression_info(&self, path: &str) -> MetaResult<Option<FileCompressionInfo>> {
        let tables = self.tables.read().unwrap();
        Ok(tables.compression.get(path).cloned())
    }

    fn delete_compression_info(&self, path: &str) -> MetaResult<()> {
        let mut tables = self.tables.write().unwrap();
        tables.compression.remove(path);
        Ok(())
    }
}
