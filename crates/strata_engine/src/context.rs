//! The engine context: one explicit object owning the manager, executor
//! pool, safe-mode controller, and store handles.

use crate::manager::CmdletManager;
use std::sync::Arc;
use std::time::Duration;
use strata_action::ActionRegistry;
use strata_core::{CmdletId, CmdletInfo, CmdletState, EngineResult, ServiceState};
use strata_meta::MetaStore;
use strata_store::StorageBackend;

/// Engine tuning knobs
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Executor pool size; total concurrency is bounded by this
    pub workers: usize,
    /// Dispatch queue capacity; `submit` fails beyond it
    pub queue_capacity: usize,
    /// Interval at which safe-mode re-checks collaborator readiness
    pub safemode_poll: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1024,
            safemode_poll: Duration::from_millis(100),
        }
    }
}

/// The storage-policy execution engine.
///
/// Constructed once at startup and passed explicitly to request handlers;
/// there are no ambient singletons. Dropping the engine shuts the pool
/// down and joins every worker.
pub struct Engine {
    storage: Arc<dyn StorageBackend>,
    meta: Arc<dyn MetaStore>,
    manager: CmdletManager,
}

impl Engine {
    /// Start an engine over the given collaborators.
    ///
    /// The service begins in safe mode; submissions queue until both the
    /// storage backend and the metadata store report ready.
    ///
    /// # Errors
    ///
    /// Returns an error if startup reconciliation or thread spawning fails.
    pub fn start(
        config: EngineConfig,
        storage: Arc<dyn StorageBackend>,
        meta: Arc<dyn MetaStore>,
        registry: ActionRegistry,
    ) -> EngineResult<Self> {
        let manager = CmdletManager::start(
            config,
            Arc::clone(&storage),
            Arc::clone(&meta),
            Arc::new(registry),
        )?;
        Ok(Self {
            storage,
            meta,
            manager,
        })
    }

    /// Submit a cmdlet spec; see [`CmdletManager::submit`]
    ///
    /// # Errors
    ///
    /// Propagates parse, validation, and capacity errors synchronously.
    pub fn submit(&self, spec: &str) -> EngineResult<CmdletId> {
        self.manager.submit(spec)
    }

    /// Latest state snapshot of a cmdlet; see [`CmdletManager::info`]
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown ids.
    pub fn info(&self, id: CmdletId) -> EngineResult<CmdletInfo> {
        self.manager.info(id)
    }

    /// Best-effort cancellation; see [`CmdletManager::cancel`]
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown ids.
    pub fn cancel(&self, id: CmdletId) -> EngineResult<()> {
        self.manager.cancel(id)
    }

    /// Block until terminal or timeout; see [`CmdletManager::wait`]
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown ids.
    pub fn wait(&self, id: CmdletId, timeout: Duration) -> EngineResult<CmdletState> {
        self.manager.wait(id, timeout)
    }

    /// Current service state
    #[must_use]
    pub fn service_state(&self) -> ServiceState {
        self.manager.service_state()
    }

    /// The storage backend this engine executes against
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn StorageBackend> {
        &self.storage
    }

    /// The metadata store this engine records into
    #[must_use]
    pub fn meta(&self) -> &Arc<dyn MetaStore> {
        &self.meta
    }

    /// Stop dispatch and join the pool; idempotent, also runs on drop
    pub fn shutdown(&self) {
        self.manager.shutdown();
    }
}
