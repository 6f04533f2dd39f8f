//! Cmdlet manager: submission, the cmdlet state machine, and the bounded
//! dispatch queue the executor pool pulls from.

use crate::context::EngineConfig;
use crate::parse::parse_cmdlet;
use crate::pool;
use crate::safemode::SafeModeController;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use strata_action::args::FILE_PARAM;
use strata_action::{ActionArgs, ActionRegistry, CancelToken};
use strata_core::{
    ActionId, ActionRecord, ActionState, CmdletId, CmdletInfo, CmdletRecord, CmdletState,
    EngineError, EngineResult, ServiceState,
};
use strata_meta::MetaStore;
use strata_store::StorageBackend;

/// One queued cmdlet with the files its actions target, for the
/// no-two-actions-on-one-file scheduling constraint.
pub(crate) struct QueueEntry {
    pub(crate) id: CmdletId,
    pub(crate) files: Vec<String>,
}

/// Mutable dispatch state behind the queue mutex
pub(crate) struct DispatchState {
    /// FIFO by submission order; workers may skip entries whose files are
    /// claimed by an in-flight cmdlet
    pub(crate) queue: VecDeque<QueueEntry>,
    /// Files claimed by in-flight cmdlets
    pub(crate) in_use: HashSet<String>,
    /// Set once at shutdown; workers drain out
    pub(crate) shutdown: bool,
}

/// State shared between the manager, the worker pool, and the safe-mode
/// watcher. One instance per engine; no ambient singletons.
pub(crate) struct Shared {
    pub(crate) config: EngineConfig,
    pub(crate) storage: Arc<dyn StorageBackend>,
    pub(crate) meta: Arc<dyn MetaStore>,
    pub(crate) registry: Arc<ActionRegistry>,
    pub(crate) safemode: Arc<SafeModeController>,
    pub(crate) dispatch: Mutex<DispatchState>,
    /// Signalled on enqueue, safe-mode exit, worker completion, shutdown
    pub(crate) work_ready: Condvar,
    /// Signalled on every terminal cmdlet transition
    pub(crate) terminal: Condvar,
    pub(crate) next_cmdlet_id: AtomicU64,
    pub(crate) next_action_id: AtomicU64,
    /// Cancellation tokens of in-flight cmdlets
    pub(crate) cancels: Mutex<HashMap<u64, CancelToken>>,
}

/// Owns the cmdlet lifecycle: parses and validates submissions, persists
/// every transition through the metadata store before it is observable,
/// queues runnable work FIFO under a capacity bound, and reconciles
/// interrupted work at startup.
pub struct CmdletManager {
    shared: Arc<Shared>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl CmdletManager {
    /// Start the manager: reconcile leftover records, then spawn the worker
    /// pool and the safe-mode watcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata store is unreadable or threads
    /// cannot be spawned.
    pub fn start(
        config: EngineConfig,
        storage: Arc<dyn StorageBackend>,
        meta: Arc<dyn MetaStore>,
        registry: Arc<ActionRegistry>,
    ) -> EngineResult<Self> {
        let next_cmdlet_id = meta.max_cmdlet_id()? + 1;
        let next_action_id = meta.max_action_id()? + 1;
        let workers = config.workers.max(1);

        let shared = Arc::new(Shared {
            config,
            storage,
            meta,
            registry,
            safemode: Arc::new(SafeModeController::new()),
            dispatch: Mutex::new(DispatchState {
                queue: VecDeque::new(),
                in_use: HashSet::new(),
                shutdown: false,
            }),
            work_ready: Condvar::new(),
            terminal: Condvar::new(),
            next_cmdlet_id: AtomicU64::new(next_cmdlet_id),
            next_action_id: AtomicU64::new(next_action_id),
            cancels: Mutex::new(HashMap::new()),
        });

        let manager = Self {
            shared: Arc::clone(&shared),
            threads: Mutex::new(Vec::new()),
        };
        manager.recover()?;

        {
            let mut threads = manager.threads.lock().unwrap();
            for idx in 0..workers {
                let worker_shared = Arc::clone(&shared);
                let handle = std::thread::Builder::new()
                    .name(format!("strata-worker-{}", idx))
                    .spawn(move || pool::run_worker(worker_shared, idx))?;
                threads.push(handle);
            }
            let watcher_shared = Arc::clone(&shared);
            let handle = std::thread::Builder::new()
                .name("strata-safemode".to_string())
                .spawn(move || watch_safemode(watcher_shared))?;
            threads.push(handle);
        }

        Ok(manager)
    }

    /// Parse, validate, persist, and enqueue a cmdlet; returns its id
    /// immediately, execution is asynchronous.
    ///
    /// # Errors
    ///
    /// `Parse` for grammar violations or unknown action names (nothing is
    /// persisted), `Validation` for rejected parameters, and
    /// `CapacityExceeded` when the dispatch queue is full.
    pub fn submit(&self, spec: &str) -> EngineResult<CmdletId> {
        let parsed = parse_cmdlet(spec)?;
        for action in &parsed {
            let implementation =
                self.shared
                    .registry
                    .get(&action.name)
                    .ok_or_else(|| EngineError::Parse {
                        message: format!("unknown action: {}", action.name),
                    })?;
            implementation.validate(&ActionArgs::new(action.args.clone()))?;
        }

        let shared = &self.shared;
        let mut dispatch = shared.dispatch.lock().unwrap();
        if dispatch.queue.len() >= shared.config.queue_capacity {
            return Err(EngineError::CapacityExceeded {
                capacity: shared.config.queue_capacity,
            });
        }

        let id = CmdletId::from_raw(shared.next_cmdlet_id.fetch_add(1, Ordering::SeqCst));
        let record = CmdletRecord::new(id, spec);
        let actions: Vec<ActionRecord> = parsed
            .into_iter()
            .map(|action| {
                let action_id =
                    ActionId::from_raw(shared.next_action_id.fetch_add(1, Ordering::SeqCst));
                ActionRecord::new(action_id, id, action.name, action.args)
            })
            .collect();

        // Written through before the id leaves this call: the submitting
        // client always reads its own writes.
        shared.meta.insert_cmdlet(&record)?;
        shared.meta.insert_actions(&actions)?;

        dispatch.queue.push_back(QueueEntry {
            id,
            files: cmdlet_files(&actions),
        });
        // notify under the lock so a worker between its queue check and its
        // wait never misses the wakeup
        shared.work_ready.notify_one();
        drop(dispatch);
        tracing::info!(cmdlet = %id, spec, "cmdlet submitted");
        Ok(id)
    }

    /// Latest known state snapshot of a cmdlet and its actions
    ///
    /// # Errors
    ///
    /// `NotFound` if the id was never issued or has been purged.
    pub fn info(&self, id: CmdletId) -> EngineResult<CmdletInfo> {
        let cmdlet = self
            .shared
            .meta
            .get_cmdlet(id)?
            .ok_or_else(|| not_found(id))?;
        let actions = self.shared.meta.actions_for_cmdlet(id)?;
        Ok(CmdletInfo { cmdlet, actions })
    }

    /// Best-effort cancellation: a queued cmdlet is removed and marked
    /// `Cancelled`; a running one has its token signalled and stops at the
    /// action's next checkpoint; a terminal one is left alone.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id.
    pub fn cancel(&self, id: CmdletId) -> EngineResult<()> {
        let shared = &self.shared;
        {
            let mut dispatch = shared.dispatch.lock().unwrap();
            if let Some(pos) = dispatch.queue.iter().position(|entry| entry.id == id) {
                dispatch.queue.remove(pos);
                drop(dispatch);

                let mut record = shared.meta.get_cmdlet(id)?.ok_or_else(|| not_found(id))?;
                record.set_state(CmdletState::Cancelled);
                shared.meta.update_cmdlet(&record)?;
                for mut action in shared.meta.actions_for_cmdlet(id)? {
                    if !action.state.is_terminal() {
                        action.mark_cancelled();
                        shared.meta.update_action(&action)?;
                    }
                }
                let _guard = shared.dispatch.lock().unwrap();
                shared.terminal.notify_all();
                tracing::info!(cmdlet = %id, "cancelled before dispatch");
                return Ok(());
            }
        }

        if let Some(token) = shared.cancels.lock().unwrap().get(&id.as_u64()) {
            token.cancel();
            tracing::info!(cmdlet = %id, "cancellation signalled to running worker");
            return Ok(());
        }

        // Already terminal (or finishing right now): best-effort no-op,
        // but an unknown id is still an error.
        shared.meta.get_cmdlet(id)?.ok_or_else(|| not_found(id))?;
        Ok(())
    }

    /// Block until the cmdlet reaches a terminal state or the timeout
    /// elapses; returns the last observed state either way.
    ///
    /// Waiters park on a condition variable signalled at every terminal
    /// transition - no polling inside the engine.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id.
    pub fn wait(&self, id: CmdletId, timeout: Duration) -> EngineResult<CmdletState> {
        let deadline = Instant::now() + timeout;
        let shared = &self.shared;
        let mut dispatch = shared.dispatch.lock().unwrap();
        loop {
            let state = shared
                .meta
                .get_cmdlet(id)?
                .ok_or_else(|| not_found(id))?
                .state;
            if state.is_terminal() {
                return Ok(state);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(state);
            }
            let (guard, _) = shared
                .terminal
                .wait_timeout(dispatch, deadline - now)
                .unwrap();
            dispatch = guard;
        }
    }

    /// Current service state (safe mode or active)
    #[must_use]
    pub fn service_state(&self) -> ServiceState {
        self.shared.safemode.state()
    }

    /// Number of cmdlets waiting for dispatch
    #[must_use]
    pub fn queued(&self) -> usize {
        self.shared.dispatch.lock().unwrap().queue.len()
    }

    /// Stop dispatch and join all workers. Idempotent; queued cmdlets stay
    /// `Pending` in the store and are re-enqueued on the next start.
    pub fn shutdown(&self) {
        {
            let mut dispatch = self.shared.dispatch.lock().unwrap();
            if dispatch.shutdown {
                return;
            }
            dispatch.shutdown = true;
        }
        self.shared.work_ready.notify_all();
        let mut threads = self.threads.lock().unwrap();
        for handle in threads.drain(..) {
            let _ = handle.join();
        }
    }

    /// Startup reconciliation. A cmdlet observed `Running` was interrupted
    /// mid-action by a crash: its partial output is never trusted, so it
    /// goes to `Failed`. `Pending` and `Scheduled` cmdlets never started an
    /// action and are safe to re-dispatch.
    fn recover(&self) -> EngineResult<()> {
        let meta = &self.shared.meta;

        for mut record in meta.cmdlets_in_state(CmdletState::Running)? {
            for mut action in meta.actions_for_cmdlet(record.id)? {
                if action.state == ActionState::Running {
                    action.mark_failed("interrupted by process restart");
                    meta.update_action(&action)?;
                }
            }
            record.set_state(CmdletState::Failed);
            meta.update_cmdlet(&record)?;
            tracing::warn!(cmdlet = %record.id, "reconciled interrupted cmdlet to FAILED");
        }

        let mut requeue = meta.cmdlets_in_state(CmdletState::Pending)?;
        for mut record in meta.cmdlets_in_state(CmdletState::Scheduled)? {
            record.set_state(CmdletState::Pending);
            meta.update_cmdlet(&record)?;
            requeue.push(record);
        }
        requeue.sort_by_key(|record| record.id);

        let mut dispatch = self.shared.dispatch.lock().unwrap();
        for record in requeue {
            let files = cmdlet_files(&meta.actions_for_cmdlet(record.id)?);
            dispatch.queue.push_back(QueueEntry {
                id: record.id,
                files,
            });
            tracing::info!(cmdlet = %record.id, "re-enqueued pending cmdlet");
        }
        Ok(())
    }
}

impl Drop for CmdletManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn not_found(id: CmdletId) -> EngineError {
    EngineError::NotFound {
        kind: "cmdlet".to_string(),
        id: id.to_string(),
    }
}

/// Distinct files targeted by a cmdlet's actions
fn cmdlet_files(actions: &[ActionRecord]) -> Vec<String> {
    let mut files: Vec<String> = actions
        .iter()
        .filter_map(|action| action.args.get(FILE_PARAM).cloned())
        .collect();
    files.sort();
    files.dedup();
    files
}

/// Re-checks collaborator readiness until safe mode exits, then wakes the
/// workers and retires. Activation is monotonic, so there is nothing left
/// to watch afterwards.
fn watch_safemode(shared: Arc<Shared>) {
    loop {
        {
            let dispatch = shared.dispatch.lock().unwrap();
            if dispatch.shutdown {
                return;
            }
        }
        let state = shared
            .safemode
            .try_activate(shared.storage.as_ref(), shared.meta.as_ref());
        if state == ServiceState::Active {
            let _guard = shared.dispatch.lock().unwrap();
            shared.work_ready.notify_all();
            return;
        }
        std::thread::sleep(shared.config.safemode_poll);
    }
}
