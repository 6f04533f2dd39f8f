//! Executor pool: the worker loop and per-cmdlet action execution.

use crate::manager::Shared;
use std::sync::Arc;
use std::time::Duration;
use strata_action::{ActionArgs, ActionContext, CancelToken};
use strata_core::{CmdletId, CmdletState, EngineError, EngineResult};

/// How long a worker parks before re-checking the queue on its own; the
/// condvar is the fast path, this is the backstop.
const IDLE_WAIT: Duration = Duration::from_millis(100);

/// Worker loop: pull-based, dequeue-once.
///
/// While safe mode holds, nothing is dequeued. A worker claims the files
/// its cmdlet targets before leaving the lock, so two actions never run
/// against the same file concurrently; later queue entries may overtake a
/// blocked one (FIFO is a fairness heuristic, not a correctness guarantee).
pub(crate) fn run_worker(shared: Arc<Shared>, worker_idx: usize) {
    loop {
        let entry = {
            let mut dispatch = shared.dispatch.lock().unwrap();
            loop {
                if dispatch.shutdown {
                    return;
                }
                if shared.safemode.is_active() {
                    let eligible = dispatch.queue.iter().position(|entry| {
                        entry.files.iter().all(|file| !dispatch.in_use.contains(file))
                    });
                    if let Some(pos) = eligible {
                        let entry = dispatch.queue.remove(pos).expect("eligible position");
                        for file in &entry.files {
                            dispatch.in_use.insert(file.clone());
                        }
                        // Register the token before the dequeue is visible
                        // anywhere, so cancel() never finds a gap.
                        shared
                            .cancels
                            .lock()
                            .unwrap()
                            .insert(entry.id.as_u64(), CancelToken::new());
                        break entry;
                    }
                }
                let (guard, _) = shared.work_ready.wait_timeout(dispatch, IDLE_WAIT).unwrap();
                dispatch = guard;
            }
        };

        let id = entry.id;
        tracing::debug!(worker = worker_idx, cmdlet = %id, "dequeued");
        if let Err(error) = run_cmdlet(&shared, id) {
            tracing::error!(cmdlet = %id, %error, "cmdlet aborted on metadata store failure");
        }

        shared.cancels.lock().unwrap().remove(&id.as_u64());
        {
            let mut dispatch = shared.dispatch.lock().unwrap();
            for file in &entry.files {
                dispatch.in_use.remove(file);
            }
            // notify under the lock so a waiter between its state check and
            // its wait never misses a terminal transition
            shared.work_ready.notify_all();
            shared.terminal.notify_all();
        }
    }
}

/// Execute one cmdlet's actions strictly in submission order.
///
/// First failure skips the rest (their `start_ts` stays unset) and fails
/// the cmdlet; a checkpoint abort cancels it; success of the last action
/// completes it. Every transition is written through before the next step.
fn run_cmdlet(shared: &Arc<Shared>, id: CmdletId) -> EngineResult<()> {
    let Some(mut record) = shared.meta.get_cmdlet(id)? else {
        return Err(EngineError::Internal {
            message: format!("dequeued cmdlet {} has no record", id),
        });
    };
    if record.state.is_terminal() {
        // cancelled between enqueue and dequeue
        return Ok(());
    }

    let token = shared
        .cancels
        .lock()
        .unwrap()
        .get(&id.as_u64())
        .cloned()
        .unwrap_or_default();

    record.set_state(CmdletState::Scheduled);
    shared.meta.update_cmdlet(&record)?;
    record.set_state(CmdletState::Running);
    shared.meta.update_cmdlet(&record)?;
    tracing::info!(cmdlet = %id, "cmdlet running");

    let mut actions = shared.meta.actions_for_cmdlet(id)?;
    let mut outcome = CmdletState::Done;

    for action in actions.iter_mut() {
        let Some(implementation) = shared.registry.get(&action.name) else {
            action.mark_failed(format!("action no longer registered: {}", action.name));
            shared.meta.update_action(action)?;
            outcome = CmdletState::Failed;
            break;
        };

        action.mark_running();
        shared.meta.update_action(action)?;

        let ctx = ActionContext::new(
            ActionArgs::new(action.args.clone()),
            shared.storage.as_ref(),
            shared.meta.as_ref(),
            token.clone(),
        );
        match implementation.execute(&ctx) {
            Ok(report) => {
                tracing::debug!(cmdlet = %id, action = %action.id, "action done");
                action.mark_done(report.message);
                shared.meta.update_action(action)?;
            }
            Err(EngineError::Cancelled) => {
                tracing::info!(cmdlet = %id, action = %action.id, "action cancelled");
                action.mark_cancelled();
                shared.meta.update_action(action)?;
                outcome = CmdletState::Cancelled;
                break;
            }
            Err(error) => {
                tracing::warn!(cmdlet = %id, action = %action.id, %error, "action failed");
                action.mark_failed(error.to_string());
                shared.meta.update_action(action)?;
                outcome = CmdletState::Failed;
                break;
            }
        }
    }

    record.set_state(outcome);
    shared.meta.update_cmdlet(&record)?;
    tracing::info!(cmdlet = %id, state = %outcome, "cmdlet finished");
    Ok(())
}
