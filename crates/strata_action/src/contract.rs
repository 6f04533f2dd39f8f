//! The uniform lifecycle every action implements.

use crate::args::ActionArgs;
use crate::cancel::CancelToken;
use strata_core::EngineResult;
use strata_meta::MetaStore;
use strata_store::StorageBackend;

/// Everything an executing action sees: its parameters, the storage
/// backend, the metadata store, and its cancellation token.
pub struct ActionContext<'a> {
    /// Parsed parameter map
    pub args: ActionArgs,
    /// Storage backend handle
    pub storage: &'a dyn StorageBackend,
    /// Metadata store handle
    pub meta: &'a dyn MetaStore,
    /// Cooperative cancellation signal
    pub cancel: CancelToken,
}

impl<'a> ActionContext<'a> {
    /// Assemble a context for one action execution
    #[must_use]
    pub fn new(
        args: ActionArgs,
        storage: &'a dyn StorageBackend,
        meta: &'a dyn MetaStore,
        cancel: CancelToken,
    ) -> Self {
        Self {
            args,
            storage,
            meta,
            cancel,
        }
    }
}

/// Result payload of a successful action, recorded on its action record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    /// Human-readable outcome summary
    pub message: String,
}

impl ActionReport {
    /// Report with the given summary
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A single executable step of a cmdlet.
///
/// `validate` runs at submission, before any scheduling resource is spent;
/// `execute` runs on a worker and must be idempotent-safe to retry at
/// whole-action granularity (the engine never retries automatically, but a
/// caller may resubmit). Implementations poll `ctx.cancel` at safe
/// checkpoints and leave no partially-visible output on abort.
pub trait Action: Send + Sync {
    /// Registered name, resolved at parse time
    fn name(&self) -> &'static str;

    /// Fail-fast parameter check
    ///
    /// # Errors
    ///
    /// `Validation` error describing the rejected parameter.
    fn validate(&self, args: &ActionArgs) -> EngineResult<()>;

    /// Run the action to a terminal result
    ///
    /// # Errors
    ///
    /// `Io`/`Codec` on execution failure, `Cancelled` if aborted at a
    /// checkpoint.
    fn execute(&self, ctx: &ActionContext<'_>) -> EngineResult<ActionReport>;
}
