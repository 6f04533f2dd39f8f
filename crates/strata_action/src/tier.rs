//! Storage-tier and cache actions.

use crate::args::{ActionArgs, FILE_PARAM as ARG_FILE};
use crate::contract::{Action, ActionContext, ActionReport};
use strata_core::{EngineError, EngineResult};

const ARG_POLICY: &str = "storagePolicy";

/// Storage policies the cluster understands
pub const STORAGE_POLICIES: &[&str] = &[
    "HOT",
    "WARM",
    "COLD",
    "ALL_SSD",
    "ONE_SSD",
    "LAZY_PERSIST",
];

/// `move -file <path> -storagePolicy <policy>`
///
/// Retargets a file's storage tier. Block movement itself is the cluster's
/// job; this action records the intent through the backend.
#[derive(Debug)]
pub struct MoveAction;

impl Action for MoveAction {
    fn name(&self) -> &'static str {
        "move"
    }

    fn validate(&self, args: &ActionArgs) -> EngineResult<()> {
        args.require(ARG_FILE)?;
        let policy = args.require(ARG_POLICY)?;
        if !STORAGE_POLICIES.contains(&policy) {
            return Err(EngineError::Validation {
                message: format!("unknown storage policy: {}", policy),
            });
        }
        Ok(())
    }

    fn execute(&self, ctx: &ActionContext<'_>) -> EngineResult<ActionReport> {
        let path = ctx.args.require(ARG_FILE)?;
        let policy = ctx.args.require(ARG_POLICY)?;
        ctx.storage.set_storage_policy(path, policy)?;
        tracing::info!(path, policy, "storage policy set");
        Ok(ActionReport::new(format!("{} moved to {}", path, policy)))
    }
}

/// `cache -file <path>`: pin a file into the cluster cache
#[derive(Debug)]
pub struct CacheAction;

impl Action for CacheAction {
    fn name(&self) -> &'static str {
        "cache"
    }

    fn validate(&self, args: &ActionArgs) -> EngineResult<()> {
        args.require(ARG_FILE)?;
        Ok(())
    }

    fn execute(&self, ctx: &ActionContext<'_>) -> EngineResult<ActionReport> {
        let path = ctx.args.require(ARG_FILE)?;
        ctx.storage.cache(path)?;
        Ok(ActionReport::new(format!("{} cached", path)))
    }
}

/// `uncache -file <path>`: unpin a file from the cluster cache
#[derive(Debug)]
pub struct UncacheAction;

impl Action for UncacheAction {
    fn name(&self) -> &'static str {
        "uncache"
    }

    fn validate(&self, args: &ActionArgs) -> EngineResult<()> {
        args.require(ARG_FILE)?;
        Ok(())
    }

    fn execute(&self, ctx: &ActionContext<'_>) -> EngineResult<ActionReport> {
        let path = ctx.args.require(ARG_FILE)?;
        ctx.storage.uncache(path)?;
        Ok(ActionReport::new(format!("{} uncached", path)))
    }
}
