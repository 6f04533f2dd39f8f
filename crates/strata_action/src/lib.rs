//! Strata Actions
//!
//! The uniform contract every executable step satisfies
//! ([`Action`]: validate fast, execute cooperatively-cancellable), the
//! registry that resolves action names at parse time, and the built-in
//! action set: `compress`, `uncompress`, `decompress-read`, `move`,
//! `cache`, `uncache`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod args;
pub mod cancel;
pub mod compress;
pub mod contract;
pub mod registry;
pub mod tier;

pub use args::{ActionArgs, FILE_PARAM};
pub use cancel::CancelToken;
pub use compress::{CompressAction, DecompressReadAction, UncompressAction};
pub use contract::{Action, ActionContext, ActionReport};
pub use registry::ActionRegistry;
pub use tier::{CacheAction, MoveAction, UncacheAction, STORAGE_POLICIES};
