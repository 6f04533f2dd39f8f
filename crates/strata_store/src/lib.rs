//! Strata Storage Backend Adapter
//!
//! Actions never touch the filesystem directly; they go through the
//! [`StorageBackend`] trait. The distributed filesystem behind a production
//! deployment is an external collaborator - this crate pins down the
//! interface the engine consumes and ships [`LocalBackend`], a rooted local
//! implementation that defines the reference semantics (atomic rename,
//! storage-policy and cache bookkeeping, readiness reporting).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod local;

pub use backend::{ReadSeek, StorageBackend, StoreError, StoreResult};
pub use local::LocalBackend;
