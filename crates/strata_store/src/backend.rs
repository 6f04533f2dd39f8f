//! The storage backend trait and its error type.

use std::io::{Read, Seek, Write};
use strata_core::EngineError;
use thiserror::Error;

/// Result type for backend operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage backend error
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Path escapes the backend root or contains invalid components
    #[error("invalid path: {path}")]
    InvalidPath {
        /// The offending path
        path: String,
    },

    /// File does not exist
    #[error("file not found: {path}")]
    NotFound {
        /// The path that was looked up
        path: String,
    },
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        EngineError::Io {
            message: err.to_string(),
        }
    }
}

/// Combined read + seek object, boxable behind the trait
pub trait ReadSeek: Read + Seek + Send {}
impl<T: Read + Seek + Send> ReadSeek for T {}

/// Read/write/seek access to files in the storage cluster.
///
/// Safe for concurrent use by independent actions on independent files; the
/// scheduler never runs two actions against the same file at once. Paths
/// are logical (`/dir/file`), rooted at the cluster namespace.
pub trait StorageBackend: Send + Sync {
    /// Whether the cluster has finished its own startup/replication
    /// catch-up phase. Gates the engine's safe-mode exit.
    fn ready(&self) -> bool;

    /// Whether a file exists
    fn exists(&self, path: &str) -> StoreResult<bool>;

    /// Length of a file in bytes
    fn len(&self, path: &str) -> StoreResult<u64>;

    /// Open a file for sequential/seekable reading
    fn open(&self, path: &str) -> StoreResult<Box<dyn ReadSeek>>;

    /// Create (or truncate) a file for writing
    fn create(&self, path: &str) -> StoreResult<Box<dyn Write + Send>>;

    /// Atomically replace `to` with `from`.
    ///
    /// No reader ever observes a partially written `to`.
    fn rename(&self, from: &str, to: &str) -> StoreResult<()>;

    /// Delete a file
    fn delete(&self, path: &str) -> StoreResult<()>;

    /// Retarget the file's storage tier
    fn set_storage_policy(&self, path: &str, policy: &str) -> StoreResult<()>;

    /// Current storage policy, if one was ever set
    fn storage_policy(&self, path: &str) -> StoreResult<Option<String>>;

    /// Pin a file into the cluster cache
    fn cache(&self, path: &str) -> StoreResult<()>;

    /// Unpin a file from the cluster cache
    fn uncache(&self, path: &str) -> StoreResult<()>;

    /// Whether a file is pinned in the cluster cache
    fn is_cached(&self, path: &str) -> StoreResult<bool>;
}
