//! The metadata store trait and its error type.

use strata_core::{
    ActionRecord, CmdletId, CmdletRecord, CmdletState, EngineError, FileCompressionInfo,
};
use thiserror::Error;

/// Result type for metadata store operations
pub type MetaResult<T> = Result<T, MetaError>;

/// Metadata store error
#[derive(Debug, Error)]
pub enum MetaError {
    /// Store unreachable or not yet schema-initialized
    #[error("metadata store unavailable: {reason}")]
    Unavailable {
        /// Why the store could not serve the request
        reason: String,
    },

    /// Snapshot I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot encoding or decoding failure
    #[error("encoding error: {reason}")]
    Encoding {
        /// What failed to encode or decode
        reason: String,
    },
}

impl From<MetaError> for EngineError {
    fn from(err: MetaError) -> Self {
        EngineError::Meta {
            message: err.to_string(),
        }
    }
}

/// Durable persistence consumed by the cmdlet manager.
///
/// Every cmdlet state transition is written through here before it becomes
/// visible to queries. Writes to a given cmdlet's records are serialized by
/// the manager's dequeue-once discipline, so implementations only need
/// per-call consistency. `update_*` calls upsert: the manager is the sole
/// writer and owns record identity.
pub trait MetaStore: Send + Sync {
    /// Whether the store is reachable and schema-initialized.
    /// Gates the engine's safe-mode exit.
    fn is_ready(&self) -> bool;

    /// Persist a new cmdlet record
    fn insert_cmdlet(&self, record: &CmdletRecord) -> MetaResult<()>;

    /// Write through an updated cmdlet record
    fn update_cmdlet(&self, record: &CmdletRecord) -> MetaResult<()>;

    /// Fetch a cmdlet record by id
    fn get_cmdlet(&self, id: CmdletId) -> MetaResult<Option<CmdletRecord>>;

    /// All cmdlet records currently in `state`, ordered by id
    fn cmdlets_in_state(&self, state: CmdletState) -> MetaResult<Vec<CmdletRecord>>;

    /// Highest cmdlet id ever issued (0 if none), for id recovery
    fn max_cmdlet_id(&self) -> MetaResult<u64>;

    /// Persist the action records of a freshly submitted cmdlet
    fn insert_actions(&self, records: &[ActionRecord]) -> MetaResult<()>;

    /// Write through an updated action record
    fn update_action(&self, record: &ActionRecord) -> MetaResult<()>;

    /// Action records of a cmdlet in submission order
    fn actions_for_cmdlet(&self, id: CmdletId) -> MetaResult<Vec<ActionRecord>>;

    /// Highest action id ever issued (0 if none), for id recovery
    fn max_action_id(&self) -> MetaResult<u64>;

    /// Record that a file's chunked container is being materialized
    fn put_compression_info(&self, info: &FileCompressionInfo) -> MetaResult<()>;

    /// The compression side record for a path, if present
    fn compression_info(&self, path: &str) -> MetaResult<Option<FileCompressionInfo>>;

    /// Remove the compression side record once the container is the sole
    /// representation. Removing an absent record is not an error.
    fn delete_compression_info(&self, path: &str) -> MetaResult<()>;
}
