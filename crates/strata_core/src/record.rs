//! Persisted record shapes for cmdlets, actions, and compression side data.
//!
//! Records are what the metadata store holds; every state transition goes
//! through these types and is written through before it becomes visible to
//! queries.

use crate::id::{ActionId, CmdletId};
use crate::state::{ActionState, CmdletState};
use crate::time::Timestamp;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered parameter map parsed from `-flag value` tokens.
///
/// Keys are stored without the leading dash. Order is submission order.
pub type ArgMap = IndexMap<String, String>;

/// Durable record of one submitted cmdlet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmdletRecord {
    /// Cmdlet id
    pub id: CmdletId,
    /// Raw textual specification as submitted
    pub spec: String,
    /// Current lifecycle state
    pub state: CmdletState,
    /// Submission time
    pub submit_ts: Timestamp,
    /// Time of the most recent state transition
    pub update_ts: Timestamp,
}

impl CmdletRecord {
    /// Create a new record in `Pending` state
    #[must_use]
    pub fn new(id: CmdletId, spec: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            spec: spec.into(),
            state: CmdletState::Pending,
            submit_ts: now,
            update_ts: now,
        }
    }

    /// Transition to a new state, refreshing `update_ts`
    pub fn set_state(&mut self, state: CmdletState) {
        self.state = state;
        self.update_ts = Timestamp::now();
    }
}

/// Durable record of one action within a cmdlet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Action id
    pub id: ActionId,
    /// Owning cmdlet
    pub cmdlet_id: CmdletId,
    /// Registered action name
    pub name: String,
    /// Ordered parameter map
    pub args: ArgMap,
    /// Current lifecycle state
    pub state: ActionState,
    /// Result payload or failure reason, set at terminal transition
    pub result: Option<String>,
    /// Set when execution begins; stays unset for skipped actions
    pub start_ts: Option<Timestamp>,
    /// Set at terminal transition
    pub finish_ts: Option<Timestamp>,
}

impl ActionRecord {
    /// Create a new record in `Pending` state
    #[must_use]
    pub fn new(id: ActionId, cmdlet_id: CmdletId, name: impl Into<String>, args: ArgMap) -> Self {
        Self {
            id,
            cmdlet_id,
            name: name.into(),
            args,
            state: ActionState::Pending,
            result: None,
            start_ts: None,
            finish_ts: None,
        }
    }

    /// Mark execution started
    pub fn mark_running(&mut self) {
        self.state = ActionState::Running;
        self.start_ts = Some(Timestamp::now());
    }

    /// Mark success with a result payload
    pub fn mark_done(&mut self, result: impl Into<String>) {
        self.state = ActionState::Done;
        self.result = Some(result.into());
        self.finish_ts = Some(Timestamp::now());
    }

    /// Mark failure with a reason
    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.state = ActionState::Failed;
        self.result = Some(reason.into());
        self.finish_ts = Some(Timestamp::now());
    }

    /// Mark cancelled
    pub fn mark_cancelled(&mut self) {
        self.state = ActionState::Cancelled;
        self.finish_ts = Some(Timestamp::now());
    }
}

/// Per-file side record present only while a compress action is
/// materializing the chunked container.
///
/// Removed once the container atomically replaces the original; from then
/// on the container itself is the sole representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCompressionInfo {
    /// Logical path of the file being compressed
    pub path: String,
    /// Logical chunk size in bytes
    pub buf_size: u32,
    /// Codec name, e.g. "zstd"
    pub codec: String,
    /// Uncompressed length of the source
    pub original_len: u64,
}

/// Snapshot returned by `info`: the cmdlet record plus its action records
/// in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmdletInfo {
    /// The cmdlet record
    pub cmdlet: CmdletRecord,
    /// Action records in submission order
    pub actions: Vec<ActionRecord>,
}
