//! State machines for cmdlets, actions, and the service itself.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a cmdlet.
///
/// `Pending`, `Scheduled`, and `Running` are transient; `Done`, `Failed`,
/// and `Cancelled` are terminal and never left again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmdletState {
    /// Persisted, waiting for dispatch (also while safe mode holds)
    Pending,
    /// Dequeued and handed to a worker, no action started yet
    Scheduled,
    /// A worker is executing its actions
    Running,
    /// Every action succeeded
    Done,
    /// Some action failed; the rest were skipped
    Failed,
    /// Cancelled before or during execution
    Cancelled,
}

impl CmdletState {
    /// True for `Done`, `Failed`, and `Cancelled`
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for CmdletState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Scheduled => "SCHEDULED",
            Self::Running => "RUNNING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

/// Lifecycle state of a single action.
///
/// An action skipped after an earlier failure stays `Pending` with its
/// `start_ts` unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionState {
    /// Not started
    Pending,
    /// Executing on a worker
    Running,
    /// Finished successfully
    Done,
    /// Finished with an error
    Failed,
    /// Aborted at a cancellation checkpoint
    Cancelled,
}

impl ActionState {
    /// True for `Done`, `Failed`, and `Cancelled`
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for ActionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

/// Service-level state reported to clients.
///
/// Starts in `SafeMode`; the transition to `Active` is monotonic within a
/// process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceState {
    /// Dispatch suspended until the storage cluster and metadata store are ready
    SafeMode,
    /// Dispatch running
    Active,
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::SafeMode => "SAFEMODE",
            Self::Active => "ACTIVE",
        };
        write!(f, "{}", s)
    }
}
