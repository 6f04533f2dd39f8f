//! Engine-wide error taxonomy.
//!
//! Parse, validation, and capacity errors surface synchronously from
//! `submit`; I/O and codec errors are recorded on the action and cmdlet
//! records and surface through `info`.

use std::fmt;

/// Engine-wide result type
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine-wide error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Malformed or unknown cmdlet spec, rejected before persistence
    Parse {
        /// What was wrong with the spec
        message: String,
    },

    /// Action parameters invalid, rejected before dispatch
    Validation {
        /// What was wrong with the parameters
        message: String,
    },

    /// Scheduler queue full, rejected at submission
    CapacityExceeded {
        /// Configured queue capacity
        capacity: usize,
    },

    /// Storage access failure during execution
    Io {
        /// Underlying failure
        message: String,
    },

    /// Compression or decompression failure
    Codec {
        /// Underlying failure
        message: String,
    },

    /// Metadata store failure
    Meta {
        /// Underlying failure
        message: String,
    },

    /// Unknown or purged id queried
    NotFound {
        /// Entity kind, e.g. "cmdlet"
        kind: String,
        /// The id that was queried
        id: String,
    },

    /// Execution aborted at a cancellation checkpoint
    Cancelled,

    /// Unexpected internal failure
    Internal {
        /// Error message
        message: String,
    },
}

impl EngineError {
    /// Stable machine-readable code, used by the HTTP surface
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "PARSE_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            Self::Io { .. } => "IO_ERROR",
            Self::Codec { .. } => "CODEC_ERROR",
            Self::Meta { .. } => "META_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Cancelled => "CANCELLED",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { message } => write!(f, "parse error: {}", message),
            Self::Validation { message } => write!(f, "validation error: {}", message),
            Self::CapacityExceeded { capacity } => {
                write!(f, "dispatch queue full (capacity {})", capacity)
            }
            Self::Io { message } => write!(f, "I/O error: {}", message),
            Self::Codec { message } => write!(f, "codec error: {}", message),
            Self::Meta { message } => write!(f, "metadata store error: {}", message),
            Self::NotFound { kind, id } => write!(f, "{} not found: {}", kind, id),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Internal { message } => write!(f, "internal error: {}", message),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}
