//! Strata Core Types
//!
//! Pure types shared by every Strata crate: identifiers, wall-clock
//! timestamps for record metadata, the cmdlet/action state machines, the
//! persisted record shapes, and the engine-wide error taxonomy.
//! No I/O lives here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod id;
pub mod record;
pub mod state;
pub mod time;

// Re-exports
pub use error::{EngineError, EngineResult};
pub use id::{ActionId, CmdletId};
pub use record::{ActionRecord, ArgMap, CmdletInfo, CmdletRecord, FileCompressionInfo};
pub use state::{ActionState, CmdletState, ServiceState};
pub use time::Timestamp;
