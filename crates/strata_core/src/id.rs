//! Identifiers for Strata entities.
//!
//! Cmdlet and action ids are sequential integers allocated by the cmdlet
//! manager and recovered from the metadata store's maxima at startup, so a
//! restarted process never reissues an id.

use serde::{Deserialize, Serialize};

/// Cmdlet identifier - identifies one submitted unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CmdletId(u64);

impl CmdletId {
    /// Create from a raw value
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw value
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CmdletId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cmd_{}", self.0)
    }
}

/// Action identifier - identifies one step of a cmdlet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(u64);

impl ActionId {
    /// Create from a raw value
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw value
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "act_{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        let id = CmdletId::from_raw(42);
        assert_eq!(id.as_u64(), 42);
        assert_eq!(ActionId::from_raw(7).as_u64(), 7);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(CmdletId::from_raw(3).to_string(), "cmd_3");
        assert_eq!(ActionId::from_raw(9).to_string(), "act_9");
    }

    #[test]
    fn test_id_ord() {
        assert!(CmdletId::from_raw(1) < CmdletId::from_raw(2));
    }
}
