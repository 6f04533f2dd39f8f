//! Cooperative cancellation token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use strata_core::{EngineError, EngineResult};

/// Cancellation signal shared between the manager and an executing action.
///
/// Actions poll it at safe checkpoints (between chunks, between files) and
/// abort cleanly; nothing is preempted mid-write.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Fresh, unsignalled token
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation; idempotent
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was signalled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Checkpoint: error with `Cancelled` if the token was signalled
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Cancelled` after `cancel` was called.
    pub fn checkpoint(&self) -> EngineResult<()> {
        if self.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_passes_until_cancelled() {
        let token = CancelToken::new();
        assert!(token.checkpoint().is_ok());
        assert!(!token.is_cancelled());

        token.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.checkpoint().unwrap_err(), EngineError::Cancelled);
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let observer = token.clone();
        token.cancel();
        assert!(observer.is_cancelled());
    }
}
