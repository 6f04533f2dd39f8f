//! Safe-mode startup gating.

use std::sync::RwLock;
use strata_core::ServiceState;
use strata_meta::MetaStore;
use strata_store::StorageBackend;

/// Gates dispatch until the storage cluster and the metadata store report
/// readiness.
///
/// Starts in `SafeMode`; the transition to `Active` happens at most once
/// per process lifetime and is never reverted, even if a collaborator's
/// readiness signal later flaps.
pub struct SafeModeController {
    state: RwLock<ServiceState>,
}

impl SafeModeController {
    /// New controller in `SafeMode`
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ServiceState::SafeMode),
        }
    }

    /// Current service state
    #[must_use]
    pub fn state(&self) -> ServiceState {
        *self.state.read().unwrap()
    }

    /// Whether dispatch is permitted
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state() == ServiceState::Active
    }

    /// Re-check both collaborators and activate if both are ready.
    ///
    /// Returns the service state after the check. Monotonic: once active,
    /// collaborator readiness is no longer consulted.
    pub fn try_activate(&self, storage: &dyn StorageBackend, meta: &dyn MetaStore) -> ServiceState {
        if self.is_active() {
            return ServiceState::Active;
        }
        if storage.ready() && meta.is_ready() {
            let mut state = self.state.write().unwrap();
            if *state == ServiceState::SafeMode {
                *state = ServiceState::Active;
                tracing::info!("safe mode exited, dispatch enabled");
            }
            ServiceState::Active
        } else {
            ServiceState::SafeMode
        }
    }

    /// Activate unconditionally (tests and embedded setups)
    pub fn force_active(&self) {
        let mut state = self.state.write().unwrap();
        *state = ServiceState::Active;
    }
}

impl Default for SafeModeController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_meta::MemMetaStore;
    use strata_store::LocalBackend;

    fn collaborators() -> (tempfile::TempDir, LocalBackend, MemMetaStore) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalBackend::new(dir.path().join("fs")).unwrap();
        (dir, storage, MemMetaStore::new())
    }

    #[test]
    fn test_starts_in_safemode() {
        let controller = SafeModeController::new();
        assert_eq!(controller.state(), ServiceState::SafeMode);
        assert!(!controller.is_active());
    }

    #[test]
    fn test_activates_when_both_ready() {
        let (_dir, storage, meta) = collaborators();
        let controller = SafeModeController::new();

        assert_eq!(
            controller.try_activate(&storage, &meta),
            ServiceState::Active
        );
        assert!(controller.is_active());
    }

    #[test]
    fn test_holds_until_storage_ready() {
        let (_dir, storage, meta) = collaborators();
        storage.set_ready(false);
        let controller = SafeModeController::new();

        assert_eq!(
            controller.try_activate(&storage, &meta),
            ServiceState::SafeMode
        );

        storage.set_ready(true);
        assert_eq!(
            controller.try_activate(&storage, &meta),
            ServiceState::Active
        );
    }

    #[test]
    fn test_holds_until_meta_ready() {
        let (_dir, storage, meta) = collaborators();
        meta.set_ready(false);
        let controller = SafeModeController::new();

        assert_eq!(
            controller.try_activate(&storage, &meta),
            ServiceState::SafeMode
        );
    }

    #[test]
    fn test_activation_is_monotonic() {
        let (_dir, storage, meta) = collaborators();
        let controller = SafeModeController::new();
        controller.try_activate(&storage, &meta);
        assert!(controller.is_active());

        // readiness flapping after activation changes nothing
        storage.set_ready(false);
        meta.set_ready(false);
        assert_eq!(
            controller.try_activate(&storage, &meta),
            ServiceState::Active
        );
        assert!(controller.is_active());
    }
}
