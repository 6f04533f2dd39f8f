//! Action registry: name -> implementation.

use crate::compress::{CompressAction, DecompressReadAction, UncompressAction};
use crate::contract::Action;
use crate::tier::{CacheAction, MoveAction, UncacheAction};
use indexmap::IndexMap;
use std::sync::Arc;
use strata_core::{EngineError, EngineResult};

/// Maps an action name to its implementation.
///
/// Resolution is a plain map lookup; dispatch is trait-object invocation.
/// Unknown names are rejected at parse time, before anything is persisted.
pub struct ActionRegistry {
    actions: IndexMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            actions: IndexMap::new(),
        }
    }

    /// Registry pre-loaded with the built-in action set
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for action in [
            Arc::new(CompressAction::default()) as Arc<dyn Action>,
            Arc::new(UncompressAction::default()),
            Arc::new(DecompressReadAction::default()),
            Arc::new(MoveAction),
            Arc::new(CacheAction),
            Arc::new(UncacheAction),
        ] {
            registry
                .register(action)
                .expect("built-in action names are unique");
        }
        registry
    }

    /// Register an action under its name
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already taken.
    pub fn register(&mut self, action: Arc<dyn Action>) -> EngineResult<()> {
        let name = action.name().to_string();
        if self.actions.contains_key(&name) {
            return Err(EngineError::Internal {
                message: format!("action already registered: {}", name),
            });
        }
        self.actions.insert(name, action);
        Ok(())
    }

    /// Resolve a name to its implementation
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(name).map(Arc::clone)
    }

    /// Whether a name resolves
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Registered names in registration order
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.actions.keys().cloned().collect()
    }

    /// Number of registered actions
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
