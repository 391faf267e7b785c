//! Reinstatement actions.
//!
//! An action runs when a [`NavState`] is instated, after its body has been
//! written into the target region. Actions are looked up by identifier in
//! an [`ActionRegistry`] populated at startup; history records only ever
//! carry the identifier.

use std::collections::HashMap;

use pushnav_types::error::{NavError, Result};

use crate::state::NavState;

/// A routine run when a state is instated.
///
/// Implemented for every `Fn(&NavState)`.
pub trait NavAction {
    fn invoke(&self, state: &NavState);
}

impl<F: Fn(&NavState)> NavAction for F {
    fn invoke(&self, state: &NavState) {
        self(state)
    }
}

/// Resolves action identifiers to handlers.
pub trait ActionResolver {
    /// Fails with [`NavError::UnresolvedAction`] for unknown identifiers.
    fn resolve(&self, id: &str) -> Result<&dyn NavAction>;
}

/// Identifier → handler table.
#[derive(Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Box<dyn NavAction>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action` under `id`, replacing any previous handler.
    pub fn register(&mut self, id: &str, action: Box<dyn NavAction>) {
        if self.actions.insert(id.to_string(), action).is_some() {
            log::debug!("action {id} re-registered");
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.actions.contains_key(id)
    }

    /// Registered identifiers, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl ActionResolver for ActionRegistry {
    fn resolve(&self, id: &str) -> Result<&dyn NavAction> {
        self.actions
            .get(id)
            .map(|a| &**a)
            .ok_or_else(|| NavError::UnresolvedAction(id.to_string()))
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn resolve_registered_action() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut reg = ActionRegistry::new();
        reg.register(
            "track",
            Box::new(move |s: &NavState| sink.borrow_mut().push(s.url.clone())),
        );

        let action = reg.resolve("track").unwrap();
        action.invoke(&NavState::new("https://app.test/a"));
        assert_eq!(*seen.borrow(), vec!["https://app.test/a".to_string()]);
    }

    #[test]
    fn unknown_action_is_unresolved() {
        let reg = ActionRegistry::new();
        let err = reg.resolve("missing").err().unwrap();
        assert!(matches!(err, NavError::UnresolvedAction(id) if id == "missing"));
    }

    #[test]
    fn reregistering_replaces_handler() {
        let hits = Rc::new(RefCell::new(0u32));
        let mut reg = ActionRegistry::new();
        reg.register("a", Box::new(|_: &NavState| {}));
        let sink = Rc::clone(&hits);
        reg.register("a", Box::new(move |_: &NavState| *sink.borrow_mut() += 1));
        reg.resolve("a").unwrap().invoke(&NavState::new("u"));
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(reg.ids(), vec!["a"]);
    }
}
