//! In-flight fetch bookkeeping, single-flight per normalized URL.

use std::collections::HashMap;

use pushnav_types::error::{NavError, Result};

use crate::state::{Body, NavState};

/// A navigation waiting on its fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransition {
    /// The state being built; `body` is filled in on resolution.
    pub state: NavState,
    /// Push a history record once instated.
    pub record_history: bool,
    /// Store the resolved body in the response cache.
    pub cache: bool,
    /// Instate the result once resolved. Cleared when a later navigation
    /// supersedes the transition; the fetch then only fills the cache.
    pub display: bool,
}

/// Outstanding fetches keyed by normalized URL.
#[derive(Debug, Default)]
pub struct PendingTable {
    entries: HashMap<String, PendingTransition>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fetch for `url`.
    ///
    /// Fails with [`NavError::AlreadyPending`] while an earlier fetch for
    /// the same URL is outstanding; the existing entry is left untouched.
    pub fn begin(
        &mut self,
        url: &str,
        state: NavState,
        record_history: bool,
        cache: bool,
    ) -> Result<()> {
        if self.entries.contains_key(url) {
            return Err(NavError::AlreadyPending(url.to_string()));
        }
        self.entries.insert(
            url.to_string(),
            PendingTransition {
                state,
                record_history,
                cache,
                display: true,
            },
        );
        Ok(())
    }

    /// Take over a superseded entry for `url` on behalf of a new
    /// navigation, so its outstanding fetch is instated after all.
    ///
    /// Returns `false`, leaving the table untouched, when there is no entry
    /// or the entry was never superseded.
    pub fn adopt(&mut self, url: &str, state: &NavState, record_history: bool, cache: bool) -> bool {
        match self.entries.get_mut(url) {
            Some(transition) if !transition.display => {
                transition.state = state.clone();
                transition.record_history = record_history;
                transition.cache = cache;
                transition.display = true;
                true
            },
            _ => false,
        }
    }

    /// Consume the entry for `url`, attaching the resolved body.
    pub fn resolve(&mut self, url: &str, body: Body) -> Result<PendingTransition> {
        let mut transition = self
            .entries
            .remove(url)
            .ok_or_else(|| NavError::NoSuchPending(url.to_string()))?;
        transition.state.body = Some(body);
        Ok(transition)
    }

    /// Drop the entry for `url` without resolving it.
    ///
    /// Returns the removed transition, if any.
    pub fn cancel(&mut self, url: &str) -> Option<PendingTransition> {
        self.entries.remove(url)
    }

    /// Stop every outstanding transition from recording history or being
    /// instated.
    ///
    /// The fetches still complete and fill the cache. Returns how many
    /// entries changed.
    pub fn supersede(&mut self) -> usize {
        let mut changed = 0;
        for transition in self.entries.values_mut() {
            if transition.record_history || transition.display {
                transition.record_history = false;
                transition.display = false;
                changed += 1;
            }
        }
        changed
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn get(&self, url: &str) -> Option<&PendingTransition> {
        self.entries.get(url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
