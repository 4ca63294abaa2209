//! Weave lifecycle bookkeeping and the double-weave guard
//!
//! The ledger lives beside the syntax tree, not inside it.

use std::collections::HashMap;

use weft_ast::{MethodDecl, MethodId};

use crate::{MethodBodyWeaver, WeaveError, WeaveSettings};

/// Lifecycle of a single method within one build.
///
/// ```text
/// Unvisited -> Rejected
/// Unvisited -> AlreadyWoven
/// Unvisited -> CacheEnsured -> BodyWrapped -> ReturnsNormalized -> Woven
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeaveState {
    Unvisited,
    Rejected,
    AlreadyWoven,
    CacheEnsured,
    BodyWrapped,
    ReturnsNormalized,
    Woven,
}

impl WeaveState {
    /// Whether `self -> next` is a legal step.
    ///
    /// A rejected method may be visited again later in the build (the
    /// trigger set can have grown in between); `Woven` and `AlreadyWoven`
    /// never change.
    pub fn can_advance_to(self, next: WeaveState) -> bool {
        use WeaveState::*;
        matches!(
            (self, next),
            (Unvisited | Rejected, Rejected | AlreadyWoven | CacheEnsured)
                | (CacheEnsured, BodyWrapped)
                | (BodyWrapped, ReturnsNormalized)
                | (ReturnsNormalized, Woven)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, WeaveState::Woven | WeaveState::AlreadyWoven)
    }
}

/// Identity of a method across the units of one build
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodKey {
    pub unit: String,
    pub method: MethodId,
}

impl MethodKey {
    pub fn new(unit: impl Into<String>, method: MethodId) -> Self {
        Self {
            unit: unit.into(),
            method,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    state: WeaveState,
    marked: bool,
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            state: WeaveState::Unvisited,
            marked: false,
        }
    }
}

/// Per-build map from method identity to weave state and marker
#[derive(Debug, Clone, Default)]
pub struct WeaveLedger {
    entries: HashMap<MethodKey, Entry>,
}

impl WeaveLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, key: &MethodKey) -> WeaveState {
        self.entries
            .get(key)
            .map(|e| e.state)
            .unwrap_or(WeaveState::Unvisited)
    }

    pub fn is_marked(&self, key: &MethodKey) -> bool {
        self.entries.get(key).is_some_and(|e| e.marked)
    }

    pub fn advance(&mut self, key: &MethodKey, next: WeaveState) -> Result<(), WeaveError> {
        let entry = self.entries.entry(key.clone()).or_default();
        if !entry.state.can_advance_to(next) {
            return Err(WeaveError::InvalidTransition {
                from: entry.state,
                to: next,
            });
        }
        entry.state = next;
        Ok(())
    }

    fn mark(&mut self, key: &MethodKey) {
        self.entries.entry(key.clone()).or_default().marked = true;
    }

    /// Roll a method that failed mid-weave back to `Unvisited`
    pub fn abort(&mut self, key: &MethodKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            if entry.state != WeaveState::Woven {
                *entry = Entry::default();
            }
        }
    }

    /// Methods that reached `state`, sorted
    pub fn in_state(&self, state: WeaveState) -> Vec<&MethodKey> {
        let mut keys: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, e)| e.state == state)
            .map(|(k, _)| k)
            .collect();
        keys.sort();
        keys
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    AlreadyWoven,
}

/// Stops a method from being woven twice.
///
/// A method counts as woven when this build already marked it, or when its
/// body already starts with the weaver's context declaration (a unit that
/// went through an earlier run).
pub struct WeaveGuard<'a> {
    settings: &'a WeaveSettings,
}

impl<'a> WeaveGuard<'a> {
    pub fn new(settings: &'a WeaveSettings) -> Self {
        Self { settings }
    }

    pub fn check(
        &self,
        ledger: &mut WeaveLedger,
        key: &MethodKey,
        method: &MethodDecl,
    ) -> Result<GuardDecision, WeaveError> {
        if ledger.is_marked(key) || ledger.state(key).is_terminal() {
            return Ok(GuardDecision::AlreadyWoven);
        }
        let woven_earlier = method
            .body
            .as_ref()
            .is_some_and(|body| MethodBodyWeaver::new(self.settings).is_woven(body));
        if woven_earlier {
            ledger.advance(key, WeaveState::AlreadyWoven)?;
            return Ok(GuardDecision::AlreadyWoven);
        }
        Ok(GuardDecision::Proceed)
    }

    /// Set the marker. Must happen before any stage touches the tree.
    pub fn mark(&self, ledger: &mut WeaveLedger, key: &MethodKey) {
        ledger.mark(key);
    }
}
