//! Helpers for unit-testing reducers and effect handlers
//!
//! ```ignore
//! use state_dispatch::{assert_emitted, TestHarness};
//!
//! let mut harness = TestHarness::<AppState, Action>::default();
//! let result = harness.reduce(reducer, Action::SessionRestore);
//! harness.emit(Action::SessionDidRestore { token: "t".into() });
//!
//! let session = harness.drain_category("session");
//! assert_emitted!(session, Action::SessionDidRestore { .. });
//! ```

use std::collections::VecDeque;

use crate::{Action, ActionCategory};

/// State under test plus a record of actions emitted against it
pub struct TestHarness<S, A: Action> {
    pub state: S,
    emitted: VecDeque<A>,
}

impl<S, A: Action> TestHarness<S, A> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            emitted: VecDeque::new(),
        }
    }

    /// Record `action` as if a handler had emitted it
    pub fn emit(&mut self, action: A) {
        self.emitted.push_back(action);
    }

    /// Run `reducer` on the harness state and hand back its result
    pub fn reduce<R>(&mut self, reducer: fn(&mut S, A) -> R, action: A) -> R {
        reducer(&mut self.state, action)
    }

    /// Take every recorded action, oldest first
    pub fn drain_emitted(&mut self) -> Vec<A> {
        self.emitted.drain(..).collect()
    }

    /// Drains the record; true if it was non-empty
    pub fn has_emitted(&mut self) -> bool {
        !self.drain_emitted().is_empty()
    }
}

impl<S: Default, A: Action> Default for TestHarness<S, A> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S, A: ActionCategory> TestHarness<S, A> {
    /// Take the recorded actions in `category`; the others stay recorded
    /// in their original order.
    pub fn drain_category(&mut self, category: &str) -> Vec<A> {
        let (taken, kept): (Vec<A>, Vec<A>) = self
            .emitted
            .drain(..)
            .partition(|action| action.category() == Some(category));
        self.emitted = kept.into();
        taken
    }

    /// Drains `category`; true if anything was in it
    pub fn has_category(&mut self, category: &str) -> bool {
        !self.drain_category(category).is_empty()
    }
}

/// Fails unless some action in `$actions` matches the pattern
#[macro_export]
macro_rules! assert_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            $actions.iter().any(|a| matches!(a, $pattern $(if $guard)?)),
            "no action matched `{}` in {:?}",
            stringify!($pattern),
            $actions
        );
    };
}

/// Fails if any action in `$actions` matches the pattern
#[macro_export]
macro_rules! assert_not_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            !$actions.iter().any(|a| matches!(a, $pattern $(if $guard)?)),
            "unexpected action matching `{}` in {:?}",
            stringify!($pattern),
            $actions
        );
    };
}

/// Number of actions in `$actions` matching the pattern
#[macro_export]
macro_rules! count_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        $actions.iter().filter(|a| matches!(a, $pattern $(if $guard)?)).count()
    };
}
