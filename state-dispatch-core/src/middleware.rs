//! Hooks that observe every dispatch

use std::fmt;

use crate::action::{Action, ActionSummary};

/// Observes dispatches without taking part in reduction
///
/// `before` runs ahead of the reducer. `after` runs once subscribers have
/// seen the result, with the final state.
pub trait Middleware<S, A: Action> {
    fn before(&mut self, action: &A);

    fn after(&mut self, action: &A, state_changed: bool, state: &S);
}

/// Does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMiddleware;

impl<S, A: Action> Middleware<S, A> for NoopMiddleware {
    fn before(&mut self, _action: &A) {}
    fn after(&mut self, _action: &A, _state_changed: bool, _state: &S) {}
}

/// Traces each dispatch at debug level
///
/// Every dispatch produces one event with the action name and change flag.
/// In verbose mode the action's summary is also traced before reduction.
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware {
    verbose: bool,
}

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self { verbose: false }
    }

    pub fn verbose() -> Self {
        Self { verbose: true }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

impl<S, A: ActionSummary> Middleware<S, A> for LoggingMiddleware {
    fn before(&mut self, action: &A) {
        if self.verbose {
            tracing::debug!(action = %action.name(), summary = %action.summary(), "dispatch");
        }
    }

    fn after(&mut self, action: &A, state_changed: bool, _state: &S) {
        tracing::debug!(action = %action.name(), state_changed, "reduced");
    }
}

type BoxedMiddleware<S, A> = Box<dyn Middleware<S, A> + Send>;

/// Runs several middleware as one
///
/// `before` hooks run in insertion order and `after` hooks in reverse, so
/// the first middleware added wraps all the others.
pub struct ComposedMiddleware<S, A: Action> {
    layers: Vec<BoxedMiddleware<S, A>>,
}

impl<S, A: Action> fmt::Debug for ComposedMiddleware<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedMiddleware")
            .field("layers", &self.layers.len())
            .finish()
    }
}

impl<S, A: Action> Default for ComposedMiddleware<S, A> {
    fn default() -> Self {
        Self { layers: Vec::new() }
    }
}

impl<S, A: Action> ComposedMiddleware<S, A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `middleware` as the innermost layer
    pub fn with<M>(mut self, middleware: M) -> Self
    where
        M: Middleware<S, A> + Send + 'static,
    {
        self.layers.push(Box::new(middleware));
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl<S, A: Action> Middleware<S, A> for ComposedMiddleware<S, A> {
    fn before(&mut self, action: &A) {
        self.layers.iter_mut().for_each(|layer| layer.before(action));
    }

    fn after(&mut self, action: &A, state_changed: bool, state: &S) {
        self.layers
            .iter_mut()
            .rev()
            .for_each(|layer| layer.after(action, state_changed, state));
    }
}
