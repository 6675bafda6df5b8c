//! The store: one state value, one reducer, and the listeners watching it

use std::marker::PhantomData;

use crate::action::Action;
use crate::effect::{DispatchResult, EffectReducer};
use crate::middleware::Middleware;

/// Returned by `subscribe`; pass it to `unsubscribe` to stop notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<S> = Box<dyn FnMut(&S) + Send>;

/// Listeners in registration order
struct Subscribers<S> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Listener<S>)>,
}

impl<S> Subscribers<S> {
    fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    fn add(&mut self, listener: Listener<S>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        match self.entries.iter().position(|(entry, _)| *entry == id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    fn notify(&mut self, state: &S) {
        for (_, listener) in self.entries.iter_mut() {
            listener(state);
        }
    }
}

/// Owns the application state; the reducer is the only way to change it.
///
/// `dispatch` takes `&mut self`, so reductions never interleave. When the
/// reducer reports a change, every subscriber observes the new state
/// before `dispatch` returns. Unchanged dispatches notify nobody.
///
/// ```ignore
/// let mut store = Store::new(AppState::default(), reducer);
/// let id = store.subscribe(|state| println!("{} favorites", state.favorites.len()));
/// let result = store.dispatch(Action::CategoriesFetch);
/// assert!(result.has_effects());
/// store.unsubscribe(id);
/// ```
pub struct Store<S, A, E> {
    state: S,
    reducer: EffectReducer<S, A, E>,
    subscribers: Subscribers<S>,
    _marker: PhantomData<fn(A) -> E>,
}

impl<S, A: Action, E> Store<S, A, E> {
    pub fn new(state: S, reducer: EffectReducer<S, A, E>) -> Self {
        Self {
            state,
            reducer,
            subscribers: Subscribers::new(),
            _marker: PhantomData,
        }
    }

    /// Reduce `action` and notify subscribers if the state changed
    pub fn dispatch(&mut self, action: A) -> DispatchResult<E> {
        let result = (self.reducer)(&mut self.state, action);
        if result.changed {
            self.subscribers.notify(&self.state);
        }
        result
    }

    #[inline]
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Direct access for seeding state at startup. Nobody is notified.
    #[inline]
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Call `listener` with the new state after every changing dispatch
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&S) + Send + 'static,
    {
        self.subscribers.add(Box::new(listener))
    }

    /// `false` if `id` was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.entries.len()
    }
}

/// A [`Store`] whose dispatches pass through a [`Middleware`]
///
/// `before` sees the action before the reducer runs. `after` runs once
/// subscribers have been notified and gets the change flag along with the
/// resulting state. Effects are not visible to middleware.
pub struct StoreWithMiddleware<S, A, E, M> {
    inner: Store<S, A, E>,
    middleware: M,
}

impl<S, A, E, M> StoreWithMiddleware<S, A, E, M>
where
    A: Action,
    M: Middleware<S, A>,
{
    pub fn new(state: S, reducer: EffectReducer<S, A, E>, middleware: M) -> Self {
        Self {
            inner: Store::new(state, reducer),
            middleware,
        }
    }

    pub fn dispatch(&mut self, action: A) -> DispatchResult<E> {
        self.middleware.before(&action);
        let result = self.inner.dispatch(action.clone());
        self.middleware
            .after(&action, result.changed, self.inner.state());
        result
    }

    #[inline]
    pub fn state(&self) -> &S {
        self.inner.state()
    }

    #[inline]
    pub fn state_mut(&mut self) -> &mut S {
        self.inner.state_mut()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&S) + Send + 'static,
    {
        self.inner.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.inner.unsubscribe(id)
    }

    pub fn middleware(&self) -> &M {
        &self.middleware
    }
}
