//! Reducer outcomes
//!
//! A reducer reports whether it touched the state and which effects the
//! runtime should perform next. Effects are plain data; executing them is
//! the handler's job, so reducers never block or do I/O.
//!
//! ```ignore
//! fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
//!     match action {
//!         Action::CategoriesFetch => {
//!             state.catalog.loading = true;
//!             DispatchResult::changed_with(Effect::FetchCategories)
//!         }
//!         Action::CategoriesDidLoad(categories) => {
//!             state.catalog.loading = false;
//!             state.catalog.categories = categories;
//!             DispatchResult::changed()
//!         }
//!     }
//! }
//! ```

/// What a single dispatch did: a change flag plus follow-up effects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult<E> {
    pub changed: bool,
    /// Performed in order once the dispatch returns
    pub effects: Vec<E>,
}

impl<E> Default for DispatchResult<E> {
    fn default() -> Self {
        Self::unchanged()
    }
}

impl<E> DispatchResult<E> {
    fn new(changed: bool, effects: Vec<E>) -> Self {
        Self { changed, effects }
    }

    /// Nothing changed and nothing to do
    #[inline]
    pub fn unchanged() -> Self {
        Self::new(false, Vec::new())
    }

    #[inline]
    pub fn changed() -> Self {
        Self::new(true, Vec::new())
    }

    /// State untouched, one effect to run
    #[inline]
    pub fn effect(effect: E) -> Self {
        Self::new(false, vec![effect])
    }

    #[inline]
    pub fn changed_with(effect: E) -> Self {
        Self::new(true, vec![effect])
    }

    /// `changed()` or `unchanged()` depending on `changed`
    #[inline]
    pub fn changed_if(changed: bool) -> Self {
        Self::new(changed, Vec::new())
    }

    /// Append one more effect
    #[inline]
    pub fn with(mut self, effect: E) -> Self {
        self.effects.push(effect);
        self
    }

    #[inline]
    pub fn has_effects(&self) -> bool {
        !self.effects.is_empty()
    }

    /// Combine with the outcome of another reducer. The result is changed
    /// if either was; effects keep their order, `self` first.
    pub fn merge(mut self, other: DispatchResult<E>) -> Self {
        self.changed |= other.changed;
        self.effects.extend(other.effects);
        self
    }
}

/// Signature every root reducer has
pub type EffectReducer<S, A, E> = fn(&mut S, A) -> DispatchResult<E>;
