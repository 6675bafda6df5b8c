//! state-dispatch: one store, pure reducers, effects as data
//!
//! This crate bundles [`state_dispatch_core`] with the `#[derive(Action)]`
//! macro. Enable the `tasks` feature for the async runtime.
//!
//! ```ignore
//! use state_dispatch::prelude::*;
//!
//! #[derive(Action, Clone, Debug)]
//! #[action(infer_categories)]
//! enum AppAction {
//!     FavoritesToggle(Product),
//!     FavoritesLoad,
//!     FavoritesDidLoad(Vec<Product>),
//! }
//!
//! assert_eq!(AppAction::FavoritesLoad.category(), Some("favorites"));
//! ```

pub use state_dispatch_core::*;
pub use state_dispatch_macros::Action;

/// Everything an application module usually needs
pub mod prelude {
    pub use state_dispatch_core::{
        Action, ActionCategory, ActionSummary, ComposedMiddleware, DispatchResult,
        EffectReducer, FileStore, KeyValueStore, LoggingMiddleware, MemoryStore, Middleware,
        NoopMiddleware, PersistBridge, Store, StoreWithMiddleware, SubscriptionId,
    };
    #[cfg(feature = "tasks")]
    pub use state_dispatch_core::{EffectContext, EffectRuntime, TaskKey, TaskManager};

    pub use state_dispatch_macros::Action;
}
