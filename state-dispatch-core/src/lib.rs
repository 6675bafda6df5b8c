//! Building blocks for state-dispatch
//!
//! A client core built on this crate keeps all of its state in one
//! [`Store`]. Views send actions, a pure reducer applies them and returns a
//! [`DispatchResult`], and the effects in that result describe the I/O to
//! do next. With the `tasks` feature, [`EffectRuntime`] runs that I/O as
//! keyed background tasks whose outcomes return as actions; a newer task
//! under the same key makes an older outcome stale.
//!
//! Intent actions and result actions are paired by name:
//!
//! - `CategoriesFetch` sets `loading` and emits an effect
//! - the handler spawns a task under a key such as `"categories"`
//! - the task answers with `CategoriesDidLoad` or `CategoriesDidFail`
//!
//! ```ignore
//! fn handle(effect: Effect, ctx: &mut EffectContext<'_, Action>) {
//!     match effect {
//!         Effect::FetchCategories => {
//!             let api = api.clone();
//!             ctx.tasks().spawn("categories", async move {
//!                 match api.categories().await {
//!                     Ok(list) => Action::CategoriesDidLoad(list),
//!                     Err(e) => Action::CategoriesDidFail(e.user_message()),
//!                 }
//!             });
//!         }
//!     }
//! }
//!
//! let mut runtime = EffectRuntime::new(AppState::default(), reducer);
//! runtime.enqueue(Action::CategoriesFetch);
//! runtime.settle(handle).await;
//! ```
//!
//! [`PersistBridge`] is a middleware that restores chosen state slices from
//! a [`KeyValueStore`] at startup and writes them back whenever they change.

pub mod action;
pub mod effect;
pub mod middleware;
pub mod persist;
#[cfg(feature = "tasks")]
pub mod runtime;
pub mod store;
#[cfg(feature = "tasks")]
pub mod tasks;
pub mod testing;

pub use action::{Action, ActionCategory, ActionSummary};
pub use effect::{DispatchResult, EffectReducer};
pub use middleware::{ComposedMiddleware, LoggingMiddleware, Middleware, NoopMiddleware};
pub use persist::{
    load_json, save_json, FileStore, KeyValueStore, MemoryStore, PersistBridge, StorageError,
};
pub use store::{Store, StoreWithMiddleware, SubscriptionId};
pub use testing::TestHarness;

#[cfg(feature = "tasks")]
pub use runtime::{DispatchStore, EffectContext, EffectRuntime};
#[cfg(feature = "tasks")]
pub use tasks::{TaskKey, TaskManager};
