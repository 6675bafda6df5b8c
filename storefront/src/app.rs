//! Application context
//!
//! [`Storefront`] owns the store, the effect runtime and the handler. It is
//! an ordinary value: tests build as many independent instances as they
//! like from a stub API and an in-memory store.

use std::sync::Arc;

use state_dispatch::{
    ComposedMiddleware, EffectContext, EffectRuntime, KeyValueStore, LoggingMiddleware,
    PersistBridge, StoreWithMiddleware, SubscriptionId,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::action::Action;
use crate::api::RemoteApi;
use crate::effect::Effect;
use crate::handler::{EffectHandler, FAVORITES_KEY};
use crate::model::{CategoryId, Product, ProductId};
use crate::reducer::reducer;
use crate::state::AppState;

type AppMiddleware = ComposedMiddleware<AppState, Action>;
type AppStore = StoreWithMiddleware<AppState, Action, Effect, AppMiddleware>;

pub struct Storefront {
    runtime: EffectRuntime<AppState, Action, Effect, AppStore>,
    handler: EffectHandler,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("state", self.state())
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Build a context, seeding whitelisted slices from `storage` and
    /// restoring a saved session before anything can observe the state.
    ///
    /// Needs no tokio runtime; restoring only reads local storage.
    pub fn new(api: Arc<dyn RemoteApi>, storage: Arc<dyn KeyValueStore>) -> Self {
        let mut bridge = PersistBridge::new(storage.clone()).slice(
            FAVORITES_KEY,
            |s: &AppState| &s.favorites,
            |s| &mut s.favorites,
        );

        let mut state = AppState::default();
        let restored = bridge.rehydrate(&mut state);
        tracing::debug!(restored, favorites = state.favorites.len(), "State rehydrated");

        let middleware: AppMiddleware = ComposedMiddleware::new()
            .with(LoggingMiddleware::new())
            .with(bridge);
        let store = StoreWithMiddleware::new(state, reducer, middleware);
        let runtime = EffectRuntime::from_store(store);

        let mut app = Self {
            runtime,
            handler: EffectHandler::new(api, storage),
        };
        app.dispatch(Action::SessionRestore);
        app
    }

    pub fn state(&self) -> &AppState {
        self.runtime.state()
    }

    /// Apply `action` now, then everything queued behind it. Effects are
    /// started immediately, so results of inline effects are already in
    /// the state on return; network results arrive on `settle` or `run`.
    ///
    /// Must be called within a tokio runtime when `action` starts a
    /// network effect.
    pub fn dispatch(&mut self, action: Action) -> bool {
        let handler = &self.handler;
        let mut handle =
            |effect: Effect, ctx: &mut EffectContext<'_, Action>| handler.handle(effect, ctx);
        let changed = self.runtime.dispatch(action, &mut handle);
        self.runtime.drain_queue(&mut handle);
        changed
    }

    /// Queue `action` to be applied by the next `settle` or `run`.
    pub fn enqueue(&self, action: Action) {
        self.runtime.enqueue(action);
    }

    /// Sender for feeding actions from other tasks into [`run`](Self::run).
    pub fn action_tx(&self) -> mpsc::UnboundedSender<Action> {
        self.runtime.action_tx()
    }

    /// Apply queued actions and task outcomes until nothing is left in
    /// flight. Returns the number of actions applied.
    pub async fn settle(&mut self) -> usize {
        let handler = self.handler.clone();
        self.runtime
            .settle(move |effect: Effect, ctx: &mut EffectContext<'_, Action>| {
                handler.handle(effect, ctx)
            })
            .await
    }

    /// Process actions until `cancel` fires.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let handler = self.handler.clone();
        self.runtime
            .run(
                cancel,
                move |effect: Effect, ctx: &mut EffectContext<'_, Action>| {
                    handler.handle(effect, ctx)
                },
            )
            .await;
    }

    /// Call `listener` with the new state after every changing dispatch.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&AppState) + Send + 'static,
    {
        self.runtime.store_mut().subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.runtime.store_mut().unsubscribe(id)
    }

    // ===== Catalog =====

    /// Start all three home screen fetches
    pub fn fetch_home(&mut self) {
        self.fetch_categories();
        self.fetch_recommended();
        self.fetch_bestsellers();
    }

    pub fn fetch_categories(&mut self) {
        self.dispatch(Action::CategoriesFetch);
    }

    pub fn fetch_recommended(&mut self) {
        self.dispatch(Action::RecommendedFetch);
    }

    pub fn fetch_bestsellers(&mut self) {
        self.dispatch(Action::BestsellersFetch);
    }

    pub fn fetch_category_products(&mut self, category_id: CategoryId) {
        self.dispatch(Action::CategoryProductsFetch { category_id });
    }

    // ===== Favorites =====

    pub fn add_favorite(&mut self, product: Product) {
        self.dispatch(Action::FavoritesAdd(product));
    }

    pub fn remove_favorite(&mut self, id: ProductId) {
        self.dispatch(Action::FavoritesRemove(id));
    }

    /// Returns whether the product is a favorite afterwards
    pub fn toggle_favorite(&mut self, product: Product) -> bool {
        let id = product.id;
        self.dispatch(Action::FavoritesToggle(product));
        self.state().favorites.contains(id)
    }

    pub fn load_favorites(&mut self) {
        self.dispatch(Action::FavoritesLoad);
    }

    // ===== Session =====

    pub fn login(&mut self, email: impl Into<String>, password: impl Into<String>) {
        self.dispatch(Action::SessionLogin {
            email: email.into(),
            password: password.into(),
        });
    }

    pub fn register(
        &mut self,
        email: impl Into<String>,
        password: impl Into<String>,
        accepted_terms: bool,
    ) {
        self.dispatch(Action::SessionRegister {
            email: email.into(),
            password: password.into(),
            accepted_terms,
        });
    }

    pub fn verify_otp(&mut self, email: impl Into<String>, otp: impl Into<String>) {
        self.dispatch(Action::SessionVerifyOtp {
            email: email.into(),
            otp: otp.into(),
        });
    }

    pub fn logout(&mut self) {
        self.dispatch(Action::SessionLogout);
    }

    pub fn clear_error(&mut self) {
        self.dispatch(Action::SessionClearError);
    }
}
