//! Effect handler - runs what the reducers ask for
//!
//! Network effects become keyed tasks on the runtime's [`TaskManager`], so a
//! newer request of the same family supersedes an older one. Effects that
//! only touch local storage run inline and emit their result right away.
//!
//! [`TaskManager`]: state_dispatch::TaskManager

use std::sync::Arc;

use state_dispatch::{load_json, EffectContext, KeyValueStore, TaskKey};

use crate::action::Action;
use crate::api::RemoteApi;
use crate::effect::Effect;
use crate::error::ErrorInfo;

/// Storage key for the auth token
pub const TOKEN_KEY: &str = "auth_token";
/// Storage key for the favorites slice
pub const FAVORITES_KEY: &str = "favorites";

const OTP_REJECTED: &str = "The verification code is not valid.";

// Task families; a new spawn under the same key supersedes the old one
const CATEGORIES_TASK: &str = "categories";
const RECOMMENDED_TASK: &str = "recommended";
const BESTSELLERS_TASK: &str = "bestsellers";
const CATEGORY_PRODUCTS_TASK: &str = "category_products";
const SESSION_TASK: &str = "session";

#[derive(Clone)]
pub struct EffectHandler {
    api: Arc<dyn RemoteApi>,
    storage: Arc<dyn KeyValueStore>,
}

impl EffectHandler {
    pub fn new(api: Arc<dyn RemoteApi>, storage: Arc<dyn KeyValueStore>) -> Self {
        Self { api, storage }
    }

    pub fn handle(&self, effect: Effect, ctx: &mut EffectContext<'_, Action>) {
        let api = self.api.clone();

        match effect {
            Effect::FetchCategories => {
                ctx.tasks().spawn(CATEGORIES_TASK, async move {
                    match api.categories().await {
                        Ok(categories) => Action::CategoriesDidLoad(categories),
                        Err(err) => {
                            tracing::warn!(error = %err, "Categories fetch failed");
                            Action::CategoriesDidFail(err.user_message())
                        }
                    }
                });
            }
            Effect::FetchRecommended => {
                ctx.tasks().spawn(RECOMMENDED_TASK, async move {
                    match api.recommended().await {
                        Ok(products) => Action::RecommendedDidLoad(products),
                        Err(err) => {
                            tracing::warn!(error = %err, "Recommended fetch failed");
                            Action::RecommendedDidFail(err.user_message())
                        }
                    }
                });
            }
            Effect::FetchBestsellers => {
                ctx.tasks().spawn(BESTSELLERS_TASK, async move {
                    match api.bestsellers().await {
                        Ok(products) => Action::BestsellersDidLoad(products),
                        Err(err) => {
                            tracing::warn!(error = %err, "Bestsellers fetch failed");
                            Action::BestsellersDidFail(err.user_message())
                        }
                    }
                });
            }
            Effect::FetchCategoryProducts { category_id } => {
                ctx.tasks().spawn(CATEGORY_PRODUCTS_TASK, async move {
                    match api.category_products(category_id).await {
                        Ok(products) => Action::CategoryProductsDidLoad(products),
                        Err(err) => {
                            tracing::warn!(category_id, error = %err, "Category products fetch failed");
                            Action::CategoryProductsDidFail(err.user_message())
                        }
                    }
                });
            }
            Effect::LoadFavorites => {
                let favorites = load_json(&*self.storage, FAVORITES_KEY).unwrap_or_default();
                ctx.emit(Action::FavoritesDidLoad(favorites));
            }
            Effect::Login { email, password } => {
                ctx.tasks().spawn(SESSION_TASK, async move {
                    match api.login(&email, &password).await {
                        Ok(response) => Action::SessionLoginDidSucceed {
                            token: response.token,
                            user: response.user,
                        },
                        Err(err) => {
                            tracing::info!(error = %err, "Login failed");
                            Action::SessionLoginDidFail(ErrorInfo::from(&err))
                        }
                    }
                });
            }
            Effect::Register {
                email,
                password,
                accepted_terms,
            } => {
                ctx.tasks().spawn(SESSION_TASK, async move {
                    match api.register(&email, &password, accepted_terms).await {
                        Ok(()) => Action::SessionRegisterDidSucceed { email },
                        Err(err) => {
                            tracing::info!(error = %err, "Registration failed");
                            Action::SessionRegisterDidFail(ErrorInfo::from(&err))
                        }
                    }
                });
            }
            Effect::VerifyOtp { email, otp } => {
                ctx.tasks().spawn(SESSION_TASK, async move {
                    match api.verify_otp(&email, &otp).await {
                        Ok(response) if response.is_verified() => Action::SessionVerifyDidSucceed,
                        Ok(response) => {
                            tracing::info!(status = response.status, "OTP rejected");
                            Action::SessionVerifyDidFail(ErrorInfo::rejected(OTP_REJECTED))
                        }
                        Err(err) => {
                            tracing::info!(error = %err, "OTP validation failed");
                            Action::SessionVerifyDidFail(ErrorInfo::from(&err))
                        }
                    }
                });
            }
            Effect::RestoreSession => match self.storage.get(TOKEN_KEY) {
                Ok(Some(token)) if !token.is_empty() => {
                    ctx.emit(Action::SessionDidRestore { token });
                }
                Ok(_) => tracing::debug!("No saved session"),
                Err(err) => tracing::warn!(error = %err, "Could not read saved session"),
            },
            Effect::StoreToken { token } => {
                if let Err(err) = self.storage.set(TOKEN_KEY, &token) {
                    tracing::warn!(error = %err, "Could not save auth token");
                }
            }
            Effect::ForgetToken => {
                ctx.tasks().cancel(&TaskKey::from(SESSION_TASK));
                if let Err(err) = self.storage.remove(TOKEN_KEY) {
                    tracing::warn!(error = %err, "Could not remove auth token");
                }
            }
        }
    }
}
