//! Storefront client core
//!
//! Catalog browsing, favorites and authentication state for a storefront
//! backend, built on `state-dispatch`:
//!
//! 1. Callers dispatch intents (`CategoriesFetch`, `SessionLogin`, ...)
//! 2. Reducers update the owning slice and return [`Effect`]s
//! 3. The [`EffectHandler`] runs effects as supersede-latest tasks against a
//!    [`RemoteApi`] and feeds outcomes back as `Did*` actions
//! 4. The favorites slice is mirrored to a key-value store after every change
//!
//! ```ignore
//! let api = Arc::new(HttpApi::new("https://shop.example.com", Duration::from_secs(15))?);
//! let storage = Arc::new(FileStore::open(dir)?);
//! let mut app = Storefront::new(api, storage);
//! app.fetch_home();
//! app.settle().await;
//! println!("{} categories", app.state().catalog.categories.len());
//! ```

pub mod action;
pub mod api;
pub mod app;
pub mod config;
pub mod effect;
pub mod error;
pub mod handler;
pub mod model;
pub mod reducer;
pub mod state;
pub mod validate;

pub use action::Action;
pub use api::{HttpApi, LoginResponse, OtpResponse, RemoteApi};
pub use app::Storefront;
pub use config::{Config, ConfigError};
pub use effect::Effect;
pub use error::{ApiError, ErrorInfo, ErrorKind};
pub use handler::{EffectHandler, FAVORITES_KEY, TOKEN_KEY};
pub use model::{Bid, Category, CategoryId, Product, ProductId, UserRef};
pub use state::{AppState, AuthOp, AuthPhase, Session, TokenSource};
