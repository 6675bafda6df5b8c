//! Action vocabulary
//!
//! Intents are named `<Subject><Verb>` and their outcomes
//! `<Subject>Did<Outcome>`, so `#[action(infer_categories)]` groups each
//! request with its results. The three home-screen fetch families share the
//! `catalog` category.

use state_dispatch::ActionSummary;

use crate::error::ErrorInfo;
use crate::model::{Category, CategoryId, Product, ProductId, UserRef};

#[derive(state_dispatch::Action, Clone, Debug, PartialEq)]
#[action(infer_categories)]
pub enum Action {
    // ===== Catalog =====
    #[action(category = "catalog")]
    CategoriesFetch,
    #[action(category = "catalog")]
    CategoriesDidLoad(Vec<Category>),
    #[action(category = "catalog")]
    CategoriesDidFail(String),

    #[action(category = "catalog")]
    RecommendedFetch,
    #[action(category = "catalog")]
    RecommendedDidLoad(Vec<Product>),
    #[action(category = "catalog")]
    RecommendedDidFail(String),

    #[action(category = "catalog")]
    BestsellersFetch,
    #[action(category = "catalog")]
    BestsellersDidLoad(Vec<Product>),
    #[action(category = "catalog")]
    BestsellersDidFail(String),

    // ===== Category products =====
    CategoryProductsFetch {
        category_id: CategoryId,
    },
    CategoryProductsDidLoad(Vec<Product>),
    CategoryProductsDidFail(String),

    // ===== Favorites =====
    FavoritesAdd(Product),
    FavoritesRemove(ProductId),
    FavoritesToggle(Product),
    /// Replace the in-memory set with what storage holds
    FavoritesLoad,
    FavoritesDidLoad(Vec<Product>),

    // ===== Session =====
    SessionLogin {
        email: String,
        password: String,
    },
    SessionLoginDidSucceed {
        token: String,
        user: UserRef,
    },
    SessionLoginDidFail(ErrorInfo),

    SessionRegister {
        email: String,
        password: String,
        accepted_terms: bool,
    },
    SessionRegisterDidSucceed {
        email: String,
    },
    SessionRegisterDidFail(ErrorInfo),

    SessionVerifyOtp {
        email: String,
        otp: String,
    },
    SessionVerifyDidSucceed,
    SessionVerifyDidFail(ErrorInfo),

    /// Look for a saved token at startup
    SessionRestore,
    SessionDidRestore {
        token: String,
    },
    SessionLogout,
    SessionClearError,
}

/// Keep payload-heavy actions and credentials out of the logs
impl ActionSummary for Action {
    fn summary(&self) -> String {
        match self {
            Action::CategoriesDidLoad(categories) => {
                format!("CategoriesDidLoad({} categories)", categories.len())
            }
            Action::RecommendedDidLoad(products) => {
                format!("RecommendedDidLoad({} products)", products.len())
            }
            Action::BestsellersDidLoad(products) => {
                format!("BestsellersDidLoad({} products)", products.len())
            }
            Action::CategoryProductsDidLoad(products) => {
                format!("CategoryProductsDidLoad({} products)", products.len())
            }
            Action::FavoritesDidLoad(products) => {
                format!("FavoritesDidLoad({} products)", products.len())
            }
            Action::FavoritesAdd(product) => format!("FavoritesAdd({})", product.id),
            Action::FavoritesToggle(product) => format!("FavoritesToggle({})", product.id),
            Action::SessionLogin { email, .. } => format!("SessionLogin {{ email: {email:?} }}"),
            Action::SessionRegister {
                email,
                accepted_terms,
                ..
            } => format!("SessionRegister {{ email: {email:?}, accepted_terms: {accepted_terms} }}"),
            Action::SessionVerifyOtp { email, .. } => {
                format!("SessionVerifyOtp {{ email: {email:?} }}")
            }
            Action::SessionLoginDidSucceed { user, .. } => {
                format!("SessionLoginDidSucceed {{ user: {:?} }}", user.email)
            }
            Action::SessionDidRestore { .. } => "SessionDidRestore".to_string(),
            _ => format!("{:?}", self),
        }
    }
}
