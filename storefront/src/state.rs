//! Application state - single source of truth
//!
//! Four slices, each owned by one reducer:
//! - `session`: auth token, user and the login/register/OTP state machine
//! - `catalog`: home screen categories, recommended and best sellers
//! - `category_products`: products of the most recently requested category
//! - `favorites`: the only slice mirrored to device storage

use serde::{Deserialize, Serialize};

use crate::error::ErrorInfo;
use crate::model::{Category, CategoryId, Product, ProductId, UserRef};

/// Which auth request is in flight
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthOp {
    Login,
    Register,
    VerifyOtp,
}

/// Where the current token came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSource {
    /// Issued by the login endpoint
    Login,
    /// Placeholder set after a successful OTP check (no real token is issued)
    OtpVerified,
    /// Read back from storage at startup and never revalidated
    Restored,
}

/// Derived position in the auth state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthPhase {
    Anonymous,
    Authenticating,
    Registering,
    PendingVerification,
    Authenticated,
}

/// Token value stored after the OTP endpoint reports success
pub const VERIFIED_TOKEN: &str = "verified";

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<UserRef>,
    pub pending_verification: bool,
    pub pending_email: Option<String>,
    pub loading: bool,
    pub error: Option<ErrorInfo>,
    pub operation: Option<AuthOp>,
    pub token_source: Option<TokenSource>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn phase(&self) -> AuthPhase {
        if self.token.is_some() {
            return AuthPhase::Authenticated;
        }
        match self.operation {
            Some(AuthOp::Login) => AuthPhase::Authenticating,
            Some(AuthOp::Register) => AuthPhase::Registering,
            Some(AuthOp::VerifyOtp) => AuthPhase::PendingVerification,
            None if self.pending_verification => AuthPhase::PendingVerification,
            None => AuthPhase::Anonymous,
        }
    }

    /// True when the token was restored from storage without a server check
    pub fn is_unverified_restore(&self) -> bool {
        self.token_source == Some(TokenSource::Restored)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogState {
    pub categories: Vec<Category>,
    pub recommended: Vec<Product>,
    pub best_sellers: Vec<Product>,
    pub loading: bool,
    pub error: Option<String>,
    /// One bit per catalog fetch family still outstanding
    #[serde(skip)]
    pub(crate) pending: u8,
}

impl CatalogState {
    pub fn find_category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find_map(|c| c.find(id))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryProductsState {
    /// Category of the most recent request
    pub category_id: Option<CategoryId>,
    pub products: Vec<Product>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Favorited products, unique by id, in the order they were added
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoritesState {
    pub favorites: Vec<Product>,
}

impl FavoritesState {
    pub fn contains(&self, id: ProductId) -> bool {
        self.favorites.iter().any(|p| p.id == id)
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.favorites.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.favorites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.favorites.iter().map(|p| p.id)
    }

    /// Insert `product`, or refresh the stored copy if its id is present.
    /// Returns true if anything changed.
    pub fn add(&mut self, product: Product) -> bool {
        match self.favorites.iter_mut().find(|p| p.id == product.id) {
            Some(existing) if *existing == product => false,
            Some(existing) => {
                *existing = product;
                true
            }
            None => {
                self.favorites.push(product);
                true
            }
        }
    }

    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.favorites.len();
        self.favorites.retain(|p| p.id != id);
        self.favorites.len() != before
    }

    /// Remove `product` if favorited, otherwise add it. Returns true if it
    /// is a favorite afterwards.
    pub fn toggle(&mut self, product: Product) -> bool {
        if self.remove(product.id) {
            return false;
        }
        self.favorites.push(product);
        true
    }

    /// Replace the whole set, keeping the first occurrence of each id
    pub fn replace(&mut self, products: Vec<Product>) {
        self.favorites.clear();
        for product in products {
            if !self.contains(product.id) {
                self.favorites.push(product);
            }
        }
    }
}

/// Application state - everything a view needs to render
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub session: Session,
    pub catalog: CatalogState,
    pub category_products: CategoryProductsState,
    pub favorites: FavoritesState,
}
