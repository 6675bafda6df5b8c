//! Effects - side effects declared by the reducer
//!
//! Reducers stay pure and return these; the effect handler turns them into
//! API calls and storage access whose outcomes come back as actions.

use crate::model::CategoryId;

/// Side effects that can be triggered by actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchCategories,
    FetchRecommended,
    FetchBestsellers,
    FetchCategoryProducts { category_id: CategoryId },
    /// Read the stored favorites list
    LoadFavorites,
    Login { email: String, password: String },
    Register {
        email: String,
        password: String,
        accepted_terms: bool,
    },
    VerifyOtp { email: String, otp: String },
    /// Read the saved auth token, if any
    RestoreSession,
    /// Persist a freshly issued token
    StoreToken { token: String },
    /// Delete the saved auth token
    ForgetToken,
}
