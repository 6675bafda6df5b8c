//! Reducers - the only place state changes
//!
//! The root reducer matches every action and routes it to the slice that
//! owns it. Each slice reducer returns a [`DispatchResult`] carrying the
//! change flag and any effects to run.

mod catalog;
mod category_products;
mod favorites;
mod session;

use state_dispatch::DispatchResult;

use crate::action::Action;
use crate::effect::Effect;
use crate::state::AppState;

pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::CategoriesFetch
        | Action::CategoriesDidLoad(_)
        | Action::CategoriesDidFail(_)
        | Action::RecommendedFetch
        | Action::RecommendedDidLoad(_)
        | Action::RecommendedDidFail(_)
        | Action::BestsellersFetch
        | Action::BestsellersDidLoad(_)
        | Action::BestsellersDidFail(_) => catalog::reduce(&mut state.catalog, action),

        Action::CategoryProductsFetch { .. }
        | Action::CategoryProductsDidLoad(_)
        | Action::CategoryProductsDidFail(_) => {
            category_products::reduce(&mut state.category_products, action)
        }

        Action::FavoritesAdd(_)
        | Action::FavoritesRemove(_)
        | Action::FavoritesToggle(_)
        | Action::FavoritesLoad
        | Action::FavoritesDidLoad(_) => favorites::reduce(&mut state.favorites, action),

        Action::SessionLogin { .. }
        | Action::SessionLoginDidSucceed { .. }
        | Action::SessionLoginDidFail(_)
        | Action::SessionRegister { .. }
        | Action::SessionRegisterDidSucceed { .. }
        | Action::SessionRegisterDidFail(_)
        | Action::SessionVerifyOtp { .. }
        | Action::SessionVerifyDidSucceed
        | Action::SessionVerifyDidFail(_)
        | Action::SessionRestore
        | Action::SessionDidRestore { .. }
        | Action::SessionLogout
        | Action::SessionClearError => session::reduce(&mut state.session, action),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Product;
    use state_dispatch::{assert_emitted, assert_not_emitted, TestHarness};

    fn product(id: u64) -> Product {
        Product {
            id,
            name: format!("Product {id}"),
            image: String::new(),
            rating: 0.0,
            price: 1.0,
            listed_date: None,
            expiration_date: None,
            bids: None,
            is_sold: None,
        }
    }

    #[test]
    fn test_routing_touches_only_the_owning_slice() {
        let mut state = AppState::default();

        let result = reducer(&mut state, Action::FavoritesAdd(product(1)));
        assert!(result.changed);
        assert!(!result.has_effects());
        assert!(state.favorites.contains(1));
        assert!(!state.catalog.loading);
        assert!(!state.session.loading);

        let result = reducer(&mut state, Action::CategoryProductsFetch { category_id: 4 });
        assert_eq!(
            result.effects,
            vec![Effect::FetchCategoryProducts { category_id: 4 }]
        );
        assert!(state.category_products.loading);
        assert!(!state.catalog.loading);
    }

    #[test]
    fn test_harness_drains_by_category() {
        let mut harness = TestHarness::<AppState, Action>::default();

        let result = harness.reduce(reducer, Action::SessionRestore);
        assert_eq!(result.effects, vec![Effect::RestoreSession]);

        harness.emit(Action::SessionDidRestore {
            token: "saved".into(),
        });
        harness.emit(Action::FavoritesLoad);

        let session = harness.drain_category("session");
        assert_emitted!(session, Action::SessionDidRestore { .. });
        assert_not_emitted!(session, Action::FavoritesLoad);
        assert!(harness.has_category("favorites"));
        assert!(!harness.has_emitted());
    }
}
