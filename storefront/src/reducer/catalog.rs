//! Home screen catalog: three independent fetch families
//!
//! Each outcome only overwrites its own field. `loading` stays true until
//! every outstanding family has settled.

use state_dispatch::DispatchResult;

use crate::action::Action;
use crate::effect::Effect;
use crate::state::CatalogState;

const CATEGORIES: u8 = 1;
const RECOMMENDED: u8 = 1 << 1;
const BESTSELLERS: u8 = 1 << 2;

fn start(state: &mut CatalogState, family: u8, effect: Effect) -> DispatchResult<Effect> {
    state.pending |= family;
    state.loading = true;
    state.error = None;
    DispatchResult::changed_with(effect)
}

fn settle(state: &mut CatalogState, family: u8, error: Option<String>) {
    state.pending &= !family;
    state.loading = state.pending != 0;
    if error.is_some() {
        state.error = error;
    }
}

pub(super) fn reduce(state: &mut CatalogState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::CategoriesFetch => start(state, CATEGORIES, Effect::FetchCategories),
        Action::RecommendedFetch => start(state, RECOMMENDED, Effect::FetchRecommended),
        Action::BestsellersFetch => start(state, BESTSELLERS, Effect::FetchBestsellers),

        Action::CategoriesDidLoad(categories) => {
            state.categories = categories;
            settle(state, CATEGORIES, None);
            DispatchResult::changed()
        }
        Action::RecommendedDidLoad(products) => {
            state.recommended = products;
            settle(state, RECOMMENDED, None);
            DispatchResult::changed()
        }
        Action::BestsellersDidLoad(products) => {
            state.best_sellers = products;
            settle(state, BESTSELLERS, None);
            DispatchResult::changed()
        }

        Action::CategoriesDidFail(error) => {
            settle(state, CATEGORIES, Some(error));
            DispatchResult::changed()
        }
        Action::RecommendedDidFail(error) => {
            settle(state, RECOMMENDED, Some(error));
            DispatchResult::changed()
        }
        Action::BestsellersDidFail(error) => {
            settle(state, BESTSELLERS, Some(error));
            DispatchResult::changed()
        }

        _ => DispatchResult::unchanged(),
    }
}
