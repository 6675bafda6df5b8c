use state_dispatch::DispatchResult;

use crate::action::Action;
use crate::effect::Effect;
use crate::state::CategoryProductsState;

pub(super) fn reduce(
    state: &mut CategoryProductsState,
    action: Action,
) -> DispatchResult<Effect> {
    match action {
        Action::CategoryProductsFetch { category_id } => {
            state.category_id = Some(category_id);
            state.loading = true;
            state.error = None;
            DispatchResult::changed_with(Effect::FetchCategoryProducts { category_id })
        }
        Action::CategoryProductsDidLoad(products) => {
            state.products = products;
            state.loading = false;
            DispatchResult::changed()
        }
        Action::CategoryProductsDidFail(error) => {
            state.loading = false;
            state.error = Some(error);
            DispatchResult::changed()
        }
        _ => DispatchResult::unchanged(),
    }
}
