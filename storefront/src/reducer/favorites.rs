//! Favorites: synchronous set operations plus a storage reload
//!
//! Mirroring to storage is not done here; the persistence middleware writes
//! the slice after every changing dispatch.

use state_dispatch::DispatchResult;

use crate::action::Action;
use crate::effect::Effect;
use crate::state::FavoritesState;

pub(super) fn reduce(state: &mut FavoritesState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::FavoritesAdd(product) => DispatchResult::changed_if(state.add(product)),
        Action::FavoritesRemove(id) => DispatchResult::changed_if(state.remove(id)),
        Action::FavoritesToggle(product) => {
            state.toggle(product);
            DispatchResult::changed()
        }
        Action::FavoritesLoad => DispatchResult::effect(Effect::LoadFavorites),
        Action::FavoritesDidLoad(products) => {
            if state.favorites == products {
                return DispatchResult::unchanged();
            }
            state.replace(products);
            DispatchResult::changed()
        }
        _ => DispatchResult::unchanged(),
    }
}
