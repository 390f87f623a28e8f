//! HTTP handlers for users, items, carts and orders.

pub mod carts;
pub mod items;
pub mod orders;
pub mod users;

use crate::error::AppError;
use crate::models::User;
use crate::service::OwnerFilter;
use crate::state::AppState;
use serde::Deserialize;

/// Query string accepted by the cart and order listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Owner filter; an empty value means no filter.
    #[serde(default)]
    pub user_id: Option<String>,
}

fn owner_filter(state: &AppState, caller: &User, query: &ListQuery) -> Result<OwnerFilter, AppError> {
    let requested = match query.user_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(s) => Some(
            s.parse::<i64>()
                .map_err(|_| AppError::Validation(format!("invalid user_id: {}", s)))?,
        ),
    };
    Ok(OwnerFilter::for_caller(caller, state.is_admin(caller), requested))
}
