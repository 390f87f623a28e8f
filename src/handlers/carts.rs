//! Cart handlers: add to the caller's active cart, list carts, current cart.

use super::{owner_filter, ListQuery};
use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::response::{ok, EmptyCartBody};
use crate::service::{CartService, CurrentCart};
use crate::state::AppState;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateCartRequest {
    /// Missing or null means no items.
    #[serde(default)]
    pub item_ids: Option<Vec<i64>>,
}

/// POST /carts: open or reuse the caller's active cart and attach the requested items.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<CreateCartRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = body?;
    let store = state.store.as_ref();
    let cart = CartService::ensure_active_cart(store, &user).await?;
    let cart = CartService::add_items(store, &cart, req.item_ids.as_deref().unwrap_or_default()).await?;
    Ok(ok(cart))
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query?;
    let filter = owner_filter(&state, &user, &query)?;
    let carts = CartService::list_carts(state.store.as_ref(), filter).await?;
    Ok(ok(carts))
}

/// GET /carts/me
pub async fn current(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    let response = match CartService::current_cart(state.store.as_ref(), &user).await? {
        CurrentCart::Found(cart) => ok(cart).into_response(),
        CurrentCart::None => ok(EmptyCartBody {
            message: "No active cart",
            cart: None,
        })
        .into_response(),
        CurrentCart::Unavailable => ok(EmptyCartBody {
            message: "Cart not found",
            cart: None,
        })
        .into_response(),
    };
    Ok(response)
}
