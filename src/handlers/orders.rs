//! Checkout and order listing.

use super::{owner_filter, ListQuery};
use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::response::{created, ok};
use crate::service::OrderService;
use crate::state::AppState;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub cart_id: i64,
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = body?;
    let order = OrderService::create_order(state.store.as_ref(), &user, req.cart_id).await?;
    Ok(created(order))
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query?;
    let filter = owner_filter(&state, &user, &query)?;
    let orders = OrderService::list_orders(state.store.as_ref(), filter).await?;
    Ok(ok(orders))
}
