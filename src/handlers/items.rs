//! Catalog handlers.

use crate::error::AppError;
use crate::response::{created, ok};
use crate::service::CatalogService;
use crate::state::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, response::IntoResponse, Json};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = body?;
    let item = CatalogService::create_item(state.store.as_ref(), &req.name, req.status.as_deref()).await?;
    Ok(created(item))
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let items = CatalogService::list_items(state.store.as_ref()).await?;
    Ok(ok(items))
}
