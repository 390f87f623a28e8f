//! Response helpers shared by the handlers.

use axum::{http::StatusCode, Json};
use serde::Serialize;

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(data))
}

pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

/// Body for lookups that succeed without a record, e.g. `{"message": "No active cart", "cart": null}`.
#[derive(Serialize)]
pub struct EmptyCartBody {
    pub message: &'static str,
    pub cart: Option<()>,
}

#[derive(Serialize)]
pub struct TokenBody {
    pub token: String,
}
