//! Registration, login and user listing.

use crate::error::AppError;
use crate::response::{created, ok, TokenBody};
use crate::service::AuthService;
use crate::state::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, response::IntoResponse, Json};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = body?;
    let user = AuthService::register(state.store.as_ref(), &req.username, &req.password).await?;
    Ok(created(user))
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = body?;
    let token = AuthService::login(state.store.as_ref(), &req.username, &req.password).await?;
    Ok(ok(TokenBody { token }))
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = AuthService::list_users(state.store.as_ref()).await?;
    Ok(ok(users))
}
