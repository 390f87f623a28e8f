//! Resolve the calling user from the `Authorization` header.

use crate::error::AppError;
use crate::models::User;
use crate::service::{bearer_token, AuthService};
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

/// The authenticated user. Accepts `Bearer <token>` or the bare token; rejects
/// with 401 when the header is missing, empty or names no user.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("authorization header required".into()))?
            .to_str()
            .map_err(|_| AppError::Unauthorized("malformed authorization header".into()))?;
        let user = AuthService::authenticate(state.store.as_ref(), bearer_token(value)).await?;
        tracing::debug!(user_id = user.id, "request authenticated");
        Ok(CurrentUser(user))
    }
}
