//! User, item, cart and order routes. Cart and order routes authenticate through
//! the `CurrentUser` extractor.

use crate::handlers::{carts, items, orders, users};
use crate::state::AppState;
use axum::{routing::get, routing::post, Router};

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/users", post(users::register).get(users::list))
        .route("/users/login", post(users::login))
        .route("/items", post(items::create).get(items::list))
        .route("/carts", post(carts::create).get(carts::list))
        .route("/carts/me", get(carts::current))
        .route("/orders", post(orders::create).get(orders::list))
        .with_state(state)
}
