//! Persistence interface over users, items, carts, cart items and orders.
//!
//! Workflow operations that touch more than one record (opening a cart,
//! attaching items, checkout) are single store calls so each implementation
//! can run them atomically.

mod memory;
mod postgres;
mod schema;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use schema::{ensure_database_exists, ensure_schema};

use crate::error::AppError;
use crate::models::{Cart, Item, Order, User};
use async_trait::async_trait;

#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap liveness probe used by readiness checks.
    async fn ping(&self) -> Result<(), AppError>;

    /// Insert a user. Fails with [`AppError::Conflict`] when the username is taken.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, AppError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, AppError>;

    /// Overwrite the user's session token.
    async fn set_user_token(&self, user_id: i64, token: &str) -> Result<(), AppError>;

    async fn list_users(&self) -> Result<Vec<User>, AppError>;

    async fn create_item(&self, name: &str, status: &str) -> Result<Item, AppError>;

    async fn list_items(&self) -> Result<Vec<Item>, AppError>;

    async fn count_items(&self) -> Result<i64, AppError>;

    /// Load a cart with its items (owning user not loaded).
    async fn find_cart(&self, cart_id: i64) -> Result<Option<Cart>, AppError>;

    /// Create an active cart for the user and point the user's cart reference at it.
    async fn open_cart(&self, user_id: i64, name: &str) -> Result<Cart, AppError>;

    /// Link items to a cart in order, skipping unknown items and items already
    /// linked. Returns the ids that were newly linked.
    async fn attach_items(&self, cart_id: i64, item_ids: &[i64]) -> Result<Vec<i64>, AppError>;

    /// Carts with items and owning user, optionally restricted to one owner.
    async fn list_carts(&self, owner: Option<i64>) -> Result<Vec<Cart>, AppError>;

    /// Turn the user's active cart into an order: create the order, mark the
    /// cart checked out and clear the user's reference to it. Returns the new
    /// order id. Fails with [`AppError::NotFound`] when the cart is missing or
    /// owned by someone else and [`AppError::BadRequest`] when it is no longer active.
    async fn checkout(&self, user_id: i64, cart_id: i64) -> Result<i64, AppError>;

    /// Load an order with its cart (and items) and user.
    async fn find_order(&self, order_id: i64) -> Result<Option<Order>, AppError>;

    async fn list_orders(&self, owner: Option<i64>) -> Result<Vec<Order>, AppError>;
}
