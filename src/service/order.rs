//! Checkout: active cart to order.

use super::OwnerFilter;
use crate::error::AppError;
use crate::models::{Order, User};
use crate::store::Store;

pub struct OrderService;

impl OrderService {
    /// Check out one of the user's carts. The store performs the ownership and
    /// status checks and all writes in a single transaction; the created order is
    /// then reloaded with its cart and user.
    pub async fn create_order(store: &dyn Store, user: &User, cart_id: i64) -> Result<Order, AppError> {
        let order_id = store.checkout(user.id, cart_id).await?;
        tracing::info!(user_id = user.id, cart_id, order_id, "order created");
        store
            .find_order(order_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("order {} missing after checkout", order_id)))
    }

    pub async fn list_orders(store: &dyn Store, filter: OwnerFilter) -> Result<Vec<Order>, AppError> {
        match filter {
            OwnerFilter::All => store.list_orders(None).await,
            OwnerFilter::Owner(owner) => store.list_orders(Some(owner)).await,
            OwnerFilter::Nothing => Ok(Vec::new()),
        }
    }
}
