//! Active-cart lifecycle: lazy open-or-reuse, item attachment and listings.

use super::OwnerFilter;
use crate::error::AppError;
use crate::models::{Cart, CartStatus, User, DEFAULT_CART_NAME};
use crate::store::Store;

/// Outcome of looking up the caller's current cart without creating one.
#[derive(Debug)]
pub enum CurrentCart {
    /// The referenced cart, in whatever status it is.
    Found(Cart),
    /// The user holds no cart reference.
    None,
    /// The user's reference points at a cart that cannot be loaded.
    Unavailable,
}

pub struct CartService;

impl CartService {
    /// Return the user's active cart, opening one if there is none.
    ///
    /// A reference to a cart that is missing, unreadable, owned by someone else
    /// or no longer active is replaced by a freshly opened cart.
    pub async fn ensure_active_cart(store: &dyn Store, user: &User) -> Result<Cart, AppError> {
        let Some(cart_id) = user.cart_id else {
            let cart = store.open_cart(user.id, DEFAULT_CART_NAME).await?;
            tracing::info!(user_id = user.id, cart_id = cart.id, "opened new cart");
            return Ok(cart);
        };

        let reason = match store.find_cart(cart_id).await {
            Ok(Some(cart)) if cart.user_id == user.id && cart.status == CartStatus::Active => {
                return Ok(cart);
            }
            Ok(Some(cart)) if cart.user_id != user.id => "owned by another user".to_string(),
            Ok(Some(cart)) => format!("status is {}", cart.status),
            Ok(None) => "cart does not exist".to_string(),
            Err(e) => format!("load failed: {}", e),
        };
        let cart = store.open_cart(user.id, DEFAULT_CART_NAME).await?;
        tracing::warn!(
            user_id = user.id,
            stale_cart_id = cart_id,
            cart_id = cart.id,
            reason = %reason,
            "replaced stale cart reference"
        );
        Ok(cart)
    }

    /// Link the given items to the cart, skipping unknown and already-linked ids,
    /// and return the reloaded cart. Fails with [`AppError::BadRequest`] when the
    /// cart was checked out in the meantime.
    pub async fn add_items(store: &dyn Store, cart: &Cart, item_ids: &[i64]) -> Result<Cart, AppError> {
        if !item_ids.is_empty() {
            let attached = store.attach_items(cart.id, item_ids).await?;
            tracing::debug!(
                cart_id = cart.id,
                requested = item_ids.len(),
                attached = attached.len(),
                "items attached"
            );
        }
        store
            .find_cart(cart.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("cart {}", cart.id)))
    }

    pub async fn list_carts(store: &dyn Store, filter: OwnerFilter) -> Result<Vec<Cart>, AppError> {
        match filter {
            OwnerFilter::All => store.list_carts(None).await,
            OwnerFilter::Owner(owner) => store.list_carts(Some(owner)).await,
            OwnerFilter::Nothing => Ok(Vec::new()),
        }
    }

    /// Look up the cart the user references, never creating one.
    pub async fn current_cart(store: &dyn Store, user: &User) -> Result<CurrentCart, AppError> {
        let Some(cart_id) = user.cart_id else {
            return Ok(CurrentCart::None);
        };
        match store.find_cart(cart_id).await {
            Ok(Some(cart)) => Ok(CurrentCart::Found(cart)),
            Ok(None) => Ok(CurrentCart::Unavailable),
            Err(e) => {
                tracing::warn!(user_id = user.id, cart_id, error = %e, "failed to load current cart");
                Ok(CurrentCart::Unavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn user(store: &MemoryStore, name: &str) -> User {
        store.create_user(name, "hash").await.unwrap()
    }

    async fn reload(store: &MemoryStore, name: &str) -> User {
        store.find_user_by_username(name).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn reuses_cart_while_reference_is_valid() {
        let store = MemoryStore::new();
        user(&store, "alice").await;

        let first = CartService::ensure_active_cart(&store, &reload(&store, "alice").await)
            .await
            .unwrap();
        let second = CartService::ensure_active_cart(&store, &reload(&store, "alice").await)
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.list_carts(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn dangling_reference_self_heals() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        store.set_cart_reference(alice.id, Some(404)).unwrap();

        let cart = CartService::ensure_active_cart(&store, &reload(&store, "alice").await)
            .await
            .unwrap();
        assert_ne!(cart.id, 404);
        assert_eq!(cart.status, CartStatus::Active);
        assert_eq!(reload(&store, "alice").await.cart_id, Some(cart.id));
    }

    #[tokio::test]
    async fn checked_out_or_foreign_reference_is_replaced() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;

        let bobs_cart = store.open_cart(bob.id, DEFAULT_CART_NAME).await.unwrap();
        store.set_cart_reference(alice.id, Some(bobs_cart.id)).unwrap();
        let cart = CartService::ensure_active_cart(&store, &reload(&store, "alice").await)
            .await
            .unwrap();
        assert_ne!(cart.id, bobs_cart.id);
        assert_eq!(cart.user_id, alice.id);

        store.checkout(alice.id, cart.id).await.unwrap();
        store.set_cart_reference(alice.id, Some(cart.id)).unwrap();
        let fresh = CartService::ensure_active_cart(&store, &reload(&store, "alice").await)
            .await
            .unwrap();
        assert_ne!(fresh.id, cart.id);
    }

    #[tokio::test]
    async fn add_items_is_idempotent_and_ignores_unknown_ids() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let widget = store.create_item("Widget", "active").await.unwrap();
        let cart = CartService::ensure_active_cart(&store, &alice).await.unwrap();

        let cart = CartService::add_items(&store, &cart, &[widget.id, 12345])
            .await
            .unwrap();
        let cart = CartService::add_items(&store, &cart, &[widget.id]).await.unwrap();
        assert_eq!(cart.cart_items.len(), 1);
        assert_eq!(cart.cart_items[0].item_id, widget.id);
    }

    #[tokio::test]
    async fn add_items_after_concurrent_checkout_leaves_order_untouched() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let widget = store.create_item("Widget", "active").await.unwrap();
        let cart = CartService::ensure_active_cart(&store, &alice).await.unwrap();
        let order_id = store.checkout(alice.id, cart.id).await.unwrap();

        let err = CartService::add_items(&store, &cart, &[widget.id]).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        let order = store.find_order(order_id).await.unwrap().unwrap();
        assert!(order.cart.cart_items.is_empty());
        assert_eq!(order.cart.status, CartStatus::CheckedOut);
    }

    #[tokio::test]
    async fn current_cart_reports_missing_reference() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        assert!(matches!(
            CartService::current_cart(&store, &alice).await.unwrap(),
            CurrentCart::None
        ));

        store.set_cart_reference(alice.id, Some(77)).unwrap();
        assert!(matches!(
            CartService::current_cart(&store, &reload(&store, "alice").await).await.unwrap(),
            CurrentCart::Unavailable
        ));
    }

    #[tokio::test]
    async fn nothing_filter_skips_the_store() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        store.open_cart(alice.id, DEFAULT_CART_NAME).await.unwrap();
        let carts = CartService::list_carts(&store, OwnerFilter::Nothing).await.unwrap();
        assert!(carts.is_empty());
    }
}
