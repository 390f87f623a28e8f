//! In-process [`Store`]. All tables sit behind one lock, so every operation,
//! including the multi-record ones, is atomic with respect to the others.

use super::Store;
use crate::error::AppError;
use crate::models::{Cart, CartItem, CartStatus, Item, Order, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Rows keyed by a monotonically assigned id, like a serial primary key.
struct Table<T> {
    rows: BTreeMap<i64, T>,
    last_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Table {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<T: Clone> Table<T> {
    fn insert_with(&mut self, build: impl FnOnce(i64) -> T) -> T {
        self.last_id += 1;
        let row = build(self.last_id);
        self.rows.insert(self.last_id, row.clone());
        row
    }
}

#[derive(Clone)]
struct CartRecord {
    id: i64,
    user_id: i64,
    name: String,
    status: CartStatus,
    created_at: DateTime<Utc>,
}

#[derive(Clone)]
struct CartItemRecord {
    id: i64,
    cart_id: i64,
    item_id: i64,
}

#[derive(Clone)]
struct OrderRecord {
    id: i64,
    cart_id: i64,
    user_id: i64,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    users: Table<User>,
    items: Table<Item>,
    carts: Table<CartRecord>,
    cart_items: Table<CartItemRecord>,
    orders: Table<OrderRecord>,
}

impl Tables {
    fn cart(&self, cart_id: i64, with_user: bool) -> Option<Cart> {
        let record = self.carts.rows.get(&cart_id)?;
        let cart_items = self
            .cart_items
            .rows
            .values()
            .filter(|ci| ci.cart_id == cart_id)
            .filter_map(|ci| {
                self.items.rows.get(&ci.item_id).map(|item| CartItem {
                    id: ci.id,
                    cart_id: ci.cart_id,
                    item_id: ci.item_id,
                    item: item.clone(),
                })
            })
            .collect();
        let user = if with_user {
            self.users.rows.get(&record.user_id).cloned()
        } else {
            None
        };
        Some(Cart {
            id: record.id,
            user_id: record.user_id,
            name: record.name.clone(),
            status: record.status,
            created_at: record.created_at,
            user,
            cart_items,
        })
    }

    fn order(&self, record: &OrderRecord) -> Result<Order, AppError> {
        let cart = self.cart(record.cart_id, false).ok_or_else(|| {
            AppError::Internal(format!("order {} references missing cart {}", record.id, record.cart_id))
        })?;
        let user = self.users.rows.get(&record.user_id).cloned().ok_or_else(|| {
            AppError::Internal(format!("order {} references missing user {}", record.id, record.user_id))
        })?;
        Ok(Order {
            id: record.id,
            cart_id: record.cart_id,
            user_id: record.user_id,
            created_at: record.created_at,
            cart,
            user,
        })
    }

    fn user_mut(&mut self, user_id: i64) -> Result<&mut User, AppError> {
        self.users
            .rows
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, AppError> {
        self.tables
            .read()
            .map_err(|_| AppError::Internal("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, AppError> {
        self.tables
            .write()
            .map_err(|_| AppError::Internal("memory store lock poisoned".into()))
    }

    /// Point a user's cart reference at an arbitrary id, bypassing the workflow.
    /// Lets callers simulate a reference whose cart has gone missing.
    pub fn set_cart_reference(&self, user_id: i64, cart_id: Option<i64>) -> Result<(), AppError> {
        let mut tables = self.write()?;
        tables.user_mut(user_id)?.cart_id = cart_id;
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        self.read().map(|_| ())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, AppError> {
        let mut tables = self.write()?;
        if tables.users.rows.values().any(|u| u.username == username) {
            return Err(AppError::Conflict(format!("username '{}' already exists", username)));
        }
        Ok(tables.users.insert_with(|id| User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            token: None,
            cart_id: None,
            created_at: Utc::now(),
        }))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.read()?;
        Ok(tables.users.rows.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, AppError> {
        let tables = self.read()?;
        Ok(tables
            .users
            .rows
            .values()
            .find(|u| u.token.as_deref() == Some(token))
            .cloned())
    }

    async fn set_user_token(&self, user_id: i64, token: &str) -> Result<(), AppError> {
        let mut tables = self.write()?;
        tables.user_mut(user_id)?.token = Some(token.to_string());
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.read()?.users.rows.values().cloned().collect())
    }

    async fn create_item(&self, name: &str, status: &str) -> Result<Item, AppError> {
        let mut tables = self.write()?;
        Ok(tables.items.insert_with(|id| Item {
            id,
            name: name.to_string(),
            status: status.to_string(),
            created_at: Utc::now(),
        }))
    }

    async fn list_items(&self) -> Result<Vec<Item>, AppError> {
        Ok(self.read()?.items.rows.values().cloned().collect())
    }

    async fn count_items(&self) -> Result<i64, AppError> {
        Ok(self.read()?.items.rows.len() as i64)
    }

    async fn find_cart(&self, cart_id: i64) -> Result<Option<Cart>, AppError> {
        Ok(self.read()?.cart(cart_id, false))
    }

    async fn open_cart(&self, user_id: i64, name: &str) -> Result<Cart, AppError> {
        let mut tables = self.write()?;
        tables.user_mut(user_id)?;
        let record = tables.carts.insert_with(|id| CartRecord {
            id,
            user_id,
            name: name.to_string(),
            status: CartStatus::Active,
            created_at: Utc::now(),
        });
        tables.user_mut(user_id)?.cart_id = Some(record.id);
        tables
            .cart(record.id, false)
            .ok_or_else(|| AppError::Internal(format!("cart {} vanished after insert", record.id)))
    }

    async fn attach_items(&self, cart_id: i64, item_ids: &[i64]) -> Result<Vec<i64>, AppError> {
        let mut tables = self.write()?;
        let status = match tables.carts.rows.get(&cart_id) {
            Some(cart) => cart.status,
            None => return Err(AppError::NotFound(format!("cart {}", cart_id))),
        };
        if !status.accepts_items() {
            return Err(AppError::BadRequest(format!("cart {} is {}", cart_id, status)));
        }
        let mut attached = Vec::new();
        for &item_id in item_ids {
            if !tables.items.rows.contains_key(&item_id) {
                continue;
            }
            let linked = tables
                .cart_items
                .rows
                .values()
                .any(|ci| ci.cart_id == cart_id && ci.item_id == item_id);
            if linked {
                continue;
            }
            tables.cart_items.insert_with(|id| CartItemRecord { id, cart_id, item_id });
            attached.push(item_id);
        }
        Ok(attached)
    }

    async fn list_carts(&self, owner: Option<i64>) -> Result<Vec<Cart>, AppError> {
        let tables = self.read()?;
        Ok(tables
            .carts
            .rows
            .values()
            .filter(|c| owner.map_or(true, |o| c.user_id == o))
            .filter_map(|c| tables.cart(c.id, true))
            .collect())
    }

    async fn checkout(&self, user_id: i64, cart_id: i64) -> Result<i64, AppError> {
        let mut tables = self.write()?;
        let status = match tables.carts.rows.get(&cart_id) {
            Some(cart) if cart.user_id == user_id => cart.status,
            _ => {
                return Err(AppError::NotFound(
                    "cart not found or does not belong to user".into(),
                ))
            }
        };
        if !status.can_check_out() {
            return Err(AppError::BadRequest("cart already checked out".into()));
        }
        let order = tables.orders.insert_with(|id| OrderRecord {
            id,
            cart_id,
            user_id,
            created_at: Utc::now(),
        });
        if let Some(cart) = tables.carts.rows.get_mut(&cart_id) {
            cart.status = CartStatus::CheckedOut;
        }
        let user = tables.user_mut(user_id)?;
        if user.cart_id == Some(cart_id) {
            user.cart_id = None;
        }
        Ok(order.id)
    }

    async fn find_order(&self, order_id: i64) -> Result<Option<Order>, AppError> {
        let tables = self.read()?;
        match tables.orders.rows.get(&order_id) {
            Some(record) => tables.order(record).map(Some),
            None => Ok(None),
        }
    }

    async fn list_orders(&self, owner: Option<i64>) -> Result<Vec<Order>, AppError> {
        let tables = self.read()?;
        tables
            .orders
            .rows
            .values()
            .filter(|o| owner.map_or(true, |u| o.user_id == u))
            .map(|o| tables.order(o))
            .collect()
    }
}
