//! [`Store`] backed by PostgreSQL through a `sqlx` pool.

use super::Store;
use crate::error::AppError;
use crate::models::{Cart, CartItem, CartStatus, Item, Order, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;

const USER_COLUMNS: &str = "id, username, password_hash, token, cart_id, created_at";
const CART_COLUMNS: &str = "id, user_id, name, status, created_at";

#[derive(sqlx::FromRow)]
struct CartRow {
    id: i64,
    user_id: i64,
    name: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl CartRow {
    fn into_cart(self, cart_items: Vec<CartItem>, user: Option<User>) -> Result<Cart, AppError> {
        Ok(Cart {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            status: self.status.parse()?,
            created_at: self.created_at,
            user,
            cart_items,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: i64,
    cart_id: i64,
    item_id: i64,
    item_name: String,
    item_status: String,
    item_created_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        CartItem {
            id: row.id,
            cart_id: row.cart_id,
            item_id: row.item_id,
            item: Item {
                id: row.item_id,
                name: row.item_name,
                status: row.item_status,
                created_at: row.item_created_at,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    cart_id: i64,
    user_id: i64,
    created_at: DateTime<Utc>,
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    /// Cart items (with their catalog item) for the given carts, grouped by cart id.
    async fn cart_items_for(&self, cart_ids: &[i64]) -> Result<HashMap<i64, Vec<CartItem>>, AppError> {
        let mut grouped: HashMap<i64, Vec<CartItem>> = HashMap::new();
        if cart_ids.is_empty() {
            return Ok(grouped);
        }
        let sql = "SELECT ci.id, ci.cart_id, ci.item_id, \
                   i.name AS item_name, i.status AS item_status, i.created_at AS item_created_at \
                   FROM cart_items ci JOIN items i ON i.id = ci.item_id \
                   WHERE ci.cart_id = ANY($1) ORDER BY ci.id";
        tracing::debug!(sql = %sql, cart_ids = ?cart_ids, "query");
        let rows: Vec<CartItemRow> = sqlx::query_as(sql).bind(cart_ids).fetch_all(&self.pool).await?;
        for row in rows {
            grouped.entry(row.cart_id).or_default().push(row.into());
        }
        Ok(grouped)
    }

    async fn users_by_id(&self, user_ids: &[i64]) -> Result<HashMap<i64, User>, AppError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!("SELECT {} FROM users WHERE id = ANY($1)", USER_COLUMNS);
        let users: Vec<User> = sqlx::query_as(&sql).bind(user_ids).fetch_all(&self.pool).await?;
        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }

    /// Carts with their items (owners not loaded), keyed by id.
    async fn carts_by_id(&self, cart_ids: &[i64]) -> Result<HashMap<i64, Cart>, AppError> {
        if cart_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!("SELECT {} FROM carts WHERE id = ANY($1)", CART_COLUMNS);
        let rows: Vec<CartRow> = sqlx::query_as(&sql).bind(cart_ids).fetch_all(&self.pool).await?;
        self.assemble_carts(rows, false)
            .await
            .map(|carts| carts.into_iter().map(|c| (c.id, c)).collect())
    }

    /// Batch-load items (and optionally owners) for cart rows, preserving row order.
    async fn assemble_carts(&self, rows: Vec<CartRow>, with_users: bool) -> Result<Vec<Cart>, AppError> {
        let cart_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut items = self.cart_items_for(&cart_ids).await?;
        let users = if with_users {
            let mut owner_ids: Vec<i64> = rows.iter().map(|r| r.user_id).collect();
            owner_ids.sort_unstable();
            owner_ids.dedup();
            self.users_by_id(&owner_ids).await?
        } else {
            HashMap::new()
        };
        rows.into_iter()
            .map(|row| {
                let cart_items = items.remove(&row.id).unwrap_or_default();
                let user = users.get(&row.user_id).cloned();
                row.into_cart(cart_items, user)
            })
            .collect()
    }

    async fn assemble_orders(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, AppError> {
        let mut cart_ids: Vec<i64> = rows.iter().map(|r| r.cart_id).collect();
        cart_ids.sort_unstable();
        cart_ids.dedup();
        let mut user_ids: Vec<i64> = rows.iter().map(|r| r.user_id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        let carts = self.carts_by_id(&cart_ids).await?;
        let users = self.users_by_id(&user_ids).await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let cart = carts
                .get(&row.cart_id)
                .cloned()
                .ok_or_else(|| AppError::Internal(format!("order {} references missing cart {}", row.id, row.cart_id)))?;
            let user = users
                .get(&row.user_id)
                .cloned()
                .ok_or_else(|| AppError::Internal(format!("order {} references missing user {}", row.id, row.user_id)))?;
            orders.push(Order {
                id: row.id,
                cart_id: row.cart_id,
                user_id: row.user_id,
                created_at: row.created_at,
                cart,
                user,
            });
        }
        Ok(orders)
    }
}

fn map_unique_violation(e: sqlx::Error, message: String) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(message),
        _ => AppError::Db(e),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as(&sql)
            .bind(username)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, format!("username '{}' already exists", username)))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        Ok(sqlx::query_as(&sql).bind(username).fetch_optional(&self.pool).await?)
    }

    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE token = $1", USER_COLUMNS);
        Ok(sqlx::query_as(&sql).bind(token).fetch_optional(&self.pool).await?)
    }

    async fn set_user_token(&self, user_id: i64, token: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET token = $1 WHERE id = $2")
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {}", user_id)));
        }
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        Ok(sqlx::query_as(&sql).fetch_all(&self.pool).await?)
    }

    async fn create_item(&self, name: &str, status: &str) -> Result<Item, AppError> {
        Ok(sqlx::query_as(
            "INSERT INTO items (name, status) VALUES ($1, $2) RETURNING id, name, status, created_at",
        )
        .bind(name)
        .bind(status)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_items(&self) -> Result<Vec<Item>, AppError> {
        Ok(sqlx::query_as("SELECT id, name, status, created_at FROM items ORDER BY id")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn count_items(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn find_cart(&self, cart_id: i64) -> Result<Option<Cart>, AppError> {
        let sql = format!("SELECT {} FROM carts WHERE id = $1", CART_COLUMNS);
        let row: Option<CartRow> = sqlx::query_as(&sql).bind(cart_id).fetch_optional(&self.pool).await?;
        match row {
            Some(row) => {
                let items = self.cart_items_for(&[row.id]).await?.remove(&row.id).unwrap_or_default();
                row.into_cart(items, None).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn open_cart(&self, user_id: i64, name: &str) -> Result<Cart, AppError> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            "INSERT INTO carts (user_id, name, status) VALUES ($1, $2, $3) RETURNING {}",
            CART_COLUMNS
        );
        let row: CartRow = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(name)
            .bind(CartStatus::Active.as_str())
            .fetch_one(&mut *tx)
            .await?;
        sqlx::query("UPDATE users SET cart_id = $1 WHERE id = $2")
            .bind(row.id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        row.into_cart(Vec::new(), None)
    }

    async fn attach_items(&self, cart_id: i64, item_ids: &[i64]) -> Result<Vec<i64>, AppError> {
        let mut tx = self.pool.begin().await?;
        // Row lock serializes attaches with each other and with checkout.
        let locked: Option<(String,)> = sqlx::query_as("SELECT status FROM carts WHERE id = $1 FOR UPDATE")
            .bind(cart_id)
            .fetch_optional(&mut *tx)
            .await?;
        let status: CartStatus = match locked {
            Some((s,)) => s.parse()?,
            None => return Err(AppError::NotFound(format!("cart {}", cart_id))),
        };
        if !status.accepts_items() {
            return Err(AppError::BadRequest(format!("cart {} is {}", cart_id, status)));
        }
        let mut attached = Vec::new();
        for &item_id in item_ids {
            let result = sqlx::query(
                "INSERT INTO cart_items (cart_id, item_id) \
                 SELECT $1, i.id FROM items i WHERE i.id = $2 \
                 AND NOT EXISTS (SELECT 1 FROM cart_items ci WHERE ci.cart_id = $1 AND ci.item_id = $2)",
            )
            .bind(cart_id)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() > 0 {
                attached.push(item_id);
            }
        }
        tx.commit().await?;
        Ok(attached)
    }

    async fn list_carts(&self, owner: Option<i64>) -> Result<Vec<Cart>, AppError> {
        let sql = format!(
            "SELECT {} FROM carts WHERE ($1::BIGINT IS NULL OR user_id = $1) ORDER BY id",
            CART_COLUMNS
        );
        let rows: Vec<CartRow> = sqlx::query_as(&sql).bind(owner).fetch_all(&self.pool).await?;
        self.assemble_carts(rows, true).await
    }

    async fn checkout(&self, user_id: i64, cart_id: i64) -> Result<i64, AppError> {
        let mut tx = self.pool.begin().await?;
        let status: Option<(String,)> =
            sqlx::query_as("SELECT status FROM carts WHERE id = $1 AND user_id = $2 FOR UPDATE")
                .bind(cart_id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;
        let status: CartStatus = match status {
            Some((s,)) => s.parse()?,
            None => {
                return Err(AppError::NotFound(
                    "cart not found or does not belong to user".into(),
                ))
            }
        };
        if !status.can_check_out() {
            return Err(AppError::BadRequest("cart already checked out".into()));
        }
        let (order_id,): (i64,) =
            sqlx::query_as("INSERT INTO orders (cart_id, user_id) VALUES ($1, $2) RETURNING id")
                .bind(cart_id)
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;
        sqlx::query("UPDATE carts SET status = $1 WHERE id = $2")
            .bind(CartStatus::CheckedOut.as_str())
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE users SET cart_id = NULL WHERE id = $1 AND cart_id = $2")
            .bind(user_id)
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(order_id)
    }

    async fn find_order(&self, order_id: i64) -> Result<Option<Order>, AppError> {
        let row: Option<OrderRow> =
            sqlx::query_as("SELECT id, cart_id, user_id, created_at FROM orders WHERE id = $1")
                .bind(order_id)
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some(row) => Ok(self.assemble_orders(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_orders(&self, owner: Option<i64>) -> Result<Vec<Order>, AppError> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            "SELECT id, cart_id, user_id, created_at FROM orders \
             WHERE ($1::BIGINT IS NULL OR user_id = $1) ORDER BY id",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        self.assemble_orders(rows).await
    }
}
