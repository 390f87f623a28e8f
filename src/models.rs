//! Records persisted by the store and returned by the API.
//! Credential fields are kept on [`User`] for the store's use but never serialized.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name given to carts opened on a user's behalf.
pub const DEFAULT_CART_NAME: &str = "My Cart";

/// Status assigned to catalog items created without one.
pub const DEFAULT_ITEM_STATUS: &str = "active";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    #[serde(skip)]
    pub token: Option<String>,
    /// Reference to the cart the user is currently assembling, if any.
    pub cart_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Cart lifecycle. `Completed` is reserved: nothing transitions into it yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    Active,
    CheckedOut,
    Completed,
}

impl CartStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CartStatus::Active => "active",
            CartStatus::CheckedOut => "checked_out",
            CartStatus::Completed => "completed",
        }
    }

    /// Only an active cart may be turned into an order.
    pub fn can_check_out(&self) -> bool {
        matches!(self, CartStatus::Active)
    }

    /// Items may only be linked while the cart is active; a checked-out cart
    /// belongs to its order.
    pub fn accepts_items(&self) -> bool {
        matches!(self, CartStatus::Active)
    }
}

impl std::fmt::Display for CartStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CartStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CartStatus::Active),
            "checked_out" => Ok(CartStatus::CheckedOut),
            "completed" => Ok(CartStatus::Completed),
            other => Err(AppError::Internal(format!("unknown cart status: {}", other))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub item_id: i64,
    pub item: Item,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Cart {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub status: CartStatus,
    pub created_at: DateTime<Utc>,
    /// Owning user; loaded by listings only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    pub cart_items: Vec<CartItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: i64,
    pub cart_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub cart: Cart,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            username: "alice".into(),
            password_hash: "$argon2id$secret".into(),
            token: Some("tok".into()),
            cart_id: Some(3),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn user_json_omits_credentials() {
        let json = serde_json::to_value(user()).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["cart_id"], 3);
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password").is_none());
        assert!(json.get("token").is_none());
    }

    #[test]
    fn cart_status_round_trips_through_text() {
        for status in [CartStatus::Active, CartStatus::CheckedOut, CartStatus::Completed] {
            assert_eq!(status.as_str().parse::<CartStatus>().unwrap(), status);
        }
        assert!("open".parse::<CartStatus>().is_err());
    }

    #[test]
    fn only_active_carts_can_check_out() {
        assert!(CartStatus::Active.can_check_out());
        assert!(!CartStatus::CheckedOut.can_check_out());
        assert!(!CartStatus::Completed.can_check_out());
        assert!(CartStatus::Active.accepts_items());
        assert!(!CartStatus::CheckedOut.accepts_items());
    }

    #[test]
    fn cart_serializes_status_snake_case_and_skips_unloaded_user() {
        let cart = Cart {
            id: 1,
            user_id: 7,
            name: DEFAULT_CART_NAME.into(),
            status: CartStatus::CheckedOut,
            created_at: Utc::now(),
            user: None,
            cart_items: Vec::new(),
        };
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json["status"], "checked_out");
        assert!(json.get("user").is_none());
        assert_eq!(json["cart_items"], serde_json::json!([]));
    }
}
