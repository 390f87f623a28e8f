//! Auth, catalog, cart and order workflows over an injected [`Store`](crate::store::Store).

mod auth;
mod cart;
mod catalog;
mod order;

pub use auth::{bearer_token, AuthService};
pub use cart::{CartService, CurrentCart};
pub use catalog::{CatalogService, SEED_ITEMS};
pub use order::OrderService;

use crate::models::User;

/// Which owner's records a listing may return.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OwnerFilter {
    All,
    Owner(i64),
    /// The caller asked for records it may not see.
    Nothing,
}

impl OwnerFilter {
    /// Admins may list anyone's records, or everything when no owner is requested.
    /// Everyone else is confined to their own records.
    pub fn for_caller(caller: &User, is_admin: bool, requested: Option<i64>) -> Self {
        match (is_admin, requested) {
            (true, None) => OwnerFilter::All,
            (true, Some(owner)) => OwnerFilter::Owner(owner),
            (false, None) => OwnerFilter::Owner(caller.id),
            (false, Some(owner)) if owner == caller.id => OwnerFilter::Owner(owner),
            (false, Some(_)) => OwnerFilter::Nothing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn caller(id: i64) -> User {
        User {
            id,
            username: format!("user{}", id),
            password_hash: String::new(),
            token: None,
            cart_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn admins_see_requested_owner_or_everything() {
        let admin = caller(1);
        assert_eq!(OwnerFilter::for_caller(&admin, true, None), OwnerFilter::All);
        assert_eq!(OwnerFilter::for_caller(&admin, true, Some(9)), OwnerFilter::Owner(9));
    }

    #[test]
    fn others_are_confined_to_their_own_records() {
        let user = caller(4);
        assert_eq!(OwnerFilter::for_caller(&user, false, None), OwnerFilter::Owner(4));
        assert_eq!(OwnerFilter::for_caller(&user, false, Some(4)), OwnerFilter::Owner(4));
        assert_eq!(OwnerFilter::for_caller(&user, false, Some(5)), OwnerFilter::Nothing);
    }
}
