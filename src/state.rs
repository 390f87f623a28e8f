//! Shared application state for all routes. The store is injected, never global.

use crate::models::User;
use crate::store::Store;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Usernames allowed to list every user's carts and orders.
    pub admins: Arc<HashSet<String>>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, admins: impl IntoIterator<Item = String>) -> Self {
        AppState {
            store,
            admins: Arc::new(admins.into_iter().collect()),
        }
    }

    pub fn is_admin(&self, user: &User) -> bool {
        self.admins.contains(&user.username)
    }
}
