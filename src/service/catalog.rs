//! Item catalog.

use crate::error::AppError;
use crate::models::{Item, DEFAULT_ITEM_STATUS};
use crate::store::Store;

/// Items inserted into an empty catalog at startup.
pub const SEED_ITEMS: &[&str] = &["Laptop", "Mouse", "Keyboard", "Monitor", "Headphones"];

pub struct CatalogService;

impl CatalogService {
    /// Create an item; a missing or blank status becomes `active`.
    pub async fn create_item(store: &dyn Store, name: &str, status: Option<&str>) -> Result<Item, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("name is required".into()));
        }
        let status = status
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_ITEM_STATUS);
        let item = store.create_item(name, status).await?;
        tracing::debug!(item_id = item.id, name = %item.name, "item created");
        Ok(item)
    }

    pub async fn list_items(store: &dyn Store) -> Result<Vec<Item>, AppError> {
        store.list_items().await
    }

    /// Insert [`SEED_ITEMS`] when the catalog is empty. Returns how many were inserted.
    pub async fn seed(store: &dyn Store) -> Result<usize, AppError> {
        if store.count_items().await? > 0 {
            tracing::info!("catalog already seeded, skipping");
            return Ok(0);
        }
        for name in SEED_ITEMS {
            store.create_item(name, DEFAULT_ITEM_STATUS).await?;
        }
        tracing::info!(count = SEED_ITEMS.len(), "catalog seeded with sample items");
        Ok(SEED_ITEMS.len())
    }
}
