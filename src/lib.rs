//! Shopping cart service: user accounts, item catalog, carts and checkout.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use config::{AppConfig, StoreBackend};
pub use error::{AppError, ConfigError};
pub use routes::{api_routes, build_router, common_routes};
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_schema, MemoryStore, PgStore, Store};
