//! HTTP CRUD service for a list of todos backed by a relational table.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod store;

pub use config::{Config, ConfigError, DatabaseConfig, StorageMode};
pub use error::{ApiError, StoreError};
pub use handlers::AppState;
pub use router::router;
pub use store::{MemoryTodoStore, PgTodoStore, TodoChanges, TodoStore};
