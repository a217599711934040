//! # alerthub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `RuleStore` and `UserDirectory` port traits defined in
//!   `alerthub-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `alerthub-app` (for port traits) and `alerthub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod pool;
pub mod rule_store;
pub mod user_directory;

pub use error::StorageError;
pub use pool::{Config, Database};
pub use rule_store::SqliteRuleStore;
pub use user_directory::SqliteUserDirectory;
