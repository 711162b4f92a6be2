//! # herald-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `herald-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `herald-app` (for port traits) and `herald-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod codec;
mod error;
mod log_store;
mod pool;
mod rule_repo;
mod template_repo;

pub use error::StorageError;
pub use log_store::SqliteLogStore;
pub use pool::{Config, Database};
pub use rule_repo::SqliteRuleRepository;
pub use template_repo::SqliteTemplateRepository;
