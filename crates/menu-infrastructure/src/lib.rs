//! # Menu Infrastructure
//! 
//! PostgreSQL, HTTP and file system implementations of the menu ports (adapters).

pub mod database;
pub mod http;
pub mod storage;

pub use database::{create_pool, run_migrations, PgCatalogRepository, PgMenuRepository};
pub use http::HttpPagesClient;
pub use storage::FileDraftStorage;
