//! PostgreSQL repository implementations

pub mod menu_repo_impl;
pub mod catalog_repo_impl;

pub use menu_repo_impl::PgMenuRepository;
pub use catalog_repo_impl::PgCatalogRepository;
