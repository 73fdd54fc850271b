//! Repository and gateway traits (ports)

pub mod menu_repository;
pub mod pages_gateway;
pub mod catalog_gateway;
pub mod draft_storage;

pub use menu_repository::MenuRepository;
pub use pages_gateway::PagesGateway;
pub use catalog_gateway::CatalogGateway;
pub use draft_storage::{DraftStorage, MemoryDraftStorage};

#[cfg(test)]
pub use menu_repository::MockMenuRepository;
#[cfg(test)]
pub use pages_gateway::MockPagesGateway;
#[cfg(test)]
pub use catalog_gateway::MockCatalogGateway;
