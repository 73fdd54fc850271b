//! Pages collaborator (port)

use async_trait::async_trait;

use crate::domain::PageTriple;
use crate::error::MenuError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PagesGateway: Send + Sync {
    /// Idempotent upsert of page metadata keyed by path.
    async fn sync_pages_from_menu(&self, site_id: &str, items: &[PageTriple]) -> Result<(), MenuError>;
}
