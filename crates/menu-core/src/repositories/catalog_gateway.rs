//! Internal page catalog (port)

use async_trait::async_trait;

use crate::domain::InternalPage;
use crate::error::MenuError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn fetch_internal_pages(&self, site_kind: &str) -> Result<Vec<InternalPage>, MenuError>;
}
