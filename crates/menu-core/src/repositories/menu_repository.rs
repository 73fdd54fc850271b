//! Menu row persistence (port)

use async_trait::async_trait;
use menu_shared::PageRequest;

use crate::domain::{FlatRow, MenuNode, SetKey};
use crate::error::MenuError;
use crate::services::AbortSignal;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MenuRepository: Send + Sync {
    /// One page of rows scoped to (`set_key`, `site_id`). Returns
    /// `MenuError::Aborted` once `signal` fires.
    async fn fetch_menu_rows(
        &self,
        set_key: SetKey,
        site_id: &str,
        page: PageRequest,
        signal: AbortSignal,
    ) -> Result<Vec<MenuNode>, MenuError>;

    /// Full replace of the (`set_key`, `site_id`) partition: upsert every row
    /// by id, then delete persisted rows missing from `rows`. Returns the
    /// number of rows written.
    async fn save_menu_rows(
        &self,
        set_key: SetKey,
        site_id: &str,
        rows: &[FlatRow],
    ) -> Result<usize, MenuError>;
}
