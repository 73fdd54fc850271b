// ============================================================================
// Menu Infrastructure - PostgreSQL Internal Page Catalog
// File: crates/menu-infrastructure/src/database/postgres/catalog_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::{debug, error};

use menu_core::domain::InternalPage;
use menu_core::error::MenuError;
use menu_core::repositories::CatalogGateway;

pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct InternalPageRow {
    pub id: String,
    pub path: String,
}

impl From<InternalPageRow> for InternalPage {
    fn from(row: InternalPageRow) -> Self {
        InternalPage::new(row.id, row.path)
    }
}

#[async_trait]
impl CatalogGateway for PgCatalogRepository {
    async fn fetch_internal_pages(&self, site_kind: &str) -> Result<Vec<InternalPage>, MenuError> {
        let rows: Vec<InternalPageRow> = sqlx::query_as(
            r#"
            SELECT id, path
            FROM internal_pages
            WHERE site_kind = $1
            ORDER BY path, id
            "#,
        )
        .bind(site_kind)
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error fetching internal pages: {}", e);
            MenuError::Database(e.to_string())
        })?;

        debug!("Fetched {} internal pages for {}", rows.len(), site_kind);
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
