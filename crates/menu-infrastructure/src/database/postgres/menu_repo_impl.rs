// ============================================================================
// Menu Infrastructure - PostgreSQL Menu Repository
// File: crates/menu-infrastructure/src/database/postgres/menu_repo_impl.rs
// ============================================================================

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{debug, error, info};

use menu_core::domain::{FlatRow, MenuNode, SetKey};
use menu_core::error::MenuError;
use menu_core::repositories::MenuRepository;
use menu_core::services::AbortSignal;
use menu_shared::PageRequest;

/// Bind parameters per upserted row.
const COLUMNS_PER_ROW: usize = 9;
/// Stays below the PostgreSQL limit of 65535 bind parameters per statement.
const UPSERT_CHUNK_ROWS: usize = 60_000 / COLUMNS_PER_ROW;

pub struct PgMenuRepository {
    pool: PgPool,
}

impl PgMenuRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct MenuNodeRow {
    pub id: String,
    pub parent_id: Option<String>,
    pub title: String,
    pub path: Option<String>,
    pub icon: Option<String>,
    pub sort_order: i32,
    pub visible: bool,
    pub set_key: String,
    pub site_id: String,
}

impl TryFrom<MenuNodeRow> for MenuNode {
    type Error = MenuError;

    fn try_from(row: MenuNodeRow) -> Result<Self, Self::Error> {
        Ok(MenuNode {
            id: row.id,
            parent_id: row.parent_id,
            title: row.title,
            path: row.path,
            icon: row.icon,
            sort_order: row.sort_order,
            visible: row.visible,
            set_key: SetKey::from_str(&row.set_key)?,
            site_id: row.site_id,
        })
    }
}

/// Rows outside the saved set are left alone: ids only conflict within
/// their own (`site_id`, `set_key`) partition.
fn upsert_query<'a>(chunk: &'a [FlatRow], set_key: SetKey, site_id: &'a str) -> QueryBuilder<'a, Postgres> {
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
        r#"
        INSERT INTO menu_nodes (
            id, parent_id, title, path, icon,
            sort_order, visible, set_key, site_id
        )
        "#,
    );
    query_builder.push_values(chunk, |mut b, row| {
        b.push_bind(&row.id)
            .push_bind(&row.parent_id)
            .push_bind(&row.title)
            .push_bind(&row.path)
            .push_bind(&row.icon)
            .push_bind(row.sort_order)
            .push_bind(row.visible)
            .push_bind(set_key.as_str())
            .push_bind(site_id);
    });
    query_builder.push(
        r#"
        ON CONFLICT (site_id, set_key, id) DO UPDATE SET
            parent_id = EXCLUDED.parent_id,
            title = EXCLUDED.title,
            path = EXCLUDED.path,
            icon = EXCLUDED.icon,
            sort_order = EXCLUDED.sort_order,
            visible = EXCLUDED.visible,
            modified_at = NOW()
        "#,
    );
    query_builder
}

const DELETE_MISSING_SQL: &str = r#"
    DELETE FROM menu_nodes
    WHERE set_key = $1 AND site_id = $2 AND NOT (id = ANY($3))
"#;

fn db_error(context: &str, e: sqlx::Error) -> MenuError {
    error!("Database error {}: {}", context, e);
    MenuError::Database(e.to_string())
}

#[async_trait]
impl MenuRepository for PgMenuRepository {
    async fn fetch_menu_rows(
        &self,
        set_key: SetKey,
        site_id: &str,
        page: PageRequest,
        signal: AbortSignal,
    ) -> Result<Vec<MenuNode>, MenuError> {
        signal.check()?;

        let query = sqlx::query_as::<_, MenuNodeRow>(
            r#"
            SELECT
                id, parent_id, title, path, icon,
                sort_order, visible, set_key, site_id
            FROM menu_nodes
            WHERE set_key = $1 AND site_id = $2
            ORDER BY sort_order, title, id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(set_key.as_str())
        .bind(site_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool);

        let rows = tokio::select! {
            rows = query => rows.map_err(|e| db_error("fetching menu rows", e))?,
            _ = signal.aborted() => {
                debug!("Menu fetch for {}/{} aborted", set_key, site_id);
                return Err(MenuError::Aborted);
            }
        };

        rows.into_iter().map(MenuNode::try_from).collect()
    }

    async fn save_menu_rows(
        &self,
        set_key: SetKey,
        site_id: &str,
        rows: &[FlatRow],
    ) -> Result<usize, MenuError> {
        info!("Saving {} menu rows for {}/{}", rows.len(), set_key, site_id);

        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("starting menu save", e))?;

        for chunk in rows.chunks(UPSERT_CHUNK_ROWS) {
            upsert_query(chunk, set_key, site_id)
                .build()
                .execute(&mut *transaction)
                .await
                .map_err(|e| db_error("upserting menu rows", e))?;
        }

        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let removed = sqlx::query(DELETE_MISSING_SQL)
            .bind(set_key.as_str())
            .bind(site_id)
            .bind(&ids)
            .execute(&mut *transaction)
            .await
            .map_err(|e| db_error("deleting removed menu rows", e))?
            .rows_affected();

        transaction
            .commit()
            .await
            .map_err(|e| db_error("committing menu save", e))?;

        debug!("Menu {}/{} saved, {} stale rows removed", set_key, site_id, removed);
        Ok(rows.len())
    }
}
