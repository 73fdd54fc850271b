// ============================================================================
// Menu API - Menu Handlers
// File: crates/menu-api/src/handlers/menus.rs
// ============================================================================

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use menu_core::services::ScheduledLink;
use menu_core::{EditorNode, LoadOutcome, SaveReport, SetKey, StoreStatus};

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuView {
    pub set_key: SetKey,
    pub site_id: String,
    pub outcome: Option<LoadOutcome>,
    pub status: StoreStatus,
    pub nodes: Vec<EditorNode>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSyncResult {
    pub triples_pushed: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub imported: usize,
}

fn view(state: &AppState, set_key: SetKey, site_id: String, outcome: Option<LoadOutcome>) -> MenuView {
    MenuView {
        set_key,
        site_id,
        outcome,
        status: state.store.status(set_key),
        nodes: state.store.tree(set_key).as_ref().clone(),
    }
}

/// GET /api/v1/menus/{set_key}/{site_id}
pub async fn get_menu(
    State(state): State<AppState>,
    Path((set_key, site_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<MenuView>>, ApiError> {
    let set_key: SetKey = set_key.parse()?;
    let outcome = state.store.load_from_server(set_key, &site_id).await?;
    Ok(Json(ApiResponse::success(view(&state, set_key, site_id, Some(outcome)))))
}

/// PUT /api/v1/menus/{set_key}/{site_id}
pub async fn put_menu(
    State(state): State<AppState>,
    Path((set_key, site_id)): Path<(String, String)>,
    Json(nodes): Json<Vec<EditorNode>>,
) -> Result<Json<ApiResponse<SaveReport>>, ApiError> {
    let set_key: SetKey = set_key.parse()?;
    state.store.ensure_active_site(&site_id)?;
    state.store.replace_tree(set_key, nodes)?;
    let report = state.store.save_to_server(set_key, &site_id).await?;
    info!("Menu {}/{} replaced and saved", set_key, site_id);
    Ok(Json(ApiResponse::success(report)))
}

/// POST /api/v1/menus/{set_key}/{site_id}/save
pub async fn save_menu(
    State(state): State<AppState>,
    Path((set_key, site_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<SaveReport>>, ApiError> {
    let set_key: SetKey = set_key.parse()?;
    let report = state.store.save_to_server(set_key, &site_id).await?;
    Ok(Json(ApiResponse::success(report)))
}

/// POST /api/v1/menus/{set_key}/{site_id}/pages-sync
pub async fn retry_pages_sync(
    State(state): State<AppState>,
    Path((set_key, site_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<PageSyncResult>>, ApiError> {
    let set_key: SetKey = set_key.parse()?;
    let triples_pushed = state.store.retry_page_sync(set_key, &site_id).await?;
    Ok(Json(ApiResponse::success(PageSyncResult { triples_pushed })))
}

/// GET /api/v1/menus/{set_key}/export
pub async fn export_menu(
    State(state): State<AppState>,
    Path(set_key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let set_key: SetKey = set_key.parse()?;
    let json = state.store.export_json(set_key)?;
    let disposition = format!("attachment; filename=\"menu-{}.json\"", set_key);
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        json,
    ))
}

/// POST /api/v1/menus/{set_key}/import
///
/// The body is the exported JSON document; nothing changes unless the whole
/// document is valid.
pub async fn import_menu(
    State(state): State<AppState>,
    Path(set_key): Path<String>,
    body: String,
) -> Result<Json<ApiResponse<ImportResult>>, ApiError> {
    let set_key: SetKey = set_key.parse()?;
    if body.trim().is_empty() {
        return Err(ApiError::BadRequest("Import body is empty".to_string()));
    }
    let imported = state.store.import_json(set_key, &body)?;
    Ok(Json(ApiResponse::success(ImportResult { imported })))
}

/// GET /api/v1/menus/{set_key}/effective-links
pub async fn effective_links(
    State(state): State<AppState>,
    Path(set_key): Path<String>,
) -> Result<Json<ApiResponse<Vec<ScheduledLink>>>, ApiError> {
    let set_key: SetKey = set_key.parse()?;
    Ok(Json(ApiResponse::success(state.store.effective_links(set_key, Utc::now()))))
}
