use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use menu_core::InternalPage;

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectSiteKindRequest {
    pub site_kind: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteKindSelected {
    pub site_kind: String,
    pub pages: usize,
}

/// GET /api/v1/catalog/pages
pub async fn list_pages(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<InternalPage>>>, ApiError> {
    let pages = state.store.internal_pages().await?;
    Ok(Json(ApiResponse::success(pages.as_ref().clone())))
}

/// PUT /api/v1/catalog/site-kind
pub async fn select_site_kind(
    State(state): State<AppState>,
    Json(req): Json<SelectSiteKindRequest>,
) -> Result<Json<ApiResponse<SiteKindSelected>>, ApiError> {
    let site_kind = req.site_kind.trim();
    if site_kind.is_empty() {
        return Err(ApiError::BadRequest("siteKind must not be empty".to_string()));
    }
    let pages = state.store.select_site_kind(site_kind).await?;
    Ok(Json(ApiResponse::success(SiteKindSelected {
        site_kind: site_kind.to_string(),
        pages,
    })))
}
