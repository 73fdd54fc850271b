//! Route table.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{catalog, health, menus};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let menu_routes = Router::new()
        .route("/{set_key}/export", get(menus::export_menu))
        .route("/{set_key}/import", post(menus::import_menu))
        .route("/{set_key}/effective-links", get(menus::effective_links))
        .route("/{set_key}/{site_id}", get(menus::get_menu).put(menus::put_menu))
        .route("/{set_key}/{site_id}/save", post(menus::save_menu))
        .route("/{set_key}/{site_id}/pages-sync", post(menus::retry_pages_sync));

    let catalog_routes = Router::new()
        .route("/pages", get(catalog::list_pages))
        .route("/site-kind", put(catalog::select_site_kind));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1/menus", menu_routes)
        .nest("/api/v1/catalog", catalog_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
