use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use menu_api::{build_router, AppState};
use menu_core::services::MenuStoreConfig;
use menu_core::MenuStore;
use menu_infrastructure::{
    create_pool, run_migrations, FileDraftStorage, HttpPagesClient, PgCatalogRepository, PgMenuRepository,
};
use menu_shared::config::AppConfig;
use menu_shared::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize telemetry; the guard flushes file logs on drop
    let _log_guard = init_telemetry(config.app.log_dir.as_deref())?;

    info!("{} starting ({})", config.app.name, config.app.env);

    // Connect to Database
    info!("Connecting to database...");
    let pool = create_pool(&config.database).await.context("Failed to connect to database")?;
    run_migrations(&pool).await.context("Failed to run migrations")?;
    info!("Database connection established.");

    // Wire the menu store
    let store = Arc::new(MenuStore::new(
        Arc::new(PgMenuRepository::new(pool.clone())),
        Arc::new(HttpPagesClient::new(&config.pages)),
        Arc::new(PgCatalogRepository::new(pool)),
        Arc::new(FileDraftStorage::new(config.menu.draft_dir.clone())),
        MenuStoreConfig::from(&config.menu),
        &config.menu.default_site_id,
    ));

    match store.restore_draft().await {
        Ok(sets) => info!("Draft restored for {} menu sets", sets),
        Err(e) => warn!("Ignoring unreadable menu draft: {}", e),
    }

    let state = AppState {
        store: store.clone(),
        config: config.clone(),
    };

    let app = build_router(state).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]),
    );

    // Bind address
    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Pending edits reach the draft slot before exit
    store.flush_draft().await;
    info!("Menu server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
