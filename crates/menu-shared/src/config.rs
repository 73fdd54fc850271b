//! Configuration management

use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::constants::{DEFAULT_DRAFT_DEBOUNCE_MS, DEFAULT_MENU_PAGE_SIZE, DRAFT_SLOT_KEY};
use crate::types::DraftScope;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub pages: PagesSettings,
    pub menu: MenuSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

/// Pages collaborator endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct PagesSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MenuSettings {
    pub page_size: u32,
    pub draft_dir: PathBuf,
    pub draft_key: String,
    pub draft_debounce_ms: u64,
    pub draft_scope: DraftScope,
    pub site_kind: String,
    pub default_site_id: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("MENU")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Defaults only, no files or environment.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder()?.build()?.try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("app.env", "development")?
            .set_default("app.host", "127.0.0.1")?
            .set_default("app.port", 8080)?
            .set_default("app.name", "menu-server")?
            .set_default("database.url", "postgres://localhost:5432/storefront")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.acquire_timeout_seconds", 3)?
            .set_default("pages.base_url", "http://127.0.0.1:3000")?
            .set_default("pages.timeout_seconds", 30)?
            .set_default("menu.page_size", DEFAULT_MENU_PAGE_SIZE)?
            .set_default("menu.draft_dir", "data/drafts")?
            .set_default("menu.draft_key", DRAFT_SLOT_KEY)?
            .set_default("menu.draft_debounce_ms", DEFAULT_DRAFT_DEBOUNCE_MS)?
            .set_default("menu.draft_scope", "per_site")?
            .set_default("menu.site_kind", "storefront")?
            .set_default("menu.default_site_id", "default")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_deserialize() {
        let config = AppConfig::defaults().unwrap();
        assert_eq!(config.app.port, 8080);
        assert_eq!(config.menu.draft_key, "menu_builder_v2_dualsets");
        assert_eq!(config.menu.draft_scope, DraftScope::PerSite);
        assert_eq!(config.menu.page_size, DEFAULT_MENU_PAGE_SIZE);
        assert!(config.app.log_dir.is_none());
    }
}
