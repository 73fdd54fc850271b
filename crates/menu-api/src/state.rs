use std::sync::Arc;

use menu_core::MenuStore;
use menu_shared::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MenuStore>,
    pub config: AppConfig,
}
