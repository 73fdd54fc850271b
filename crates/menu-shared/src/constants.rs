//! Application-wide constants

/// Local draft slot holding the full `{set_key: [EditorNode]}` map.
pub const DRAFT_SLOT_KEY: &str = "menu_builder_v2_dualsets";
pub const DEFAULT_DRAFT_DEBOUNCE_MS: u64 = 400;
pub const DEFAULT_MENU_PAGE_SIZE: u32 = 500;
pub const MAX_MENU_PAGE_SIZE: u32 = 5_000;
pub const MAX_TITLE_LENGTH: u64 = 255;
pub const PAGES_SYNC_ENDPOINT: &str = "/api/pages/sync-from-menu";
