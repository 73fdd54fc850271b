//! Common types

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MENU_PAGE_SIZE, DRAFT_SLOT_KEY, MAX_MENU_PAGE_SIZE};

/// Storefront tenant identifier.
pub type SiteId = String;

/// One page of a paged fetch. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_MENU_PAGE_SIZE),
        }
    }

    pub fn first(page_size: u32) -> Self {
        Self::new(1, page_size)
    }

    pub fn next(self) -> Self {
        Self::new(self.page + 1, self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_MENU_PAGE_SIZE)
    }
}

/// How the local draft slot is partitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftScope {
    /// One slot shared by every site.
    Global,
    /// One slot per site id.
    #[default]
    PerSite,
}

impl DraftScope {
    pub fn slot_key(&self, base: &str, site_id: &str) -> String {
        match self {
            DraftScope::Global => base.to_string(),
            DraftScope::PerSite => format!("{}:{}", base, site_id),
        }
    }

    pub fn default_slot_key(&self, site_id: &str) -> String {
        self.slot_key(DRAFT_SLOT_KEY, site_id)
    }
}
