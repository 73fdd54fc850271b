//! Known internal pages (read-only catalog entries)

use serde::{Deserialize, Serialize};

/// Storefront flavour selecting which internal page catalog applies.
pub type SiteKind = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalPage {
    pub id: String,
    pub path: String,
}

impl InternalPage {
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }
}
