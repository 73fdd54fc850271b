// ============================================================================
// Menu Core - Set Key
// File: crates/menu-core/src/domain/set_key.rs
// Description: Tag partitioning independent menu trees of one site
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MenuError;

/// Menu set enumeration. Trees never cross set boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetKey {
    /// Storefront header navigation
    Home,
    /// Secondary (v1 layout) navigation
    V1,
}

impl SetKey {
    pub const ALL: [SetKey; 2] = [SetKey::Home, SetKey::V1];

    pub fn as_str(&self) -> &'static str {
        match self {
            SetKey::Home => "home",
            SetKey::V1 => "v1",
        }
    }
}

impl FromStr for SetKey {
    type Err = MenuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" => Ok(SetKey::Home),
            "v1" => Ok(SetKey::V1),
            other => Err(MenuError::UnknownSetKey(other.to_string())),
        }
    }
}

impl fmt::Display for SetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
