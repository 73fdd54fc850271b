//! Domain errors

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MenuError {
    /// A superseded load was cancelled. Never shown to users.
    #[error("Request aborted")]
    Aborted,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Draft storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Menu node not found: {0}")]
    NotFound(String),

    #[error("Unknown menu set key: {0}")]
    UnknownSetKey(String),

    /// Menu rows were saved but the pages collaborator rejected the sync.
    #[error("Menu saved ({saved_rows} rows) but page sync failed: {message}")]
    PagesSync { saved_rows: usize, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MenuError {
    pub fn is_aborted(&self) -> bool {
        matches!(self, MenuError::Aborted)
    }

    /// Transient banner shown by the admin UI.
    pub fn notice(&self) -> Notice {
        let title = match self {
            MenuError::Aborted => "Request cancelled",
            MenuError::Network(_) => "Connection problem",
            MenuError::Database(_) => "Could not reach the menu store",
            MenuError::Storage(_) => "Draft not saved locally",
            MenuError::Validation(_) => "Invalid menu",
            MenuError::NotFound(_) => "Menu item not found",
            MenuError::UnknownSetKey(_) => "Unknown menu set",
            MenuError::PagesSync { .. } => "Menu saved, pages not synchronized",
            MenuError::Serialization(_) => "Malformed menu data",
            MenuError::Internal(_) => "Unexpected error",
        };
        Notice {
            title: title.to_string(),
            message: self.to_string(),
        }
    }
}

impl From<serde_json::Error> for MenuError {
    fn from(e: serde_json::Error) -> Self {
        MenuError::Serialization(e.to_string())
    }
}

impl From<validator::ValidationErrors> for MenuError {
    fn from(e: validator::ValidationErrors) -> Self {
        MenuError::Validation(e.to_string())
    }
}

/// Human-readable failure notice (title + message).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
}
