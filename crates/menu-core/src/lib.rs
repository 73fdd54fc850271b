//! # Menu Core
//! 
//! Domain types, tree algorithms, ports and the menu store for the
//! storefront menu builder.

pub mod domain;
pub mod tree;
pub mod services;
pub mod repositories;
pub mod error;

// Re-export domain entities
pub use domain::*;
pub use error::{MenuError, Notice};
pub use services::{AbortController, AbortSignal, Debouncer, LoadOutcome, MenuStore, SaveReport, StoreStatus};
