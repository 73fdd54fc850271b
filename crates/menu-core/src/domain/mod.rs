//! # Menu Core - Domain Module
//! 
//! Domain entities for the menu builder.

pub mod set_key;
pub mod menu_node;
pub mod editor_node;
pub mod internal_page;
pub mod page_triple;

// Re-export all entities and enums
pub use set_key::SetKey;
pub use menu_node::{FlatRow, MenuNode, MenuTreeNode};
pub use editor_node::{EditorNode, LinkTarget, Schedule};
pub use internal_page::{InternalPage, SiteKind};
pub use page_triple::PageTriple;
