// ============================================================================
// Menu Core - Menu Node Entity
// File: crates/menu-core/src/domain/menu_node.rs
// Description: Persisted menu rows and the tree built from them
// ============================================================================

use serde::{Deserialize, Serialize};

use super::SetKey;

/// Persisted menu row. Rows form a forest through `parent_id`, one forest
/// per (`set_key`, `site_id`) partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuNode {
    pub id: String,
    pub parent_id: Option<String>,
    pub title: String,
    pub path: Option<String>,
    pub icon: Option<String>,
    pub sort_order: i32,
    pub visible: bool,
    pub set_key: SetKey,
    pub site_id: String,
}

impl MenuNode {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A `MenuNode` with its children linked in sibling order.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuTreeNode {
    pub node: MenuNode,
    pub children: Vec<MenuTreeNode>,
}

impl MenuTreeNode {
    pub fn leaf(node: MenuNode) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including self.
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(MenuTreeNode::subtree_size).sum::<usize>()
    }
}

/// Persistence-shaped row produced by the flattener.
///
/// `visible` is always `true`: visibility toggles are not written back by a
/// save. `sort_order` is the 1-based position among siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatRow {
    pub id: String,
    pub parent_id: Option<String>,
    pub title: String,
    pub path: Option<String>,
    pub icon: Option<String>,
    pub sort_order: i32,
    pub visible: bool,
    pub set_key: SetKey,
}
