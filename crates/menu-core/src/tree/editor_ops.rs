//! Structural edits on an editor forest.

use std::collections::HashSet;

use serde::Deserialize;

use crate::domain::{EditorNode, LinkTarget};
use crate::error::MenuError;

/// Partial update of a node's own fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePatch {
    pub title: Option<String>,
    /// `Some(None)` clears the icon.
    #[serde(default, with = "double_option")]
    pub icon: Option<Option<String>>,
    pub visible: Option<bool>,
}

mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(Some)
    }
}

pub fn find_node<'a>(nodes: &'a [EditorNode], id: &str) -> Option<&'a EditorNode> {
    nodes.iter().find_map(|node| {
        if node.id == id {
            Some(node)
        } else {
            find_node(&node.children, id)
        }
    })
}

pub fn find_node_mut<'a>(nodes: &'a mut [EditorNode], id: &str) -> Option<&'a mut EditorNode> {
    for node in nodes.iter_mut() {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_node_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

/// Every id in the forest, or the first duplicate.
pub fn collect_ids(nodes: &[EditorNode]) -> Result<HashSet<String>, MenuError> {
    let mut ids = HashSet::new();
    let mut stack: Vec<&EditorNode> = nodes.iter().collect();
    while let Some(node) = stack.pop() {
        if !ids.insert(node.id.clone()) {
            return Err(MenuError::Validation(format!("Duplicate menu node id: {}", node.id)));
        }
        stack.extend(node.children.iter());
    }
    Ok(ids)
}

fn siblings_mut<'a>(
    tree: &'a mut Vec<EditorNode>,
    parent_id: Option<&str>,
) -> Result<&'a mut Vec<EditorNode>, MenuError> {
    match parent_id {
        None => Ok(tree),
        Some(pid) => find_node_mut(tree, pid)
            .map(|parent| &mut parent.children)
            .ok_or_else(|| MenuError::NotFound(pid.to_string())),
    }
}

/// Insert `node` under `parent_id` (root when `None`) at `index`, or last.
pub fn add_node(
    tree: &mut Vec<EditorNode>,
    parent_id: Option<&str>,
    node: EditorNode,
    index: Option<usize>,
) -> Result<(), MenuError> {
    let existing = collect_ids(tree)?;
    let incoming = collect_ids(std::slice::from_ref(&node))?;
    if let Some(dup) = incoming.iter().find(|id| existing.contains(*id)) {
        return Err(MenuError::Validation(format!("Duplicate menu node id: {}", dup)));
    }

    let siblings = siblings_mut(tree, parent_id)?;
    let at = index.unwrap_or(siblings.len()).min(siblings.len());
    siblings.insert(at, node);
    Ok(())
}

/// Detach and return the node with `id`, children included.
pub fn remove_node(tree: &mut Vec<EditorNode>, id: &str) -> Result<EditorNode, MenuError> {
    if let Some(pos) = tree.iter().position(|n| n.id == id) {
        return Ok(tree.remove(pos));
    }
    for node in tree.iter_mut() {
        match remove_node(&mut node.children, id) {
            Ok(found) => return Ok(found),
            Err(MenuError::NotFound(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(MenuError::NotFound(id.to_string()))
}

/// Re-parent `id` under `new_parent` at `index`. Moving a node below itself
/// or one of its descendants is rejected and leaves the tree untouched.
pub fn move_node(
    tree: &mut Vec<EditorNode>,
    id: &str,
    new_parent: Option<&str>,
    index: Option<usize>,
) -> Result<(), MenuError> {
    let moving = find_node(tree, id).ok_or_else(|| MenuError::NotFound(id.to_string()))?;
    if let Some(target) = new_parent {
        if find_node(std::slice::from_ref(moving), target).is_some() {
            return Err(MenuError::Validation(format!(
                "Cannot move menu node {} under its own subtree",
                id
            )));
        }
        if find_node(tree, target).is_none() {
            return Err(MenuError::NotFound(target.to_string()));
        }
    }

    let node = remove_node(tree, id)?;
    let siblings = siblings_mut(tree, new_parent)?;
    let at = index.unwrap_or(siblings.len()).min(siblings.len());
    siblings.insert(at, node);
    Ok(())
}

pub fn update_node(tree: &mut [EditorNode], id: &str, patch: NodePatch) -> Result<(), MenuError> {
    if let Some(title) = patch.title.as_deref() {
        if title.trim().is_empty() {
            return Err(MenuError::Validation("Menu title must not be empty".to_string()));
        }
    }

    let node = find_node_mut(tree, id).ok_or_else(|| MenuError::NotFound(id.to_string()))?;
    if let Some(title) = patch.title {
        node.title = title.trim().to_string();
    }
    if let Some(icon) = patch.icon {
        node.icon = icon;
    }
    if let Some(visible) = patch.visible {
        node.visible = visible;
    }
    Ok(())
}

/// Replace the link target. The stored raw path is cleared so the new
/// target decides the persisted path.
pub fn set_link(tree: &mut [EditorNode], id: &str, link: LinkTarget) -> Result<(), MenuError> {
    let node = find_node_mut(tree, id).ok_or_else(|| MenuError::NotFound(id.to_string()))?;
    node.link = link;
    node.raw_path = None;
    Ok(())
}

pub fn set_raw_path(tree: &mut [EditorNode], id: &str, raw_path: Option<String>) -> Result<(), MenuError> {
    let node = find_node_mut(tree, id).ok_or_else(|| MenuError::NotFound(id.to_string()))?;
    node.raw_path = raw_path;
    Ok(())
}
