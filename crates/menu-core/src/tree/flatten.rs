use super::classify::resolve_internal_path;
use super::normalize;
use crate::domain::{EditorNode, FlatRow, InternalPage, LinkTarget, SetKey};

/// Flatten an editor tree into persistence rows, depth-first pre-order.
///
/// `sort_order` restarts at 1 under every parent. Path precedence: a
/// non-blank `raw_path` (normalized), else the external url, else the
/// internal page's path, else `None`. Every row is emitted visible.
pub fn flatten(tree: &[EditorNode], set_key: SetKey, internal_pages: &[InternalPage]) -> Vec<FlatRow> {
    let mut rows = Vec::new();
    flatten_into(tree, None, set_key, internal_pages, &mut rows);
    rows
}

fn flatten_into(
    nodes: &[EditorNode],
    parent_id: Option<&str>,
    set_key: SetKey,
    internal_pages: &[InternalPage],
    rows: &mut Vec<FlatRow>,
) {
    for (position, node) in nodes.iter().enumerate() {
        rows.push(FlatRow {
            id: node.id.clone(),
            parent_id: parent_id.map(str::to_string),
            title: node.title.clone(),
            path: resolve_path(node, internal_pages),
            icon: node.icon.clone(),
            sort_order: i32::try_from(position + 1).unwrap_or(i32::MAX),
            visible: true,
            set_key,
        });
        flatten_into(&node.children, Some(&node.id), set_key, internal_pages, rows);
    }
}

/// Path persisted for `node`.
pub fn resolve_path(node: &EditorNode, internal_pages: &[InternalPage]) -> Option<String> {
    if let Some(raw) = node.raw_path.as_deref().filter(|raw| !raw.trim().is_empty()) {
        return normalize(Some(raw));
    }

    match &node.link {
        LinkTarget::External { url } => {
            let url = url.trim();
            (!url.is_empty()).then(|| url.to_string())
        }
        LinkTarget::Internal { page_id } => page_id
            .as_deref()
            .and_then(|id| resolve_internal_path(id, internal_pages)),
        LinkTarget::Scheduled { .. } => None,
    }
}
