use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::domain::{MenuNode, MenuTreeNode};

/// Sibling order: `sort_order` ascending, then case-sensitive title.
pub fn sibling_order(a: &MenuNode, b: &MenuNode) -> std::cmp::Ordering {
    a.sort_order
        .cmp(&b.sort_order)
        .then_with(|| a.title.cmp(&b.title))
}

/// Link a flat row list into a forest.
///
/// Rows whose parent is missing from the input become roots. A row found on
/// its own ancestor chain has its parent link cut and becomes a root, so
/// parent cycles never reach consumers. Duplicate ids keep the first row in
/// sibling order.
pub fn build(mut rows: Vec<MenuNode>) -> Vec<MenuTreeNode> {
    rows.sort_by(sibling_order);

    let mut seen = HashSet::with_capacity(rows.len());
    rows.retain(|row| {
        let fresh = seen.insert(row.id.clone());
        if !fresh {
            warn!("Duplicate menu node id {} dropped", row.id);
        }
        fresh
    });

    let index: HashMap<&str, usize> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| (row.id.as_str(), i))
        .collect();

    let mut parent: Vec<Option<usize>> = rows
        .iter()
        .map(|row| {
            let declared = row.parent_id.as_deref()?;
            let found = index.get(declared).copied();
            if found.is_none() {
                debug!("Menu node {} has missing parent {}, promoted to root", row.id, declared);
            }
            found
        })
        .collect();

    for i in 0..rows.len() {
        let mut visited = HashSet::from([i]);
        let mut cursor = parent[i];
        while let Some(p) = cursor {
            if p == i {
                warn!("Parent cycle through menu node {}, promoted to root", rows[i].id);
                parent[i] = None;
                break;
            }
            if !visited.insert(p) {
                // cycle further up; cut when one of its members is visited
                break;
            }
            cursor = parent[p];
        }
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); rows.len()];
    let mut roots = Vec::new();
    for (i, p) in parent.iter().enumerate() {
        match p {
            Some(p) => children[*p].push(i),
            None => roots.push(i),
        }
    }

    let mut slots: Vec<Option<MenuNode>> = rows.into_iter().map(Some).collect();
    roots
        .into_iter()
        .filter_map(|i| assemble(i, &mut slots, &children))
        .collect()
}

fn assemble(i: usize, slots: &mut [Option<MenuNode>], children: &[Vec<usize>]) -> Option<MenuTreeNode> {
    let node = slots[i].take()?;
    let kids = children[i]
        .iter()
        .filter_map(|&c| assemble(c, slots, children))
        .collect();
    Some(MenuTreeNode { node, children: kids })
}
