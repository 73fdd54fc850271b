use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::classify::is_external;
use super::flatten::resolve_path;
use crate::domain::{EditorNode, InternalPage, PageTriple};

static NON_SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"));

pub fn slugify(text: &str) -> String {
    NON_SLUG
        .replace_all(&text.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

fn slug_for(path: &str, title: &str) -> String {
    let segment = path.rsplit('/').find(|s| !s.is_empty()).map(slugify);
    match segment {
        Some(slug) if !slug.is_empty() => slug,
        _ => {
            let slug = slugify(title);
            if slug.is_empty() {
                "home".to_string()
            } else {
                slug
            }
        }
    }
}

/// (title, slug, path) for every node that resolves to a site-relative
/// path, in pre-order. External links and path-less nodes are skipped; a
/// path already emitted keeps its first title.
pub fn derive_triples(tree: &[EditorNode], internal_pages: &[InternalPage]) -> Vec<PageTriple> {
    let mut seen = HashSet::new();
    let mut triples = Vec::new();
    let mut stack: Vec<&EditorNode> = tree.iter().rev().collect();

    while let Some(node) = stack.pop() {
        stack.extend(node.children.iter().rev());

        let Some(path) = resolve_path(node, internal_pages) else {
            continue;
        };
        if is_external(&path) || !seen.insert(path.clone()) {
            continue;
        }
        triples.push(PageTriple {
            title: node.title.trim().to_string(),
            slug: slug_for(&path, &node.title),
            path,
        });
    }
    triples
}
