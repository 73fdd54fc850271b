use super::classify;
use crate::domain::{EditorNode, InternalPage, MenuTreeNode};

/// Map a built tree into editor nodes, classifying each stored path.
/// Schedules always start empty; they are not stored in menu rows.
pub fn to_editor(tree: &[MenuTreeNode], internal_pages: &[InternalPage]) -> Vec<EditorNode> {
    tree.iter()
        .map(|branch| {
            let classification = classify(branch.node.path.as_deref(), internal_pages);
            EditorNode {
                id: branch.node.id.clone(),
                title: branch.node.title.clone(),
                icon: branch.node.icon.clone(),
                visible: branch.node.visible,
                link: classification.link,
                raw_path: classification.raw_path,
                children: to_editor(&branch.children, internal_pages),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LinkTarget;
    use crate::tree::build;
    use crate::tree::builder::tests::row;

    #[test]
    fn test_to_editor_classifies_every_node() {
        let pages = vec![InternalPage::new("p-shop", "/shop")];
        let mut hidden = row("3", Some("1"), "Blog", Some("https://blog.example"), 2);
        hidden.visible = false;
        let tree = build(vec![
            row("1", None, "Home", Some("/"), 1),
            row("2", Some("1"), "Shop", Some("/shop/"), 1),
            hidden,
        ]);

        let editor = to_editor(&tree, &pages);
        assert_eq!(editor.len(), 1);
        let home = &editor[0];
        assert_eq!(home.link, LinkTarget::Internal { page_id: None });
        assert_eq!(home.raw_path.as_deref(), Some("/"));

        let shop = &home.children[0];
        assert_eq!(shop.link, LinkTarget::Internal { page_id: Some("p-shop".to_string()) });

        let blog = &home.children[1];
        assert_eq!(blog.link, LinkTarget::External { url: "https://blog.example".to_string() });
        assert!(!blog.visible);
    }
}
