//! JSON import/export of editor trees.

use validator::Validate;

use super::editor_ops::collect_ids;
use crate::domain::{EditorNode, LinkTarget};
use crate::error::MenuError;

pub fn export_json(tree: &[EditorNode]) -> Result<String, MenuError> {
    Ok(serde_json::to_string_pretty(tree)?)
}

/// Parse and validate a whole replacement tree. Nothing is returned unless
/// every node passes.
pub fn parse_import(text: &str) -> Result<Vec<EditorNode>, MenuError> {
    let tree: Vec<EditorNode> = serde_json::from_str(text)?;
    validate_tree(&tree)?;
    Ok(tree)
}

pub fn validate_tree(tree: &[EditorNode]) -> Result<(), MenuError> {
    for node in tree {
        node.validate()?;
    }
    collect_ids(tree)?;

    let mut stack: Vec<&EditorNode> = tree.iter().collect();
    while let Some(node) = stack.pop() {
        if node.title.trim().is_empty() {
            return Err(MenuError::Validation(format!("Menu node {} has a blank title", node.id)));
        }
        if let LinkTarget::External { url } = &node.link {
            if url.trim().is_empty() {
                return Err(MenuError::Validation(format!(
                    "External menu node {} has no url",
                    node.id
                )));
            }
        }
        stack.extend(node.children.iter());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_then_import() {
        let tree = vec![EditorNode::new("Home").with_id("1").with_children(vec![
            EditorNode::new("Sale")
                .with_id("2")
                .with_link(LinkTarget::External { url: "https://x.com/sale".into() }),
        ])];
        let json = export_json(&tree).unwrap();
        assert_eq!(parse_import(&json).unwrap(), tree);
    }

    #[test]
    fn test_import_rejects_malformed_json() {
        assert!(matches!(parse_import("[{"), Err(MenuError::Serialization(_))));
        assert!(matches!(parse_import(r#"{"id":"1"}"#), Err(MenuError::Serialization(_))));
    }

    #[test]
    fn test_import_rejects_invalid_nested_node() {
        let text = r#"[{"id":"1","title":"Home","linkType":"internal","children":[
            {"id":"2","title":"","linkType":"internal"}
        ]}]"#;
        assert!(matches!(parse_import(text), Err(MenuError::Validation(_))));

        let dup = r#"[{"id":"1","title":"A","linkType":"internal"},{"id":"1","title":"B","linkType":"internal"}]"#;
        assert!(matches!(parse_import(dup), Err(MenuError::Validation(_))));

        let no_url = r#"[{"id":"1","title":"A","linkType":"external","externalUrl":" "}]"#;
        assert!(matches!(parse_import(no_url), Err(MenuError::Validation(_))));
    }
}
