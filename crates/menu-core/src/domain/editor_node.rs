// ============================================================================
// Menu Core - Editor Node
// File: crates/menu-core/src/domain/editor_node.rs
// Description: In-memory tree node edited by the menu builder
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Timed redirect: from `when` onwards the node points at `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub when: DateTime<Utc>,
    pub url: String,
}

impl Schedule {
    pub fn new(when: DateTime<Utc>, url: impl Into<String>) -> Self {
        Self { when, url: url.into() }
    }

    /// Latest entry with a non-empty url whose `when` is not after `now`.
    pub fn effective_url(schedules: &[Schedule], now: DateTime<Utc>) -> Option<&str> {
        schedules
            .iter()
            .filter(|s| s.when <= now && !s.url.trim().is_empty())
            .max_by_key(|s| s.when)
            .map(|s| s.url.as_str())
    }
}

/// What a menu entry points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "linkType", rename_all = "lowercase")]
pub enum LinkTarget {
    External {
        #[serde(rename = "externalUrl")]
        url: String,
    },
    /// `page_id` is `None` when nothing in the catalog matched, or the link
    /// was never set.
    Internal {
        #[serde(rename = "internalPageId", default, skip_serializing_if = "Option::is_none")]
        page_id: Option<String>,
    },
    /// Not persisted in menu rows; lives in the editor and its draft only.
    Scheduled {
        #[serde(default)]
        schedules: Vec<Schedule>,
    },
}

impl LinkTarget {
    pub fn unset() -> Self {
        LinkTarget::Internal { page_id: None }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LinkTarget::External { .. } => "external",
            LinkTarget::Internal { .. } => "internal",
            LinkTarget::Scheduled { .. } => "scheduled",
        }
    }
}

impl Default for LinkTarget {
    fn default() -> Self {
        LinkTarget::unset()
    }
}

/// Editor tree node. Each node owns its children exclusively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditorNode {
    #[validate(length(min = 1, message = "Menu node id must not be empty"))]
    pub id: String,

    #[validate(length(min = 1, max = 255, message = "Menu title must be between 1 and 255 characters"))]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default = "default_visible")]
    pub visible: bool,

    #[serde(flatten)]
    pub link: LinkTarget,

    /// Last path string known for this node, kept even when it matches no
    /// internal page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_path: Option<String>,

    #[serde(default)]
    #[validate(nested)]
    pub children: Vec<EditorNode>,
}

fn default_visible() -> bool {
    true
}

impl EditorNode {
    /// New visible node with a fresh id and no link.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            icon: None,
            visible: true,
            link: LinkTarget::unset(),
            raw_path: None,
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_link(mut self, link: LinkTarget) -> Self {
        self.link = link;
        self
    }

    pub fn with_raw_path(mut self, raw_path: impl Into<String>) -> Self {
        self.raw_path = Some(raw_path.into());
        self
    }

    pub fn with_children(mut self, children: Vec<EditorNode>) -> Self {
        self.children = children;
        self
    }

    /// Url this node resolves to at `now`, for scheduled links.
    pub fn effective_url(&self, now: DateTime<Utc>) -> Option<&str> {
        match &self.link {
            LinkTarget::Scheduled { schedules } => Schedule::effective_url(schedules, now),
            LinkTarget::External { url } => Some(url.as_str()),
            LinkTarget::Internal { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_effective_url_picks_latest_past_schedule() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let schedules = vec![
            Schedule::new(now - Duration::hours(1), "A"),
            Schedule::new(now + Duration::hours(1), "B"),
            Schedule::new(now - Duration::hours(2), "C"),
        ];
        assert_eq!(Schedule::effective_url(&schedules, now), Some("A"));
    }

    #[test]
    fn test_effective_url_skips_empty_urls() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let schedules = vec![
            Schedule::new(now - Duration::hours(3), "C"),
            Schedule::new(now - Duration::minutes(5), "  "),
        ];
        assert_eq!(Schedule::effective_url(&schedules, now), Some("C"));
        assert_eq!(Schedule::effective_url(&[], now), None);
    }

    #[test]
    fn test_link_target_json_shape() {
        let node = EditorNode::new("Sale")
            .with_id("n1")
            .with_link(LinkTarget::External { url: "https://x.com".into() });
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["linkType"], "external");
        assert_eq!(json["externalUrl"], "https://x.com");

        let back: EditorNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_deserialize_defaults() {
        let node: EditorNode =
            serde_json::from_str(r#"{"id":"a","title":"About","linkType":"internal"}"#).unwrap();
        assert!(node.visible);
        assert_eq!(node.link, LinkTarget::Internal { page_id: None });
        assert!(node.children.is_empty());
    }
}
