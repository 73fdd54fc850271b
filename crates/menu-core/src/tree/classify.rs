use once_cell::sync::Lazy;
use regex::Regex;

use super::normalize;
use crate::domain::{InternalPage, LinkTarget};

static EXTERNAL_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://").expect("external url pattern is valid"));

/// Link target inferred from a stored path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub link: LinkTarget,
    /// Literal stored path for internal links (matched or not). External
    /// links carry their url in `link` instead.
    pub raw_path: Option<String>,
}

pub fn is_external(path: &str) -> bool {
    EXTERNAL_URL.is_match(path)
}

/// Classify a stored path against the known internal pages.
///
/// - empty path: internal without a page, raw value passed through
/// - `http(s)://...`: external, url is the raw value
/// - otherwise internal; the first page whose normalized path equals the
///   normalized input supplies `page_id`. An unmatched path keeps
///   `raw_path` so it is never lost.
pub fn classify(raw_path: Option<&str>, internal_pages: &[InternalPage]) -> Classification {
    let Some(normalized) = normalize(raw_path) else {
        return Classification {
            link: LinkTarget::unset(),
            raw_path: raw_path.map(str::to_string),
        };
    };

    if is_external(&normalized) {
        return Classification {
            link: LinkTarget::External {
                url: raw_path.unwrap_or_default().to_string(),
            },
            raw_path: None,
        };
    }

    let page_id = internal_pages
        .iter()
        .find(|page| normalize(Some(&page.path)).as_deref() == Some(normalized.as_str()))
        .map(|page| page.id.clone());

    Classification {
        link: LinkTarget::Internal { page_id },
        raw_path: raw_path.map(str::to_string),
    }
}

/// Normalized path of the catalog page with `page_id`.
pub fn resolve_internal_path(page_id: &str, internal_pages: &[InternalPage]) -> Option<String> {
    internal_pages
        .iter()
        .find(|page| page.id == page_id)
        .and_then(|page| normalize(Some(&page.path)))
}
