use serde::{Deserialize, Serialize};

/// Page metadata derived from one menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTriple {
    pub title: String,
    pub slug: String,
    pub path: String,
}
