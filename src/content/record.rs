//! Content record model

use serde::{Deserialize, Serialize};

/// Post author identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub avatar: String,
}

/// One piece of publishable content, fully derived from a markdown file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    /// Stable identifier, the filename without extension
    pub slug: String,

    /// Display title (falls back to the slug)
    pub title: String,

    /// Short summary derived from front-matter or the body
    pub excerpt: String,

    /// Author name and avatar reference
    pub author: Author,

    /// Publication date in `YYYY-MM-DD` form
    pub published_at: String,

    /// Estimated reading time, e.g. `"3 min read"`
    pub read_time: String,

    /// Category label assigned by source directory
    pub category: String,

    /// Whether the post is featured
    pub featured: bool,

    /// Post tags
    pub tags: Vec<String>,

    /// Optional cover image reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}
