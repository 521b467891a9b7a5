//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::content::Author;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub url: String,

    // Directory
    pub content_dir: String,
    pub public_dir: String,

    /// Default author identity for posts without an `author` field
    pub author: Author,

    /// Category directories and their display labels, in listing order
    pub categories: Vec<CategoryConfig>,
}

/// One content category: a directory under `content_dir` plus the label
/// assigned to records loaded from it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub dir: String,
    pub label: String,
}

impl CategoryConfig {
    fn new(dir: &str, label: &str) -> Self {
        Self {
            dir: dir.to_string(),
            label: label.to_string(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            url: "http://localhost".to_string(),
            content_dir: "content".to_string(),
            public_dir: "public".to_string(),
            author: Author {
                name: "Hyunjae Lim".to_string(),
                avatar: "/api/placeholder/32/32".to_string(),
            },
            categories: vec![
                CategoryConfig::new("posts", "Posts"),
                CategoryConfig::new("projects", "Repositories"),
                CategoryConfig::new("resources", "Documents"),
            ],
        }
    }
}

impl SiteConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Find a category by its display label, case-insensitively
    pub fn category(&self, label: &str) -> Option<&CategoryConfig> {
        self.categories
            .iter()
            .find(|c| c.label.eq_ignore_ascii_case(label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SiteConfig::default();
        assert_eq!(config.content_dir, "content");
        assert_eq!(config.author.name, "Hyunjae Lim");
        assert_eq!(config.categories.len(), 3);
    }

    #[test]
    fn test_category_lookup_case_insensitive() {
        let config = SiteConfig::default();
        assert_eq!(config.category("posts").unwrap().dir, "posts");
        assert_eq!(config.category("Repositories").unwrap().dir, "projects");
        assert!(config.category("unknown").is_none());
    }

    #[test]
    fn test_load_partial_yaml() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("_config.yml");
        fs::write(
            &path,
            "title: My Site\nauthor:\n  name: Someone\n  avatar: /img/me.png\n",
        )
        .unwrap();

        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.title, "My Site");
        assert_eq!(config.author.name, "Someone");
        // Unspecified fields keep their defaults
        assert_eq!(config.public_dir, "public");
    }
}
