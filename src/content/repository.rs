//! Content repository - enumerates category directories and produces
//! derived content records

use std::fs;
use std::path::Path;

use anyhow::Result;
use walkdir::WalkDir;

use super::{ContentRecord, MetaDeriver, RawFrontmatter};
use crate::Site;

/// Reserved filename prefix for directory-level index files
const INDEX_PREFIX: &str = "_index";

/// Extensions enumerated and probed for content files
const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "markdown"];

/// Loads content records from the site's category directories
pub struct ContentRepository<'a> {
    site: &'a Site,
    deriver: MetaDeriver,
}

impl<'a> ContentRepository<'a> {
    /// Create a repository for the given site
    pub fn new(site: &'a Site) -> Self {
        let deriver = MetaDeriver::new(site.config.author.clone());
        Self { site, deriver }
    }

    /// Load all records from one category directory, sorted by
    /// publication date descending. A missing directory yields an
    /// empty list; unreadable files are skipped.
    pub fn load_category(&self, dir: &str, label: &str) -> Vec<ContentRecord> {
        let category_dir = self.site.content_dir.join(dir);
        if !category_dir.exists() {
            tracing::warn!("Content directory {:?} does not exist", category_dir);
            return Vec::new();
        }

        let mut records = Vec::new();

        for entry in WalkDir::new(&category_dir)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && is_markdown_file(path) && !is_index_file(path) {
                match self.load_record(path, label) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        tracing::warn!("Failed to load content {:?}: {}", path, e);
                    }
                }
            }
        }

        // Sort by date descending (newest first); stable for equal dates
        records.sort_by(|a, b| b.published_at.cmp(&a.published_at));

        records
    }

    /// Load records from every configured category, in category order
    pub fn load_all(&self) -> Vec<ContentRecord> {
        let mut records = Vec::new();
        for category in &self.site.config.categories {
            records.extend(self.load_category(&category.dir, &category.label));
        }
        records
    }

    /// Look up a single record by slug, optionally constrained to a
    /// category label
    pub fn find_by_slug(&self, slug: &str, category: Option<&str>) -> Option<ContentRecord> {
        self.load_all().into_iter().find(|record| {
            record.slug == slug && category.map_or(true, |label| record.category == label)
        })
    }

    /// Load one record plus its raw markdown body, by slug.
    /// Returns `None` (logged) when the file does not exist or cannot
    /// be read.
    pub fn load_content(&self, dir: &str, label: &str, slug: &str) -> Option<(ContentRecord, String)> {
        let dir_path = self.site.content_dir.join(dir);
        let path = MARKDOWN_EXTENSIONS
            .iter()
            .map(|ext| dir_path.join(format!("{}.{}", slug, ext)))
            .find(|p| p.exists());
        let Some(path) = path else {
            tracing::warn!("Content file not found: {}/{}", dir, slug);
            return None;
        };

        match self.load_record_with_body(&path, label) {
            Ok(found) => Some(found),
            Err(e) => {
                tracing::warn!("Failed to load content {:?}: {}", path, e);
                None
            }
        }
    }

    fn load_record(&self, path: &Path, label: &str) -> Result<ContentRecord> {
        self.load_record_with_body(path, label)
            .map(|(record, _)| record)
    }

    fn load_record_with_body(&self, path: &Path, label: &str) -> Result<(ContentRecord, String)> {
        let content = fs::read_to_string(path)?;
        let (fm, body) = RawFrontmatter::parse(&content);

        let slug = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled")
            .to_string();

        let record = self.deriver.derive(&fm, body, &slug, label);
        Ok((record, body.to_string()))
    }
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| MARKDOWN_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// Check if a file is a reserved directory-level index file
fn is_index_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with(INDEX_PREFIX))
        .unwrap_or(false)
}
