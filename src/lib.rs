//! inkpost: a markdown content engine for static personal blogs
//!
//! Content authored as markdown files with front-matter metadata is
//! discovered across category directories, parsed, enriched with derived
//! metadata, and rendered into HTML with enhanced code blocks.

pub mod config;
pub mod content;
pub mod generator;

use anyhow::Result;
use std::path::Path;

use content::ContentRepository;

/// The main site instance
#[derive(Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Content source directory
    pub content_dir: std::path::PathBuf,
    /// Public (output) directory
    pub public_dir: std::path::PathBuf,
}

impl Site {
    /// Create a new site instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let content_dir = base_dir.join(&config.content_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Ok(Self {
            config,
            base_dir,
            content_dir,
            public_dir,
        })
    }

    /// Repository over this site's content directories
    pub fn repository(&self) -> ContentRepository<'_> {
        ContentRepository::new(self)
    }

    /// Render all content to the public directory
    pub fn build(&self) -> Result<()> {
        generator::build(self)
    }
}
