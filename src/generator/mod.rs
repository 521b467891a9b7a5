//! Static build - renders every record to HTML and writes the manifest

use std::fs;

use anyhow::Result;

use crate::content::{ContentRepository, MarkdownRenderer};
use crate::Site;

/// Render all content into `public_dir` and write `index.json`.
///
/// Per-file render failures are logged and skipped so one broken post
/// does not abort the build.
pub fn build(site: &Site) -> Result<()> {
    let repo = ContentRepository::new(site);
    let renderer = MarkdownRenderer::new();

    let mut manifest = Vec::new();

    for category in &site.config.categories {
        let records = repo.load_category(&category.dir, &category.label);
        let out_dir = site.public_dir.join(&category.dir);
        fs::create_dir_all(&out_dir)?;

        let mut built = 0;
        for record in records {
            let Some((_, body)) = repo.load_content(&category.dir, &category.label, &record.slug)
            else {
                continue;
            };

            let html = match renderer.render(&body) {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!("Failed to render {}/{}: {}", category.dir, record.slug, e);
                    continue;
                }
            };

            fs::write(out_dir.join(format!("{}.html", record.slug)), html)?;
            // The manifest references only records whose HTML was written
            manifest.push(record);
            built += 1;
        }

        tracing::info!("Built {} records from {}", built, category.dir);
    }

    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(site.public_dir.join("index.json"), json)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::ContentRecord;

    #[test]
    fn test_build_writes_html_and_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let posts = tmp.path().join("content").join("posts");
        fs::create_dir_all(&posts).unwrap();
        fs::write(
            posts.join("hello.md"),
            "+++\ntitle = \"Hello\"\ndate = 2025-05-01\n+++\n# Hi\n\nSome text.",
        )
        .unwrap();

        let site = Site {
            config: SiteConfig::default(),
            base_dir: tmp.path().to_path_buf(),
            content_dir: tmp.path().join("content"),
            public_dir: tmp.path().join("public"),
        };

        build(&site).unwrap();

        let html = fs::read_to_string(site.public_dir.join("posts").join("hello.html")).unwrap();
        assert!(html.contains("<h1>Hi</h1>"));

        let manifest = fs::read_to_string(site.public_dir.join("index.json")).unwrap();
        let records: Vec<ContentRecord> = serde_json::from_str(&manifest).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Hello");
        assert_eq!(records[0].published_at, "2025-05-01");
    }

    #[test]
    fn test_manifest_matches_written_files() {
        let tmp = tempfile::tempdir().unwrap();
        let posts = tmp.path().join("content").join("posts");
        fs::create_dir_all(&posts).unwrap();
        fs::write(posts.join("one.md"), "+++\ndate = 2025-02-01\n+++\nFirst.").unwrap();
        fs::write(posts.join("two.markdown"), "+++\ndate = 2025-01-01\n+++\nSecond.").unwrap();

        let site = Site {
            config: SiteConfig::default(),
            base_dir: tmp.path().to_path_buf(),
            content_dir: tmp.path().join("content"),
            public_dir: tmp.path().join("public"),
        };

        build(&site).unwrap();

        let manifest = fs::read_to_string(site.public_dir.join("index.json")).unwrap();
        let records: Vec<ContentRecord> = serde_json::from_str(&manifest).unwrap();
        assert_eq!(records.len(), 2);

        // Every manifest entry has its HTML on disk
        for record in &records {
            let html = site.public_dir.join("posts").join(format!("{}.html", record.slug));
            assert!(html.exists(), "missing output for {}", record.slug);
        }
    }
}
