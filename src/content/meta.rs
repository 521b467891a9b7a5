//! Metadata derivation - computes normalized record attributes from
//! parsed front-matter and body text

use chrono::{Local, NaiveDate, NaiveDateTime};

use super::{Author, ContentRecord, FieldValue, RawFrontmatter};

/// Maximum excerpt length, in characters
const EXCERPT_LIMIT: usize = 150;

/// Assumed reading speed, words per minute
const WORDS_PER_MINUTE: usize = 200;

/// Derives the full set of computed record fields, with site-level
/// defaults injected at construction
#[derive(Debug, Clone)]
pub struct MetaDeriver {
    default_author: Author,
}

impl MetaDeriver {
    /// Create a deriver with the given default author identity
    pub fn new(default_author: Author) -> Self {
        Self { default_author }
    }

    /// Derive a full record from parsed front-matter and body text.
    /// The category label comes from the source directory, not the file.
    pub fn derive(
        &self,
        fm: &RawFrontmatter,
        body: &str,
        slug: &str,
        category: &str,
    ) -> ContentRecord {
        let title = fm
            .str("title")
            .map(str::to_string)
            .unwrap_or_else(|| slug.to_string());

        let author = Author {
            name: fm
                .str("author")
                .unwrap_or(&self.default_author.name)
                .to_string(),
            avatar: self.default_author.avatar.clone(),
        };

        let published_at = fm
            .str("date")
            .or_else(|| fm.str("publishedAt"))
            .map(normalize_date)
            .unwrap_or_else(today);

        ContentRecord {
            slug: slug.to_string(),
            title,
            excerpt: derive_excerpt(fm, body),
            author,
            published_at,
            read_time: reading_time(body),
            category: category.to_string(),
            featured: fm.flag("featured").unwrap_or(false),
            tags: fm.list("tags").unwrap_or_default(),
            image: fm.str("image").map(str::to_string),
        }
    }
}

/// Derive an excerpt: `description`, then `excerpt`/`summary`, then the
/// first non-heading paragraph of the body, truncated to 150 characters
pub fn derive_excerpt(fm: &RawFrontmatter, body: &str) -> String {
    for key in ["description", "excerpt", "summary"] {
        if let Some(FieldValue::Str(text)) = fm.get(key) {
            return text.clone();
        }
    }

    let paragraph = body
        .split("\n\n")
        .map(str::trim)
        .find(|p| !p.is_empty() && !p.starts_with('#'))
        .unwrap_or("");

    let truncated: String = paragraph.chars().take(EXCERPT_LIMIT).collect();
    if paragraph.chars().count() > EXCERPT_LIMIT {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

/// Reading time from word count: ceil(words / 200), as `"<N> min read"`
pub fn reading_time(body: &str) -> String {
    let words = body.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE);
    format!("{} min read", minutes)
}

/// Normalize an authored date to `YYYY-MM-DD`.
///
/// Date-times in common formats are reduced to their date portion; an
/// unrecognized string containing a `T` separator is truncated at it.
/// Idempotent: an already-normalized date comes back unchanged.
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();

    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return dt.format("%Y-%m-%d").to_string();
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.format("%Y-%m-%d").to_string();
        }
    }

    raw.split('T').next().unwrap_or(raw).to_string()
}

/// Today's date in `YYYY-MM-DD` form, the fallback for absent dates
pub fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}
