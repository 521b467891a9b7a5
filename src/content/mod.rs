//! Content module - front-matter parsing, metadata derivation,
//! repository enumeration and markdown rendering

mod frontmatter;
mod markdown;
mod meta;
mod record;
pub mod repository;

pub use frontmatter::{FieldValue, RawFrontmatter};
pub use markdown::MarkdownRenderer;
pub use meta::MetaDeriver;
pub use record::{Author, ContentRecord};
pub use repository::ContentRepository;
