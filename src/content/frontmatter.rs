//! Front-matter parsing
//!
//! Two dialects are accepted: a `+++`-delimited block of `key = value`
//! lines (a small TOML-like grammar) and a `---`-delimited YAML block.
//! Files without recognizable front-matter are treated as pure body text.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref STRING_LINE: Regex = Regex::new(r#"^(\w+)\s*=\s*"([^"]*)"\s*$"#).unwrap();
    static ref ARRAY_LINE: Regex = Regex::new(r"^(\w+)\s*=\s*\[([^\]]*)\]\s*$").unwrap();
    static ref BARE_LINE: Regex = Regex::new(r"^(\w+)\s*=\s*(.+)$").unwrap();
}

/// A single front-matter value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    List(Vec<String>),
    Bool(bool),
}

/// Parsed front-matter fields, in authored order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFrontmatter {
    fields: IndexMap<String, FieldValue>,
}

impl RawFrontmatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_body)
    pub fn parse(content: &str) -> (Self, &str) {
        if content.starts_with("+++") {
            return Self::parse_delimited(content);
        }
        if content.starts_with("---") {
            return Self::parse_yaml(content);
        }

        // No front-matter found
        (RawFrontmatter::default(), content)
    }

    /// Parse a `+++`-delimited block of `key = value` lines.
    ///
    /// Lines matching none of the recognized shapes are ignored. A missing
    /// closing delimiter yields no fields and the original text untouched.
    fn parse_delimited(content: &str) -> (Self, &str) {
        let mut fm = RawFrontmatter::default();
        let mut inside = false;
        let mut offset = 0;

        for line in content.split_inclusive('\n') {
            let end = offset + line.len();
            if line.trim() == "+++" {
                if inside {
                    return (fm, content[end..].trim());
                }
                inside = true;
            } else if inside {
                fm.parse_line(line.trim());
            }
            offset = end;
        }

        // No closing delimiter
        (RawFrontmatter::default(), content)
    }

    /// Parse one `key = value` line, trying each value shape in order.
    fn parse_line(&mut self, line: &str) {
        if let Some(caps) = STRING_LINE.captures(line) {
            self.fields
                .insert(caps[1].to_string(), FieldValue::Str(caps[2].to_string()));
        } else if let Some(caps) = ARRAY_LINE.captures(line) {
            let items = caps[2]
                .split(',')
                .map(|item| strip_quotes(item.trim()).to_string())
                .filter(|item| !item.is_empty())
                .collect();
            self.fields
                .insert(caps[1].to_string(), FieldValue::List(items));
        } else if let Some(caps) = BARE_LINE.captures(line) {
            let value = unwrap_single_quotes(caps[2].trim());
            let value = match value {
                "true" => FieldValue::Bool(true),
                "false" => FieldValue::Bool(false),
                other => FieldValue::Str(other.to_string()),
            };
            self.fields.insert(caps[1].to_string(), value);
        }
    }

    fn parse_yaml(content: &str) -> (Self, &str) {
        let mut yaml_start = None;
        let mut offset = 0;

        // The opening delimiter must be the first line; the closing one
        // is the next line that is exactly `---` (`----` or trailing
        // text does not close the block)
        for line in content.split_inclusive('\n') {
            let end = offset + line.len();
            if line.trim() == "---" {
                match yaml_start {
                    None if offset == 0 => yaml_start = Some(end),
                    None => break,
                    Some(start) => {
                        let yaml = &content[start..offset];
                        let body = content[end..].trim();
                        return Self::decode_yaml(yaml, body, content);
                    }
                }
            } else if yaml_start.is_none() {
                break;
            }
            offset = end;
        }

        // No delimited block, treat as no front-matter
        (RawFrontmatter::default(), content)
    }

    fn decode_yaml<'a>(yaml: &str, body: &'a str, original: &'a str) -> (Self, &'a str) {
        if yaml.trim().is_empty() {
            return (RawFrontmatter::default(), body);
        }

        match serde_yaml::from_str::<serde_yaml::Value>(yaml) {
            Ok(serde_yaml::Value::Mapping(mapping)) => {
                let mut fm = RawFrontmatter::default();
                for (key, value) in &mapping {
                    let (Some(key), Some(value)) = (key.as_str(), yaml_field(value)) else {
                        continue;
                    };
                    fm.fields.insert(key.to_string(), value);
                }
                (fm, body)
            }
            Ok(_) => {
                // Scalar or sequence at the top level is prose, not front-matter
                (RawFrontmatter::default(), original)
            }
            Err(e) => {
                tracing::warn!("Failed to parse YAML front-matter, treating as content: {}", e);
                (RawFrontmatter::default(), original)
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// String value for a key, if present and string-shaped
    pub fn str(&self, key: &str) -> Option<&str> {
        match self.fields.get(key)? {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean value for a key; string `"true"`/`"false"` also accepted
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.fields.get(key)? {
            FieldValue::Bool(b) => Some(*b),
            FieldValue::Str(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// List value for a key; a lone string becomes a single-item list
    pub fn list(&self, key: &str) -> Option<Vec<String>> {
        match self.fields.get(key)? {
            FieldValue::List(items) => Some(items.clone()),
            FieldValue::Str(s) => Some(vec![s.clone()]),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[cfg(test)]
    pub fn insert(&mut self, key: &str, value: FieldValue) {
        self.fields.insert(key.to_string(), value);
    }
}

fn yaml_field(value: &serde_yaml::Value) -> Option<FieldValue> {
    use serde_yaml::Value;
    match value {
        Value::String(s) => Some(FieldValue::Str(s.clone())),
        Value::Bool(b) => Some(FieldValue::Bool(*b)),
        Value::Number(n) => Some(FieldValue::Str(n.to_string())),
        Value::Sequence(seq) => {
            let items = seq
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    _ => None,
                })
                .collect();
            Some(FieldValue::List(items))
        }
        _ => None,
    }
}

/// Strip one leading and one trailing quote character, matched or not
fn strip_quotes(s: &str) -> &str {
    let s = s.strip_prefix(['"', '\'']).unwrap_or(s);
    s.strip_suffix(['"', '\'']).unwrap_or(s)
}

/// Unwrap a single-quote-delimited value
fn unwrap_single_quotes(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delimited_frontmatter() {
        let content = r#"+++
title = "Hello"
tags = [a, b, c]
+++

Body starts here.
"#;

        let (fm, body) = RawFrontmatter::parse(content);
        assert_eq!(fm.str("title"), Some("Hello"));
        assert_eq!(
            fm.list("tags"),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert_eq!(body, "Body starts here.");
    }

    #[test]
    fn test_parse_delimited_quoted_array_items() {
        let content = "+++\ntags = [\"rust\", 'cli', plain]\n+++\nbody";
        let (fm, _) = RawFrontmatter::parse(content);
        assert_eq!(
            fm.list("tags"),
            Some(vec!["rust".to_string(), "cli".to_string(), "plain".to_string()])
        );
    }

    #[test]
    fn test_parse_delimited_bare_scalar() {
        let content = "+++\ndate = 2025-08-03\nfeatured = true\nnote = 'quoted'\n+++\nbody";
        let (fm, _) = RawFrontmatter::parse(content);
        assert_eq!(fm.str("date"), Some("2025-08-03"));
        assert_eq!(fm.flag("featured"), Some(true));
        assert_eq!(fm.str("note"), Some("quoted"));
    }

    #[test]
    fn test_unterminated_delimited_block() {
        let content = "+++\ntitle = \"Orphan\"\n\nNo closing delimiter here.\n";
        let (fm, body) = RawFrontmatter::parse(content);
        assert!(fm.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_unrecognized_lines_ignored() {
        let content = "+++\n???\ntitle = \"Kept\"\n[section]\n+++\nbody";
        let (fm, body) = RawFrontmatter::parse(content);
        assert_eq!(fm.str("title"), Some("Kept"));
        assert_eq!(body, "body");
    }

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: Hello World
date: 2024-01-15
featured: true
tags:
  - rust
  - blog
---

This is the content.
"#;

        let (fm, body) = RawFrontmatter::parse(content);
        assert_eq!(fm.str("title"), Some("Hello World"));
        assert_eq!(fm.str("date"), Some("2024-01-15"));
        assert_eq!(fm.flag("featured"), Some(true));
        assert_eq!(
            fm.list("tags"),
            Some(vec!["rust".to_string(), "blog".to_string()])
        );
        assert_eq!(body, "This is the content.");
    }

    #[test]
    fn test_yaml_single_string_tags() {
        let content = "---\ntags: notes\n---\nbody";
        let (fm, _) = RawFrontmatter::parse(content);
        assert_eq!(fm.list("tags"), Some(vec!["notes".to_string()]));
    }

    #[test]
    fn test_no_frontmatter() {
        let content = "# Just a heading\n\nAnd a paragraph.";
        let (fm, body) = RawFrontmatter::parse(content);
        assert!(fm.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_yaml_dashes_line_does_not_close() {
        // A `----` line is not a closing delimiter
        let content = "---\ntitle: Dangling\n----\nbody";
        let (fm, body) = RawFrontmatter::parse(content);
        assert!(fm.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_yaml_empty_block() {
        let content = "---\n---\nbody";
        let (fm, body) = RawFrontmatter::parse(content);
        assert!(fm.is_empty());
        assert_eq!(body, "body");
    }

    #[test]
    fn test_yaml_missing_close() {
        let content = "---\ntitle: Dangling\n\nbody text";
        let (fm, body) = RawFrontmatter::parse(content);
        assert!(fm.is_empty());
        assert_eq!(body, content);
    }
}
