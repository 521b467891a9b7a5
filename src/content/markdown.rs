//! Markdown rendering
//!
//! The pipeline parses markdown into events, folds the events into an
//! HTML element tree (raw HTML fragments pass through verbatim), applies
//! the code-block transform depth-first, and serializes the tree. If the
//! full pipeline fails the renderer retries once with the transform
//! disabled before surfacing the error.

use anyhow::Result;
use lazy_static::lazy_static;
use pulldown_cmark::{Alignment, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref LANGUAGE_CLASS: Regex = Regex::new(r"language-(\w+)").unwrap();
}

/// Copy icon path, mirrored by the client-side copy script's styling
const COPY_ICON_PATH: &str = "M2.75 0.5C1.7835 0.5 1 1.2835 1 2.25V9.75C1 10.7165 1.7835 11.5 2.75 11.5H3.75H4.5V10H3.75H2.75C2.61193 10 2.5 9.88807 2.5 9.75V2.25C2.5 2.11193 2.61193 2 2.75 2H8.25C8.38807 2 8.5 2.11193 8.5 2.25V3H10V2.25C10 1.2835 9.2165 0.5 8.25 0.5H2.75ZM7.75 4.5C6.7835 4.5 6 5.2835 6 6.25V13.75C6 14.7165 6.7835 15.5 7.75 15.5H13.25C14.2165 15.5 15 14.7165 15 13.75V6.25C15 5.2835 14.2165 4.5 13.25 4.5H7.75ZM7.5 6.25C7.5 6.11193 7.61193 6 7.75 6H13.25C13.3881 6 13.5 6.11193 13.5 6.25V13.75C13.5 13.8881 13.3881 14 13.25 14H7.75C7.61193 14 7.5 13.8881 7.5 13.75V6.25Z";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unbalanced markdown structure: {0}")]
    Unbalanced(&'static str),
}

/// A node in the HTML tree
#[derive(Debug, Clone)]
enum Node {
    Element(Element),
    Text(String),
    /// Raw HTML fragment, emitted verbatim
    Raw(String),
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    fn child(mut self, node: Node) -> Self {
        self.children.push(node);
        self
    }

    fn class(&self) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(name, _)| name == "class")
            .map(|(_, value)| value.as_str())
    }
}

/// Markdown renderer with code-block enhancement
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render markdown to HTML.
    ///
    /// On pipeline failure, retries once without the code-block transform;
    /// a second failure propagates to the caller.
    pub fn render(&self, markdown: &str) -> Result<String> {
        match self.render_pipeline(markdown, true) {
            Ok(html) => Ok(html),
            Err(e) => {
                tracing::warn!(
                    "Markdown pipeline failed ({}), retrying without code-block transform",
                    e
                );
                Ok(self.render_pipeline(markdown, false)?)
            }
        }
    }

    fn render_pipeline(
        &self,
        markdown: &str,
        enhance_code_blocks: bool,
    ) -> Result<String, RenderError> {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_GFM;
        let parser = Parser::new_ext(markdown, options);

        let mut tree = build_tree(parser)?;
        if enhance_code_blocks {
            transform_code_blocks(&mut tree);
        }

        let mut html = String::new();
        serialize_nodes(&tree, &mut html);
        Ok(html)
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Folds the event stream into an element tree
struct TreeBuilder {
    root: Vec<Node>,
    stack: Vec<Element>,
    table_aligns: Vec<Alignment>,
    table_cell: usize,
    in_table_head: bool,
}

fn build_tree<'a>(parser: impl Iterator<Item = Event<'a>>) -> Result<Vec<Node>, RenderError> {
    let mut builder = TreeBuilder {
        root: Vec::new(),
        stack: Vec::new(),
        table_aligns: Vec::new(),
        table_cell: 0,
        in_table_head: false,
    };

    for event in parser {
        builder.event(event)?;
    }

    if !builder.stack.is_empty() {
        return Err(RenderError::Unbalanced("unclosed element at end of input"));
    }
    Ok(builder.root)
}

impl TreeBuilder {
    fn event(&mut self, event: Event<'_>) -> Result<(), RenderError> {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(end) => self.end(end)?,
            Event::Text(text) => self.append(Node::Text(text.to_string())),
            Event::Code(code) => {
                let el = Element::new("code").child(Node::Text(code.to_string()));
                self.append(Node::Element(el));
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                self.append(Node::Raw(html.to_string()));
            }
            Event::SoftBreak => self.append(Node::Text("\n".to_string())),
            Event::HardBreak => self.append(Node::Element(Element::new("br"))),
            Event::Rule => self.append(Node::Element(Element::new("hr"))),
            Event::TaskListMarker(checked) => {
                let mut input = Element::new("input")
                    .attr("disabled", "")
                    .attr("type", "checkbox");
                if checked {
                    input = input.attr("checked", "");
                }
                self.append(Node::Element(input));
            }
            _ => {}
        }
        Ok(())
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.open(Element::new("p")),
            Tag::Heading { level, id, .. } => {
                let mut el = Element::new(&level.to_string());
                if let Some(id) = id {
                    el = el.attr("id", &id);
                }
                self.open(el);
            }
            Tag::BlockQuote(_) => self.open(Element::new("blockquote")),
            Tag::CodeBlock(kind) => {
                self.open(Element::new("pre"));
                let mut code = Element::new("code");
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        code = code.attr("class", &format!("language-{}", lang));
                    }
                }
                self.open(code);
            }
            Tag::List(Some(1)) => self.open(Element::new("ol")),
            Tag::List(Some(start)) => self.open(Element::new("ol").attr("start", &start.to_string())),
            Tag::List(None) => self.open(Element::new("ul")),
            Tag::Item => self.open(Element::new("li")),
            Tag::Table(aligns) => {
                self.table_aligns = aligns;
                self.open(Element::new("table"));
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.table_cell = 0;
                self.open(Element::new("thead"));
                self.open(Element::new("tr"));
            }
            Tag::TableRow => {
                self.table_cell = 0;
                self.open(Element::new("tr"));
            }
            Tag::TableCell => {
                let tag = if self.in_table_head { "th" } else { "td" };
                let mut cell = Element::new(tag);
                match self.table_aligns.get(self.table_cell) {
                    Some(Alignment::Left) => cell = cell.attr("style", "text-align: left"),
                    Some(Alignment::Center) => cell = cell.attr("style", "text-align: center"),
                    Some(Alignment::Right) => cell = cell.attr("style", "text-align: right"),
                    _ => {}
                }
                self.open(cell);
            }
            Tag::Emphasis => self.open(Element::new("em")),
            Tag::Strong => self.open(Element::new("strong")),
            Tag::Strikethrough => self.open(Element::new("del")),
            Tag::Link {
                dest_url, title, ..
            } => {
                let mut el = Element::new("a").attr("href", &dest_url);
                if !title.is_empty() {
                    el = el.attr("title", &title);
                }
                self.open(el);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let mut el = Element::new("img").attr("src", &dest_url);
                if !title.is_empty() {
                    el = el.attr("title", &title);
                }
                self.open(el);
            }
            Tag::HtmlBlock => {}
            _ => {}
        }
    }

    fn end(&mut self, end: TagEnd) -> Result<(), RenderError> {
        match end {
            TagEnd::CodeBlock => {
                self.close()?; // code
                self.close()?; // pre
            }
            TagEnd::TableHead => {
                self.in_table_head = false;
                self.close()?; // tr
                self.close()?; // thead
                self.open(Element::new("tbody"));
            }
            TagEnd::Table => {
                self.close()?; // tbody
                self.close()?; // table
            }
            TagEnd::TableCell => {
                self.close()?;
                self.table_cell += 1;
            }
            TagEnd::Image => self.finish_image()?,
            TagEnd::HtmlBlock => {}
            _ => self.close()?,
        }
        Ok(())
    }

    fn open(&mut self, element: Element) {
        self.stack.push(element);
    }

    fn close(&mut self) -> Result<(), RenderError> {
        let element = self.pop()?;
        self.append(Node::Element(element));
        Ok(())
    }

    fn pop(&mut self) -> Result<Element, RenderError> {
        self.stack
            .pop()
            .ok_or(RenderError::Unbalanced("close without matching open"))
    }

    fn append(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.push(node),
        }
    }

    /// Images are void elements: inner text becomes the alt attribute
    fn finish_image(&mut self) -> Result<(), RenderError> {
        let mut el = self.pop()?;
        let alt = collect_text(&el.children);
        el.children.clear();

        let title = el
            .attrs
            .iter()
            .position(|(name, _)| name == "title")
            .map(|i| el.attrs.remove(i));
        el.attrs.push(("alt".to_string(), alt));
        if let Some(title) = title {
            el.attrs.push(title);
        }

        self.append(Node::Element(el));
        Ok(())
    }
}

/// Rewrite every `pre > code` block into the enhanced wrapper structure.
///
/// Children are transformed before their parent slot is rewritten, so
/// inserted wrapper nodes are never revisited.
fn transform_code_blocks(nodes: &mut Vec<Node>) {
    for node in nodes.iter_mut() {
        if let Node::Element(el) = node {
            transform_code_blocks(&mut el.children);
        }
    }

    for node in nodes.iter_mut() {
        if let Some(wrapper) = wrap_code_block(node) {
            *node = wrapper;
        }
    }
}

/// Build the wrapper for a `pre` node with a single `code` child, or
/// `None` when the node is anything else
fn wrap_code_block(node: &mut Node) -> Option<Node> {
    let Node::Element(pre) = node else {
        return None;
    };
    if pre.tag != "pre" || pre.children.len() != 1 {
        return None;
    }
    let Node::Element(code) = &pre.children[0] else {
        return None;
    };
    if code.tag != "code" {
        return None;
    }

    let language = code
        .class()
        .and_then(|class| LANGUAGE_CLASS.captures(class))
        .map(|caps| caps[1].to_string())
        .unwrap_or_default();

    let code_text = collect_text(&code.children);
    let is_terminal = matches!(language.as_str(), "bash" | "sh" | "terminal")
        || code_text.starts_with('$')
        || code_text.starts_with("npm ")
        || code_text.starts_with("pnpm ")
        || code_text.starts_with("yarn ");

    let container_class = if is_terminal {
        "code-block-container terminal"
    } else {
        "code-block-container"
    };
    let mut container = Element::new("div")
        .attr("class", container_class)
        .attr("data-language", &language);

    if !language.is_empty() || is_terminal {
        let label = if is_terminal { "Terminal" } else { language.as_str() };
        let header = Element::new("div").attr("class", "code-block-header").child(
            Node::Element(
                Element::new("span")
                    .attr("class", "code-block-lang")
                    .child(Node::Text(label.to_string())),
            ),
        );
        container = container.child(Node::Element(header));
    }

    let icon = Element::new("svg")
        .attr("width", "16")
        .attr("height", "16")
        .attr("viewBox", "0 0 16 16")
        .child(Node::Element(
            Element::new("path")
                .attr("d", COPY_ICON_PATH)
                .attr("fill", "currentColor"),
        ));
    let copy_button = Element::new("button")
        .attr("class", "code-block-copy")
        .attr("aria-label", "Copy code")
        .attr("type", "button")
        .child(Node::Element(icon));
    container = container.child(Node::Element(copy_button));

    // The original pre/code block moves in unchanged
    let original = std::mem::replace(node, Node::Text(String::new()));
    container = container.child(original);

    let wrapper = Element::new("div")
        .attr("class", "code-block-wrapper")
        .child(Node::Element(container));
    Some(Node::Element(wrapper))
}

/// Concatenated text content of a node list
fn collect_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => out.push_str(&collect_text(&el.children)),
            Node::Raw(_) => {}
        }
    }
    out
}

const VOID_TAGS: [&str; 5] = ["img", "br", "hr", "input", "path"];

const BLOCK_TAGS: [&str; 17] = [
    "p", "pre", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "ul", "ol", "li", "table",
    "thead", "tbody", "tr", "div",
];

fn serialize_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        serialize_node(node, out);
    }
}

fn serialize_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Raw(html) => out.push_str(html),
        Node::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for (name, value) in &el.attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape_attr(value));
                out.push('"');
            }
            if VOID_TAGS.contains(&el.tag.as_str()) {
                out.push_str(" />");
            } else {
                out.push('>');
                serialize_nodes(&el.children, out);
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
            if BLOCK_TAGS.contains(&el.tag.as_str()) {
                out.push('\n');
            }
        }
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Hello World\n\nThis is a test.").unwrap();
        assert!(html.contains("<h1>Hello World</h1>"));
        assert!(html.contains("<p>This is a test.</p>"));
    }

    #[test]
    fn test_terminal_block_by_language() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```bash\n$ npm install\n```").unwrap();

        assert!(html.contains(r#"<div class="code-block-wrapper">"#));
        assert!(html.contains(r#"<div class="code-block-container terminal" data-language="bash">"#));
        assert!(html.contains(r#"<span class="code-block-lang">Terminal</span>"#));
        assert!(!html.contains(r#"<span class="code-block-lang">bash</span>"#));
        assert!(html.contains(r#"<button class="code-block-copy""#));
        assert!(html.contains(r#"<pre><code class="language-bash">$ npm install"#));
    }

    #[test]
    fn test_terminal_block_by_content() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```\nnpm run build\n```").unwrap();
        assert!(html.contains("code-block-container terminal"));
        assert!(html.contains(r#"<span class="code-block-lang">Terminal</span>"#));
    }

    #[test]
    fn test_language_header_for_non_terminal() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```rust\nfn main() {}\n```").unwrap();
        assert!(html.contains(r#"<span class="code-block-lang">rust</span>"#));
        assert!(!html.contains("terminal"));
    }

    #[test]
    fn test_plain_block_wrapped_without_header() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```\nplain text\n```").unwrap();
        assert!(html.contains("code-block-wrapper"));
        assert!(html.contains("code-block-copy"));
        assert!(!html.contains("code-block-header"));
    }

    #[test]
    fn test_code_block_nested_in_blockquote() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("> ```sh\n> ls -la\n> ```").unwrap();
        assert!(html.contains("<blockquote>"));
        assert!(html.contains("code-block-container terminal"));
    }

    #[test]
    fn test_raw_html_passthrough() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render("Before\n\n<div class=\"custom\">kept</div>\n\nAfter")
            .unwrap();
        assert!(html.contains("<div class=\"custom\">kept</div>"));
    }

    #[test]
    fn test_gfm_table() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render("| a | b |\n|---|---|\n| 1 | 2 |")
            .unwrap();
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>a</th>"));
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn test_strikethrough_and_task_list() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("~~gone~~\n\n- [x] done\n- [ ] todo").unwrap();
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains(r#"<input disabled="" type="checkbox" checked="" />"#));
        assert!(html.contains(r#"<input disabled="" type="checkbox" />"#));
    }

    #[test]
    fn test_inline_code_not_wrapped() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("Use `cargo build` here.").unwrap();
        assert!(html.contains("<code>cargo build</code>"));
        assert!(!html.contains("code-block-wrapper"));
    }

    #[test]
    fn test_text_is_escaped() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("a < b & c").unwrap();
        assert!(html.contains("a &lt; b &amp; c"));
    }
}
