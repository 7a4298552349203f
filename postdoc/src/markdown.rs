//! Markdown import
//!
//! Converts pulldown-cmark's event stream into document nodes. Each opening
//! tag pushes a frame; the matching closing tag pops it and attaches the
//! finished node to its parent. Mark tags only toggle the active mark set.

use crate::document::{merge_text_leaves, types, Document, ElementNode, Mark, Node, TextNode};
use crate::html_deserializer::HtmlDeserializer;
use crate::plugins::default_registry;
use crate::registry::Registry;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to read markdown file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Import markdown text with the default registry
///
/// Empty input yields the new-document paragraph.
pub fn import(markdown: &str) -> Vec<Node> {
    import_with(markdown, &default_registry())
}

/// Import markdown text; embedded HTML goes through the registry's deserializer
pub fn import_with(markdown: &str, registry: &Registry) -> Vec<Node> {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_SUPERSCRIPT
        | Options::ENABLE_SUBSCRIPT;

    let mut importer = Importer {
        deserializer: registry.html_deserializer(),
        ..Importer::default()
    };
    for event in Parser::new_ext(markdown, options) {
        importer.process_event(event);
    }
    importer.finish()
}

/// Read and import a markdown file
pub fn import_file<P: AsRef<Path>>(path: P, registry: &Registry) -> Result<Vec<Node>, ImportError> {
    let path = path.as_ref();
    let markdown = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(import_with(&markdown, registry))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Block,
    Inline,
    /// Children are handed to the parent
    Transparent,
    /// Alt text is dropped; the image is emitted after the enclosing block
    Image,
}

struct Frame {
    element: ElementNode,
    role: Role,
}

#[derive(Default)]
struct Importer<'a> {
    deserializer: Option<&'a HtmlDeserializer>,
    /// Raw HTML block being collected
    html: Option<String>,
    stack: Vec<Frame>,
    roots: Vec<Node>,
    marks: BTreeSet<Mark>,
    /// Images waiting for their enclosing block to close
    deferred: Vec<Node>,
    code: Option<String>,
    in_table_head: bool,
    next_id: u64,
}

impl Importer<'_> {
    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.handle_start_tag(tag),
            Event::End(tag_end) => self.handle_end_tag(tag_end),
            Event::Text(text) => self.handle_text(&text),
            Event::Code(code) => {
                let mut leaf = self.leaf(&code);
                leaf.marks.insert(Mark::Code);
                self.push(leaf.into());
            }
            Event::SoftBreak => self.handle_text(" "),
            Event::HardBreak => self.handle_text("\n"),
            Event::TaskListMarker(checked) => self.handle_task_marker(checked),
            Event::Html(html) => {
                if let Some(block) = self.html.as_mut() {
                    block.push_str(&html);
                } else {
                    self.handle_inline_html(&html);
                }
            }
            Event::InlineHtml(html) => self.handle_inline_html(&html),
            _ => {}
        }
    }

    fn handle_start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.open(types::ELEMENT_PARAGRAPH, Role::Block),
            Tag::Heading { level, .. } => {
                let index = (level as usize).clamp(1, types::KEYS_HEADING.len()) - 1;
                self.open(types::KEYS_HEADING[index], Role::Block);
            }
            Tag::BlockQuote(_) => self.open(types::ELEMENT_BLOCKQUOTE, Role::Block),
            Tag::CodeBlock(_) => {
                self.code = Some(String::new());
                self.open(types::ELEMENT_CODE_BLOCK, Role::Block);
            }
            Tag::List(start) => {
                let kind = if start.is_some() {
                    types::ELEMENT_OL
                } else {
                    types::ELEMENT_UL
                };
                self.open(kind, Role::Block);
            }
            Tag::Item => self.open(types::ELEMENT_LI, Role::Block),
            Tag::Table(_) => self.open(types::ELEMENT_TABLE, Role::Block),
            Tag::TableHead => {
                self.in_table_head = true;
                self.open(types::ELEMENT_TR, Role::Block);
            }
            Tag::TableRow => self.open(types::ELEMENT_TR, Role::Block),
            Tag::TableCell => {
                let kind = if self.in_table_head {
                    types::ELEMENT_TH
                } else {
                    types::ELEMENT_TD
                };
                self.open(kind, Role::Block);
            }
            Tag::Emphasis => {
                self.marks.insert(Mark::Italic);
            }
            Tag::Strong => {
                self.marks.insert(Mark::Bold);
            }
            Tag::Strikethrough => {
                self.marks.insert(Mark::Strikethrough);
            }
            Tag::Superscript => {
                self.marks.insert(Mark::Superscript);
            }
            Tag::Subscript => {
                self.marks.insert(Mark::Subscript);
            }
            Tag::HtmlBlock => {
                self.html = Some(String::new());
                self.stack.push(Frame {
                    element: ElementNode::default(),
                    role: Role::Transparent,
                });
            }
            Tag::Link { dest_url, .. } => self.stack.push(Frame {
                element: ElementNode::new(types::ELEMENT_LINK, Vec::new())
                    .with_attr("url", dest_url.to_string()),
                role: Role::Inline,
            }),
            Tag::Image { dest_url, .. } => self.stack.push(Frame {
                element: ElementNode::new(types::ELEMENT_IMAGE, Vec::new())
                    .with_attr("url", dest_url.to_string()),
                role: Role::Image,
            }),
            _ => self.stack.push(Frame {
                element: ElementNode::default(),
                role: Role::Transparent,
            }),
        }
    }

    fn handle_end_tag(&mut self, tag_end: TagEnd) {
        match tag_end {
            TagEnd::Emphasis => {
                self.marks.remove(&Mark::Italic);
            }
            TagEnd::Strong => {
                self.marks.remove(&Mark::Bold);
            }
            TagEnd::Strikethrough => {
                self.marks.remove(&Mark::Strikethrough);
            }
            TagEnd::Superscript => {
                self.marks.remove(&Mark::Superscript);
            }
            TagEnd::Subscript => {
                self.marks.remove(&Mark::Subscript);
            }
            TagEnd::CodeBlock => {
                let code = self.code.take().unwrap_or_default();
                let code = code.strip_suffix('\n').unwrap_or(&code);
                for line in code.split('\n') {
                    let line = self.block(types::ELEMENT_CODE_LINE, vec![Node::text(line)]);
                    self.push(line.into());
                }
                self.close();
            }
            TagEnd::HtmlBlock => {
                let html = self.html.take().unwrap_or_default();
                for node in self.html_blocks(&html) {
                    self.push(node);
                }
                self.close();
            }
            TagEnd::TableHead => {
                self.in_table_head = false;
                self.close();
            }
            _ => self.close(),
        }
    }

    fn handle_text(&mut self, text: &str) {
        if let Some(code) = self.code.as_mut() {
            code.push_str(text);
            return;
        }
        let leaf = self.leaf(text);
        self.push(leaf.into());
    }

    /// Blocks for a raw HTML block; its text is kept when nothing can parse it
    fn html_blocks(&mut self, html: &str) -> Vec<Node> {
        let html = html.trim();
        if html.is_empty() {
            return Vec::new();
        }
        let mut nodes = match self.deserializer {
            Some(deserializer) => deserializer.deserialize(html),
            None => {
                log::warn!("No HTML deserializer registered, keeping raw HTML as text");
                vec![Node::element(types::ELEMENT_PARAGRAPH, vec![Node::text(html)])]
            }
        };
        for node in &mut nodes {
            self.assign_ids(node);
        }
        nodes
    }

    /// Inline HTML keeps its text and marks; blocks it contains follow the
    /// enclosing block like images do
    fn handle_inline_html(&mut self, html: &str) {
        let Some(deserializer) = self.deserializer else {
            let leaf = self.leaf(html);
            self.push(leaf.into());
            return;
        };
        if is_line_break(html) {
            self.handle_text("\n");
            return;
        }
        for node in deserializer.deserialize(html) {
            match node {
                Node::Element(paragraph) if paragraph.is_type(types::ELEMENT_PARAGRAPH) => {
                    for child in paragraph.children {
                        let child = self.with_active_marks(child);
                        self.push(child);
                    }
                }
                mut block => {
                    self.assign_ids(&mut block);
                    self.deferred.push(block);
                }
            }
        }
    }

    fn with_active_marks(&self, node: Node) -> Node {
        match node {
            Node::Text(mut leaf) => {
                leaf.marks.extend(self.marks.iter().copied());
                leaf.into()
            }
            node => node,
        }
    }

    /// Give every block element of a deserialized subtree an id
    fn assign_ids(&mut self, node: &mut Node) {
        let Node::Element(element) = node else {
            return;
        };
        if !types::is_inline(element.kind()) {
            element
                .attributes
                .insert("id".to_string(), self.next_id.into());
            self.next_id += 1;
        }
        for child in &mut element.children {
            self.assign_ids(child);
        }
    }

    /// Turn the innermost list item into a todo item
    fn handle_task_marker(&mut self, checked: bool) {
        let Some(frame) = self
            .stack
            .iter_mut()
            .rev()
            .find(|frame| frame.element.is_type(types::ELEMENT_LI))
        else {
            return;
        };
        frame.element.kind = Some(types::ELEMENT_TODO_LI.to_string());
        if checked {
            frame.element.attributes.insert("checked".to_string(), true.into());
        }
    }

    fn leaf(&self, text: &str) -> TextNode {
        TextNode {
            text: text.to_string(),
            marks: self.marks.clone(),
            ..TextNode::default()
        }
    }

    fn block(&mut self, kind: &str, children: Vec<Node>) -> ElementNode {
        let id = self.next_id;
        self.next_id += 1;
        ElementNode::new(kind, children).with_attr("id", id)
    }

    fn open(&mut self, kind: &str, role: Role) {
        self.stack.push(Frame {
            element: ElementNode::new(kind, Vec::new()),
            role,
        });
    }

    fn push(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(frame) => frame.element.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn close(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame.role {
            Role::Transparent => {
                for child in frame.element.children {
                    self.push(child);
                }
            }
            Role::Inline => {
                let mut element = frame.element;
                merge_text_leaves(&mut element.children);
                self.push(element.into());
            }
            Role::Image => {
                let mut image = frame.element;
                image.children = vec![Node::text("")];
                let id = self.next_id;
                self.next_id += 1;
                self.deferred.push(image.with_attr("id", id).into());
            }
            Role::Block => {
                for node in self.finish_block(frame.element) {
                    self.push(node);
                }
                for image in std::mem::take(&mut self.deferred) {
                    self.push(image);
                }
            }
        }
    }

    fn finish_block(&mut self, mut element: ElementNode) -> Vec<Node> {
        let kind = element.kind().to_string();
        let mut trailing = Vec::new();

        match kind.as_str() {
            types::ELEMENT_PARAGRAPH if element.children.is_empty() && !self.deferred.is_empty() => {
                return Vec::new();
            }
            types::ELEMENT_LI => {
                element.children = self.wrap_inline_runs(std::mem::take(&mut element.children));
            }
            types::ELEMENT_TODO_LI => {
                let (inline, blocks) = flatten_paragraphs(std::mem::take(&mut element.children));
                element.children = inline;
                trailing = blocks;
            }
            types::ELEMENT_BLOCKQUOTE
                if element.children.iter().all(|child| child.is_type(types::ELEMENT_PARAGRAPH)) =>
            {
                let (inline, _) = flatten_paragraphs(std::mem::take(&mut element.children));
                element.children = inline;
            }
            types::ELEMENT_UL | types::ELEMENT_OL => {
                return self.split_list(&kind, element);
            }
            _ => {}
        }

        merge_text_leaves(&mut element.children);
        let id = self.next_id;
        self.next_id += 1;
        let mut nodes = vec![element.with_attr("id", id).into()];
        nodes.extend(trailing);
        nodes
    }

    /// Keep list items in lists; todo items and stray blocks leave the list
    fn split_list(&mut self, kind: &str, list: ElementNode) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut items = Vec::new();
        for child in list.children {
            if child.is_type(types::ELEMENT_LI) {
                items.push(child);
                continue;
            }
            if !items.is_empty() {
                let run = std::mem::take(&mut items);
                nodes.push(self.block(kind, run).into());
            }
            nodes.push(child);
        }
        if !items.is_empty() {
            nodes.push(self.block(kind, items).into());
        }
        nodes
    }

    /// Group runs of inline nodes into paragraphs
    fn wrap_inline_runs(&mut self, children: Vec<Node>) -> Vec<Node> {
        let mut wrapped = Vec::new();
        let mut run = Vec::new();
        for child in children {
            if is_inline_node(&child) {
                run.push(child);
                continue;
            }
            if !run.is_empty() {
                let mut paragraph = std::mem::take(&mut run);
                merge_text_leaves(&mut paragraph);
                wrapped.push(self.block(types::ELEMENT_PARAGRAPH, paragraph).into());
            }
            wrapped.push(child);
        }
        if !run.is_empty() {
            merge_text_leaves(&mut run);
            wrapped.push(self.block(types::ELEMENT_PARAGRAPH, run).into());
        }
        wrapped
    }

    fn finish(mut self) -> Vec<Node> {
        while !self.stack.is_empty() {
            self.close();
        }
        self.roots.append(&mut self.deferred);

        let roots = std::mem::take(&mut self.roots);
        let nodes = self.wrap_inline_runs(roots);
        if nodes.is_empty() {
            return Document::new().nodes;
        }
        nodes
    }
}

fn is_inline_node(node: &Node) -> bool {
    match node {
        Node::Text(_) => true,
        Node::Element(element) => types::is_inline(element.kind()),
    }
}

fn is_line_break(html: &str) -> bool {
    let tag: String = html
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '/')
        .collect();
    tag.eq_ignore_ascii_case("<br>")
}

/// Inline content of paragraph children joined by line breaks, plus any
/// other blocks found among them
fn flatten_paragraphs(children: Vec<Node>) -> (Vec<Node>, Vec<Node>) {
    let mut inline: Vec<Node> = Vec::new();
    let mut blocks = Vec::new();
    for child in children {
        match child {
            Node::Element(paragraph) if paragraph.is_type(types::ELEMENT_PARAGRAPH) => {
                if !inline.is_empty() {
                    inline.push(Node::text("\n"));
                }
                inline.extend(paragraph.children);
            }
            node if is_inline_node(&node) => inline.push(node),
            node => blocks.push(node),
        }
    }
    (inline, blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: &Node) -> &ElementNode {
        node.as_element().unwrap()
    }

    fn kinds(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().filter_map(Node::as_element).map(ElementNode::kind).collect()
    }

    #[test]
    fn test_empty_input_is_new_document() {
        assert_eq!(import(""), Document::new().nodes);
        assert_eq!(import("   \n\n"), Document::new().nodes);
    }

    #[test]
    fn test_heading_and_marked_paragraph() {
        let nodes = import("## Title\n\nSome **bold** and *it*.\n");

        assert_eq!(kinds(&nodes), vec!["h2", "p"]);
        let paragraph = element(&nodes[1]);
        assert_eq!(paragraph.children.len(), 5);
        let bold = paragraph.children[1].as_text().unwrap();
        assert_eq!(bold.text, "bold");
        assert!(bold.has_mark(Mark::Bold));
        assert!(paragraph.children[3].as_text().unwrap().has_mark(Mark::Italic));
    }

    #[test]
    fn test_tight_list_items_hold_paragraphs() {
        let nodes = import("- one\n- two\n");

        assert_eq!(kinds(&nodes), vec!["ul"]);
        let list = element(&nodes[0]);
        assert_eq!(list.children.len(), 2);
        let item = element(&list.children[0]);
        assert!(item.is_type("li"));
        assert!(item.children[0].is_type("p"));
        assert_eq!(item.children[0].text_content(), "one");
    }

    #[test]
    fn test_task_items_leave_the_list() {
        let nodes = import("- [x] done\n- [ ] open\n");

        assert_eq!(kinds(&nodes), vec!["action_item", "action_item"]);
        assert!(element(&nodes[0]).attr_bool("checked"));
        assert!(!element(&nodes[1]).attr_bool("checked"));
        assert_eq!(nodes[1].text_content(), "open");
    }

    #[test]
    fn test_fenced_code_becomes_lines() {
        let nodes = import("```rust\nlet a = 1;\nlet b = 2;\n```\n");

        let block = element(&nodes[0]);
        assert!(block.is_type("code_block"));
        assert_eq!(kinds(&block.children), vec!["code_line", "code_line"]);
        assert_eq!(block.children[1].text_content(), "let b = 2;");
    }

    #[test]
    fn test_link_and_inline_code() {
        let nodes = import("See [docs](https://docs.rs) or `cargo doc`.");

        let paragraph = element(&nodes[0]);
        let link = element(&paragraph.children[1]);
        assert!(link.is_type("a"));
        assert_eq!(link.attr_str("url"), Some("https://docs.rs"));
        assert!(paragraph.children[3].as_text().unwrap().has_mark(Mark::Code));
    }

    #[test]
    fn test_image_becomes_void_block() {
        let nodes = import("![diagram](/uploads/d.png)\n");

        assert_eq!(kinds(&nodes), vec!["img"]);
        assert_eq!(element(&nodes[0]).attr_str("url"), Some("/uploads/d.png"));
        assert_eq!(element(&nodes[0]).children, vec![Node::text("")]);
    }

    #[test]
    fn test_table_cells() {
        let nodes = import("| a | b |\n|---|---|\n| 1 | 2 |\n");

        let table = element(&nodes[0]);
        assert!(table.is_type("table"));
        assert_eq!(kinds(&element(&table.children[0]).children), vec!["th", "th"]);
        assert_eq!(kinds(&element(&table.children[1]).children), vec!["td", "td"]);
        assert_eq!(table.children[1].text_content(), "12");
    }

    #[test]
    fn test_html_block_is_deserialized() {
        let nodes = import("<div>block html</div>\n\npara");

        assert_eq!(kinds(&nodes), vec!["p", "p"]);
        assert_eq!(element(&nodes[0]).children, vec![Node::text("block html")]);
        assert_eq!(element(&nodes[0]).attributes.get("id"), Some(&0.into()));
        assert_eq!(element(&nodes[1]).children, vec![Node::text("para")]);
    }

    #[test]
    fn test_html_block_keeps_known_structure() {
        let nodes = import("<ul>\n<li>one &amp; two</li>\n</ul>\n");

        assert_eq!(kinds(&nodes), vec!["ul"]);
        let item = element(&element(&nodes[0]).children[0]);
        assert!(item.is_type("li"));
        assert_eq!(item.children, vec![Node::text("one & two")]);
    }

    #[test]
    fn test_inline_html_keeps_text() {
        let nodes = import("press <kbd>Ctrl</kbd> and **<span>go</span>**<br>now");

        let paragraph = element(&nodes[0]);
        let go = TextNode::new("go").with_mark(Mark::Bold);
        assert_eq!(
            paragraph.children,
            vec![
                Node::text("press Ctrl and "),
                go.into(),
                Node::text("\nnow"),
            ]
        );
    }

    #[test]
    fn test_quote_paragraphs_join() {
        let nodes = import("> first\n>\n> second\n");

        assert_eq!(kinds(&nodes), vec!["blockquote"]);
        assert_eq!(nodes[0].text_content(), "first\nsecond");
    }
}
