//! Editing session
//!
//! An [`Editor`] owns one document and its selection for the lifetime of an
//! editing session. Every keystroke or command mutates the tree in place, in
//! arrival order, on the caller's thread. Registry and rule tables are shared
//! read-only between sessions.
//!
//! Selection offsets count characters. Operations that need a collapsed
//! selection collapse it first; the few that act on a range (marks, links)
//! require both ends to sit under the same parent element.

use crate::document::{
    byte_index, node_at, node_at_mut, types, Document, ElementNode, Node, Point, Selection,
    TextNode,
};
use crate::editor_config::{EditorConfig, SessionConfig, UploadConfig};
use crate::registry::Registry;
use crate::rules::Rules;
use crate::upload::UploadError;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

// Submodules
mod autoformat;
mod embeds;
mod keys;
mod transforms;

pub use embeds::{normalize_url, tweet_id_from_url};

/// Host dialogs used by interactive commands
pub trait Prompt {
    /// Ask the user for a value; `None` when cancelled
    fn prompt(&mut self, message: &str) -> Option<String>;

    /// Show a message
    fn alert(&mut self, message: &str);
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("Path {0:?} does not point to a text node")]
    NotAText(Vec<usize>),

    #[error("Offset {offset} is past the end of the text at {path:?}")]
    OffsetOutOfRange { path: Vec<usize>, offset: usize },

    #[error("No pending upload with id '{0}'")]
    UnknownUpload(String),

    #[error(transparent)]
    Upload(#[from] UploadError),
}

#[derive(Debug, Clone)]
pub struct Editor {
    document: Document,
    selection: Selection,
    registry: Arc<Registry>,
    rules: Arc<Rules>,
    session: SessionConfig,
    upload: UploadConfig,
    next_upload: u64,
}

impl Editor {
    /// Start a session on a new document (one empty paragraph)
    pub fn new(registry: Arc<Registry>, rules: Arc<Rules>) -> Self {
        Self::from_document(Document::new(), registry, rules)
    }

    /// Start a session on an existing tree; the tree is normalized first
    pub fn from_nodes(nodes: Vec<Node>, registry: Arc<Registry>, rules: Arc<Rules>) -> Self {
        let mut document = Document::from_nodes(nodes);
        document.normalize(&registry);
        Self::from_document(document, registry, rules)
    }

    fn from_document(document: Document, registry: Arc<Registry>, rules: Arc<Rules>) -> Self {
        let start = first_leaf_path(&document.nodes, &[]).unwrap_or_else(|| vec![0, 0]);
        Self {
            document,
            selection: Selection::caret(Point::new(start, 0)),
            registry,
            rules,
            session: SessionConfig::default(),
            upload: UploadConfig::default(),
            next_upload: 0,
        }
    }

    /// Builder: attach the session context (project, URL name, post or snippet)
    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    /// Builder: take the session context and upload endpoint from `postdoc.toml`
    pub fn with_config(mut self, config: &EditorConfig) -> Self {
        self.session = config.session.clone();
        self.upload = config.upload.clone();
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn nodes(&self) -> &[Node] {
        &self.document.nodes
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    /// Replace the selection; both points must address text within bounds
    pub fn set_selection(&mut self, selection: Selection) -> Result<(), EditorError> {
        self.check_point(&selection.anchor)?;
        self.check_point(&selection.focus)?;
        self.selection = selection;
        Ok(())
    }

    /// Place a caret
    pub fn select(&mut self, path: Vec<usize>, offset: usize) -> Result<(), EditorError> {
        self.set_selection(Selection::caret(Point::new(path, offset)))
    }

    fn check_point(&self, point: &Point) -> Result<(), EditorError> {
        let leaf = node_at(&self.document.nodes, &point.path)
            .and_then(Node::as_text)
            .ok_or_else(|| EditorError::NotAText(point.path.clone()))?;
        if point.offset > leaf.text.chars().count() {
            return Err(EditorError::OffsetOutOfRange {
                path: point.path.clone(),
                offset: point.offset,
            });
        }
        Ok(())
    }

    pub(crate) fn set_caret(&mut self, path: Vec<usize>, offset: usize) {
        self.selection = Selection::caret(Point::new(path, offset));
    }

    pub(crate) fn focus(&self) -> &Point {
        &self.selection.focus
    }

    /// The text leaf holding the caret
    pub fn leaf(&self) -> Option<&TextNode> {
        node_at(&self.document.nodes, &self.focus().path).and_then(Node::as_text)
    }

    pub(crate) fn leaf_mut(&mut self) -> Option<&mut TextNode> {
        let path = self.selection.focus.path.clone();
        node_at_mut(&mut self.document.nodes, &path).and_then(Node::as_text_mut)
    }

    /// Paths of the elements above the caret, innermost first
    pub(crate) fn ancestor_paths(&self) -> Vec<Vec<usize>> {
        let path = &self.focus().path;
        (1..path.len()).rev().map(|len| path[..len].to_vec()).collect()
    }

    pub(crate) fn element(&self, path: &[usize]) -> Option<&ElementNode> {
        node_at(&self.document.nodes, path).and_then(Node::as_element)
    }

    pub(crate) fn element_mut(&mut self, path: &[usize]) -> Option<&mut ElementNode> {
        node_at_mut(&mut self.document.nodes, path).and_then(Node::as_element_mut)
    }

    /// Path of the lowest block element above the caret
    pub fn block_path(&self) -> Option<Vec<usize>> {
        self.ancestor_paths().into_iter().find(|path| {
            self.element(path)
                .is_some_and(|element| !types::is_inline(element.kind()))
        })
    }

    /// The lowest block element above the caret
    pub fn block(&self) -> Option<&ElementNode> {
        self.block_path().and_then(|path| self.element(&path))
    }

    /// Path of the innermost element above the caret whose type is in `kinds`
    pub fn above(&self, kinds: &[String]) -> Option<Vec<usize>> {
        self.ancestor_paths().into_iter().find(|path| {
            self.element(path)
                .is_some_and(|element| kinds.iter().any(|kind| element.is_type(kind)))
        })
    }

    /// Whether the caret sits in a void element's placeholder
    pub fn in_void(&self) -> bool {
        self.ancestor_paths().iter().any(|path| {
            self.element(path)
                .is_some_and(|element| self.registry.is_void(element.kind()))
        })
    }

    /// The lowest block above the caret has no text
    pub fn is_block_above_empty(&self) -> bool {
        self.block().is_some_and(ElementNode::is_empty)
    }

    /// The caret is collapsed at the very start of its block
    pub fn is_selection_at_block_start(&self) -> bool {
        let Some(block) = self.block_path() else {
            return false;
        };
        self.selection.is_collapsed()
            && self.focus().offset == 0
            && self.focus().path[block.len()..].iter().all(|&index| index == 0)
    }

    /// The caret is collapsed at the very end of its block
    pub fn is_selection_at_block_end(&self) -> bool {
        let Some(block) = self.block_path() else {
            return false;
        };
        if !self.selection.is_collapsed() {
            return false;
        }
        let at_leaf_end = self
            .leaf()
            .is_some_and(|leaf| self.focus().offset == leaf.text.chars().count());
        let mut prefix = block.clone();
        let last_at_every_level = self.focus().path[block.len()..].iter().all(|&index| {
            let count = self.element(&prefix).map_or(0, |element| element.children.len());
            prefix.push(index);
            index + 1 == count
        });
        at_leaf_end && last_at_every_level
    }

    /// Text of the caret's leaf before the caret
    pub(crate) fn text_before_cursor(&self) -> String {
        self.leaf()
            .map(|leaf| leaf.text.chars().take(self.focus().offset).collect())
            .unwrap_or_default()
    }

    /// One more than the largest numeric `id` in the document
    pub(crate) fn fresh_id(&self) -> u64 {
        fn max_id(nodes: &[Node]) -> Option<u64> {
            nodes
                .iter()
                .filter_map(Node::as_element)
                .flat_map(|element| {
                    let own = element.attributes.get("id").and_then(Value::as_u64);
                    own.into_iter().chain(max_id(&element.children))
                })
                .max()
        }
        max_id(&self.document.nodes).map_or(0, |id| id + 1)
    }

    /// A new element carrying a fresh id
    pub(crate) fn new_element(&self, kind: &str, children: Vec<Node>) -> ElementNode {
        ElementNode::new(kind, children).with_attr("id", self.fresh_id())
    }

    /// Type text at the caret
    ///
    /// A single character is first offered to the autoformat rules; when one
    /// fires, the character is consumed. Text typed into a void element is
    /// dropped.
    pub fn insert_text(&mut self, text: &str) {
        if text.is_empty() || self.in_void() {
            return;
        }
        if !self.selection.is_collapsed() {
            self.delete_selection();
        }

        let mut chars = text.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if self.autoformat(c) {
                return;
            }
        }

        self.insert_at_cursor(text);
    }

    pub(crate) fn insert_at_cursor(&mut self, text: &str) {
        let Point { path, offset } = self.focus().clone();
        if let Some(leaf) = self.leaf_mut() {
            let at = byte_index(&leaf.text, offset);
            leaf.text.insert_str(at, text);
            self.set_caret(path, offset + text.chars().count());
        }
    }

    /// Remove `count` characters before the caret within its leaf
    pub(crate) fn delete_before_cursor(&mut self, count: usize) {
        let Point { path, offset } = self.focus().clone();
        let start = offset.saturating_sub(count);
        if let Some(leaf) = self.leaf_mut() {
            let from = byte_index(&leaf.text, start);
            let to = byte_index(&leaf.text, offset);
            leaf.text.replace_range(from..to, "");
            self.set_caret(path, start);
        }
    }

    /// Delete the selected text
    ///
    /// Supported when both ends share a parent element; otherwise the
    /// selection just collapses to its start.
    pub fn delete_selection(&mut self) {
        if self.selection.is_collapsed() {
            return;
        }
        let (start, end) = self.selection.ordered();
        let (start, end) = (start.clone(), end.clone());

        if start.path == end.path {
            if let Some(leaf) = node_at_mut(&mut self.document.nodes, &start.path)
                .and_then(Node::as_text_mut)
            {
                let from = byte_index(&leaf.text, start.offset);
                let to = byte_index(&leaf.text, end.offset);
                leaf.text.replace_range(from..to, "");
            }
        } else if let Some((parent, first, last)) = shared_parent(&start.path, &end.path) {
            if let Some(element) = self.element_mut(&parent) {
                if let Some(Node::Text(leaf)) = element.children.get_mut(first) {
                    let from = byte_index(&leaf.text, start.offset);
                    leaf.text.truncate(from);
                }
                if let Some(Node::Text(leaf)) = element.children.get_mut(last) {
                    let to = byte_index(&leaf.text, end.offset);
                    leaf.text.replace_range(..to, "");
                }
                element.children.drain(first + 1..last);
            }
        } else {
            log::debug!("Selection spans several blocks, collapsing instead of deleting");
        }

        self.set_caret(start.path, start.offset);
    }
}

/// Path of the first text leaf at or below `prefix`
pub(crate) fn first_leaf_path(nodes: &[Node], prefix: &[usize]) -> Option<Vec<usize>> {
    let mut path = prefix.to_vec();
    if path.is_empty() {
        nodes.first()?;
        path.push(0);
    }
    loop {
        match node_at(nodes, &path)? {
            Node::Text(_) => return Some(path),
            Node::Element(element) if element.children.is_empty() => return None,
            Node::Element(_) => path.push(0),
        }
    }
}

/// Path of the last text leaf at or below `prefix`
pub(crate) fn last_leaf_path(nodes: &[Node], prefix: &[usize]) -> Option<Vec<usize>> {
    let mut path = prefix.to_vec();
    loop {
        match node_at(nodes, &path)? {
            Node::Text(_) => return Some(path),
            Node::Element(element) => path.push(element.children.len().checked_sub(1)?),
        }
    }
}

/// For two leaf paths under one parent: the parent and both child indices
fn shared_parent(a: &[usize], b: &[usize]) -> Option<(Vec<usize>, usize, usize)> {
    let (a_last, a_parent) = a.split_last()?;
    let (b_last, b_parent) = b.split_last()?;
    (a_parent == b_parent && !a_parent.is_empty()).then(|| (a_parent.to_vec(), *a_last, *b_last))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::plugins::default_registry;
    use crate::rules::Rules;

    pub(crate) fn editor(nodes: Vec<Node>) -> Editor {
        Editor::from_nodes(
            nodes,
            Arc::new(default_registry()),
            Arc::new(Rules::standard().unwrap()),
        )
    }

    pub(crate) fn type_text(editor: &mut Editor, text: &str) {
        for c in text.chars() {
            editor.insert_text(&c.to_string());
        }
    }

    #[test]
    fn test_new_editor_starts_in_empty_paragraph() {
        let editor = Editor::new(
            Arc::new(default_registry()),
            Arc::new(Rules::standard().unwrap()),
        );
        assert_eq!(editor.document(), &Document::new());
        assert_eq!(editor.selection().focus, Point::new(vec![0, 0], 0));
        assert_eq!(editor.fresh_id(), 1);
    }

    #[test]
    fn test_insert_text_moves_caret() {
        let mut editor = editor(vec![Node::element("p", vec![Node::text("ac")])]);
        editor.select(vec![0, 0], 1).unwrap();

        editor.insert_text("b");

        assert_eq!(editor.leaf().unwrap().text, "abc");
        assert_eq!(editor.selection().focus.offset, 2);
    }

    #[test]
    fn test_set_selection_rejects_bad_points() {
        let mut editor = editor(vec![Node::element("p", vec![Node::text("ab")])]);

        assert_eq!(editor.select(vec![0], 0), Err(EditorError::NotAText(vec![0])));
        assert!(matches!(
            editor.select(vec![0, 0], 3),
            Err(EditorError::OffsetOutOfRange { .. })
        ));
    }

    #[test]
    fn test_text_in_void_is_dropped() {
        let mut editor = editor(vec![ElementNode::void("img").into()]);
        editor.select(vec![0, 0], 0).unwrap();

        editor.insert_text("x");

        assert_eq!(editor.nodes()[0], ElementNode::void("img").into());
    }

    #[test]
    fn test_block_edges() {
        let link = ElementNode::new("a", vec![Node::text("b")]).with_attr("url", "http://x");
        let mut editor = editor(vec![Node::element(
            "p",
            vec![Node::text("a"), link.into(), Node::text("c")],
        )]);

        editor.select(vec![0, 0], 0).unwrap();
        assert!(editor.is_selection_at_block_start());
        assert_eq!(editor.block_path(), Some(vec![0]));

        editor.select(vec![0, 1, 0], 1).unwrap();
        assert_eq!(editor.block_path(), Some(vec![0]));
        assert!(!editor.is_selection_at_block_end());

        editor.select(vec![0, 2], 1).unwrap();
        assert!(editor.is_selection_at_block_end());
    }

    #[test]
    fn test_delete_selection_within_parent() {
        let bold = TextNode::new("bold").with_mark(crate::document::Mark::Bold);
        let mut editor = editor(vec![Node::element(
            "p",
            vec![Node::text("one "), bold.into(), Node::text(" two")],
        )]);
        editor
            .set_selection(Selection {
                anchor: Point::new(vec![0, 2], 2),
                focus: Point::new(vec![0, 0], 2),
            })
            .unwrap();

        editor.delete_selection();

        assert_eq!(editor.nodes()[0].text_content(), "onwo");
        assert_eq!(editor.selection().focus, Point::new(vec![0, 0], 2));
    }
}
