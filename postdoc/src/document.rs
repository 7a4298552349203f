//! Document model
//!
//! A document is an ordered sequence of top-level block elements. This module
//! defines the node tree, tree locations, and the persisted JSON shape.

use crate::registry::Registry;
use serde_json::Value;

// Submodules
mod error;
pub mod images;
mod node;
mod path;
pub mod types;

// Re-export public types
pub use error::NodeError;
pub use node::{ElementNode, Node, TextNode};
pub use path::{byte_index, Point, Selection};
pub use types::Mark;

/// One post or snippet body
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    /// Top-level block elements
    pub nodes: Vec<Node>,
}

impl Document {
    /// Create the document a new editing session starts from
    ///
    /// # Returns
    /// * `Document` - One empty paragraph carrying the placeholder id `0`
    pub fn new() -> Self {
        let paragraph = ElementNode::new(types::ELEMENT_PARAGRAPH, vec![Node::text("")])
            .with_attr("id", 0);
        Self {
            nodes: vec![paragraph.into()],
        }
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Parse a persisted document (a JSON array of nodes)
    ///
    /// # Returns
    /// * `Ok(Document)` - Parsed document; an empty array yields the new-document paragraph
    /// * `Err(NodeError)` - Malformed JSON or node shape
    pub fn from_json(json: &str) -> Result<Self, NodeError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| NodeError::InvalidDocument(e.to_string()))?;
        let Value::Array(items) = value else {
            return Err(NodeError::InvalidDocument(
                "top level is not an array".to_string(),
            ));
        };

        let nodes = items
            .into_iter()
            .map(Node::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        if nodes.is_empty() {
            return Ok(Self::new());
        }
        Ok(Self { nodes })
    }

    /// Serialize to the persisted JSON shape
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.nodes)
    }

    /// Serialize to indented JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.nodes)
    }

    /// Look up a node by path
    pub fn node(&self, path: &[usize]) -> Option<&Node> {
        node_at(&self.nodes, path)
    }

    /// Look up a node mutably by path
    pub fn node_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        node_at_mut(&mut self.nodes, path)
    }

    /// Enforce the structural invariants the editor relies on
    ///
    /// * Every element has at least one child (an empty leaf is added)
    /// * Adjacent leaves with equal marks are merged, empty leaves dropped
    /// * Every void element has exactly one empty placeholder leaf
    /// * Top-level text leaves are wrapped in paragraphs
    pub fn normalize(&mut self, registry: &Registry) {
        let nodes = std::mem::take(&mut self.nodes);
        self.nodes = nodes
            .into_iter()
            .map(|node| match node {
                Node::Text(leaf) => Node::element(types::ELEMENT_PARAGRAPH, vec![leaf.into()]),
                element => element,
            })
            .collect();

        if self.nodes.is_empty() {
            *self = Self::new();
            return;
        }

        for node in &mut self.nodes {
            if let Node::Element(element) = node {
                normalize_element(element, registry);
            }
        }
    }
}

fn normalize_element(element: &mut ElementNode, registry: &Registry) {
    if registry.is_void(element.kind()) {
        element.children = vec![Node::text("")];
        return;
    }
    merge_text_leaves(&mut element.children);
    for child in &mut element.children {
        if let Node::Element(child) = child {
            normalize_element(child, registry);
        }
    }
}

/// Merge adjacent leaves that carry the same marks and attributes, then drop
/// empty leaves. A child list is never left empty: it keeps one empty leaf.
pub(crate) fn merge_text_leaves(children: &mut Vec<Node>) {
    let mut merged: Vec<Node> = Vec::with_capacity(children.len());
    for child in children.drain(..) {
        if let (Some(Node::Text(previous)), Node::Text(leaf)) = (merged.last_mut(), &child) {
            if previous.marks == leaf.marks && previous.attributes == leaf.attributes {
                previous.text.push_str(&leaf.text);
                continue;
            }
        }
        merged.push(child);
    }

    merged.retain(|child| !matches!(child, Node::Text(leaf) if leaf.text.is_empty()));
    if merged.is_empty() {
        merged.push(Node::text(""));
    }
    *children = merged;
}

/// Look up a node by path within a sequence of siblings
pub fn node_at<'a>(nodes: &'a [Node], path: &[usize]) -> Option<&'a Node> {
    let (first, rest) = path.split_first()?;
    let node = nodes.get(*first)?;
    if rest.is_empty() {
        return Some(node);
    }
    node_at(&node.as_element()?.children, rest)
}

/// Look up a node mutably by path within a sequence of siblings
pub fn node_at_mut<'a>(nodes: &'a mut [Node], path: &[usize]) -> Option<&'a mut Node> {
    let (first, rest) = path.split_first()?;
    let node = nodes.get_mut(*first)?;
    if rest.is_empty() {
        return Some(node);
    }
    node_at_mut(&mut node.as_element_mut()?.children, rest)
}

/// The child list a path points into: the root list for one-element paths
pub fn siblings_mut<'a>(nodes: &'a mut Vec<Node>, path: &[usize]) -> Option<&'a mut Vec<Node>> {
    match path.split_last() {
        None => None,
        Some((_, [])) => Some(nodes),
        Some((_, parent)) => node_at_mut(nodes, parent)?
            .as_element_mut()
            .map(|element| &mut element.children),
    }
}
