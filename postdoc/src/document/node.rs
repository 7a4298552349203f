//! Document tree nodes
//!
//! A node is either an element (a typed container with children and free-form
//! attributes) or a text leaf (a string with a set of marks). The persisted
//! shape is plain JSON: an object is an element iff it has a `children` key.

use super::error::NodeError;
use super::types::Mark;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// A unit of the document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum Node {
    /// A typed container
    Element(ElementNode),
    /// A leaf carrying text and marks
    Text(TextNode),
}

/// A typed container node
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementNode {
    /// The `type` tag, `None` for untyped containers
    pub kind: Option<String>,

    /// Ordered child nodes
    pub children: Vec<Node>,

    /// Every other key of the persisted object, kept verbatim
    pub attributes: Map<String, Value>,
}

/// A text leaf
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextNode {
    /// The text content
    pub text: String,

    /// Marks applied to the whole leaf
    pub marks: BTreeSet<Mark>,

    /// Unrecognised keys of the persisted object, kept verbatim
    pub attributes: Map<String, Value>,
}

impl Node {
    /// Create a plain text leaf
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(TextNode::new(text))
    }

    /// Create an element with the given type and children
    pub fn element(kind: &str, children: Vec<Node>) -> Self {
        Node::Element(ElementNode::new(kind, children))
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementNode> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextNode> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    /// Check whether this node is an element of the given type
    pub fn is_type(&self, kind: &str) -> bool {
        self.as_element().is_some_and(|element| element.is_type(kind))
    }

    /// Concatenated text of every leaf below this node
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(leaf) => out.push_str(&leaf.text),
            Node::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
        }
    }
}

impl From<ElementNode> for Node {
    fn from(element: ElementNode) -> Self {
        Node::Element(element)
    }
}

impl From<TextNode> for Node {
    fn from(text: TextNode) -> Self {
        Node::Text(text)
    }
}

impl ElementNode {
    /// Create an element with the given type and children
    pub fn new(kind: &str, children: Vec<Node>) -> Self {
        Self {
            kind: Some(kind.to_string()),
            children,
            attributes: Map::new(),
        }
    }

    /// Create a void element carrying the single empty placeholder leaf
    pub fn void(kind: &str) -> Self {
        Self::new(kind, vec![Node::text("")])
    }

    /// Builder: set an attribute
    pub fn with_attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// The `type` tag, or `""` for untyped containers
    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or("")
    }

    pub fn is_type(&self, kind: &str) -> bool {
        self.kind.as_deref() == Some(kind)
    }

    /// String attribute lookup
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Boolean attribute lookup (missing means `false`)
    pub fn attr_bool(&self, key: &str) -> bool {
        self.attributes
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// True when every leaf below this element is empty
    pub fn is_empty(&self) -> bool {
        self.children.iter().all(|child| match child {
            Node::Text(leaf) => leaf.text.is_empty(),
            Node::Element(element) => element.is_empty(),
        })
    }

    /// True when this element only holds text leaves and inline elements
    pub fn has_inline_children(&self) -> bool {
        self.children.iter().all(|child| match child {
            Node::Text(_) => true,
            Node::Element(element) => super::types::is_inline(element.kind()),
        })
    }
}

impl TextNode {
    /// Create a leaf with no marks
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: BTreeSet::new(),
            attributes: Map::new(),
        }
    }

    /// Builder: add a mark
    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.marks.insert(mark);
        self
    }

    pub fn has_mark(&self, mark: Mark) -> bool {
        self.marks.contains(&mark)
    }

    /// A leaf with the same marks and attributes but different text
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: self.marks.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "a boolean".to_string(),
        Value::Number(n) => format!("the number {}", n),
        Value::String(s) => format!("the string {:?}", s),
        Value::Array(_) => "an array".to_string(),
        Value::Object(_) => "an object".to_string(),
    }
}

impl TryFrom<Value> for Node {
    type Error = NodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut map) = value else {
            return Err(NodeError::NotAnObject {
                found: describe(&value),
            });
        };

        if let Some(children) = map.remove("children") {
            let Value::Array(children) = children else {
                return Err(NodeError::InvalidChildren {
                    found: describe(&children),
                });
            };

            let kind = match map.remove("type") {
                None | Some(Value::Null) => None,
                Some(Value::String(kind)) => Some(kind),
                Some(other) => {
                    return Err(NodeError::InvalidType {
                        found: describe(&other),
                    })
                }
            };

            let children = children
                .into_iter()
                .map(Node::try_from)
                .collect::<Result<Vec<_>, _>>()?;

            return Ok(Node::Element(ElementNode {
                kind,
                children,
                attributes: map,
            }));
        }

        match map.remove("text") {
            Some(Value::String(text)) => {
                // Only `true` marks are lifted out; `false` and unknown keys stay as attributes
                let mut marks = BTreeSet::new();
                for mark in Mark::ALL {
                    if map.get(mark.key()) == Some(&Value::Bool(true)) {
                        map.remove(mark.key());
                        marks.insert(mark);
                    }
                }
                Ok(Node::Text(TextNode {
                    text,
                    marks,
                    attributes: map,
                }))
            }
            Some(other) => Err(NodeError::InvalidText {
                found: describe(&other),
            }),
            None => Err(NodeError::MissingTextOrChildren),
        }
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        match node {
            Node::Element(element) => {
                let mut map = element.attributes;
                if let Some(kind) = element.kind {
                    map.insert("type".to_string(), Value::String(kind));
                }
                map.insert(
                    "children".to_string(),
                    Value::Array(element.children.into_iter().map(Value::from).collect()),
                );
                Value::Object(map)
            }
            Node::Text(leaf) => {
                let mut map = leaf.attributes;
                map.insert("text".to_string(), Value::String(leaf.text));
                for mark in leaf.marks {
                    map.insert(mark.key().to_string(), Value::Bool(true));
                }
                Value::Object(map)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_element_from_json() {
        let node: Node = serde_json::from_value(json!({
            "type": "p",
            "id": 3,
            "children": [{"text": "hi", "bold": true}]
        }))
        .unwrap();

        let element = node.as_element().unwrap();
        assert!(element.is_type("p"));
        assert_eq!(element.attributes.get("id"), Some(&json!(3)));
        let leaf = element.children[0].as_text().unwrap();
        assert_eq!(leaf.text, "hi");
        assert!(leaf.has_mark(Mark::Bold));
    }

    #[test]
    fn test_unknown_keys_survive_roundtrip() {
        let original = json!({
            "type": "img",
            "url": "/uploads/a.png",
            "caption": [{"text": "a"}],
            "children": [{"text": "", "italic": false, "comment": "x"}]
        });

        let node: Node = serde_json::from_value(original.clone()).unwrap();
        let back = serde_json::to_value(&node).unwrap();

        assert_eq!(back, original);
    }

    #[test]
    fn test_untyped_element() {
        let node: Node = serde_json::from_value(json!({"children": [{"text": "x"}]})).unwrap();
        assert_eq!(node.as_element().unwrap().kind, None);
    }

    #[test]
    fn test_invalid_nodes_are_rejected() {
        let err = Node::try_from(json!({"type": "p"})).unwrap_err();
        assert_eq!(err, NodeError::MissingTextOrChildren);

        let err = Node::try_from(json!({"children": "nope"})).unwrap_err();
        assert!(matches!(err, NodeError::InvalidChildren { .. }));

        let err = Node::try_from(json!(42)).unwrap_err();
        assert!(matches!(err, NodeError::NotAnObject { .. }));
    }

    #[test]
    fn test_element_is_empty() {
        let empty = ElementNode::new("p", vec![Node::text(""), Node::text("")]);
        assert!(empty.is_empty());

        let full = ElementNode::new("p", vec![Node::text(""), Node::text("x")]);
        assert!(!full.is_empty());
    }
}
