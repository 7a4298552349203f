//! Document to static HTML
//!
//! Walks the tree depth-first, left to right. Children are assembled into a
//! [`Fragment`] before their parent's serializer sees them, so user text is
//! escaped exactly once, at the leaf, and never re-interpreted afterwards.
//! Bookkeeping attributes and foreign class names are removed in one pass
//! over the assembled document.

use crate::document::{types, ElementNode, Node, TextNode};
use crate::markup::{escape_html, strip_class_names, strip_data_attributes, Fragment, Tag};
use crate::registry::{ElementProps, LeafProps, Registry};

/// Post-processing applied to the assembled markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Remove `data-slate-*` markers and `data-testid`
    pub strip_data_attributes: bool,

    /// Remove class names not matching `preserve_class_names`
    pub strip_class_names: bool,

    /// Class name prefixes that survive stripping
    pub preserve_class_names: Vec<String>,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            strip_data_attributes: true,
            strip_class_names: true,
            preserve_class_names: vec!["slate-".to_string()],
        }
    }
}

/// Serialize nodes to an HTML string
///
/// Never fails: an element no binding claims degrades to a `<div>` around
/// its children.
pub fn serialize(nodes: &[Node], registry: &Registry, options: &SerializeOptions) -> String {
    let mut html = serialize_nodes(nodes, registry).into_string();

    if options.strip_data_attributes {
        html = strip_data_attributes(&html);
    }
    if options.strip_class_names {
        html = strip_class_names(&html, &options.preserve_class_names);
    }

    html
}

fn serialize_nodes(nodes: &[Node], registry: &Registry) -> Fragment {
    nodes.iter().map(|node| serialize_node(node, registry)).collect()
}

fn serialize_node(node: &Node, registry: &Registry) -> Fragment {
    match node {
        Node::Text(leaf) => apply_marks(leaf, registry, Fragment::text(&leaf.text)),
        Node::Element(element) if element.is_type(types::ELEMENT_CODE_BLOCK) => {
            serialize_code_block(element)
        }
        Node::Element(element) => serialize_element(element, registry),
    }
}

/// Wrap leaf content in every mark binding that applies, in registry order
///
/// The first registered mark ends up innermost.
pub(crate) fn apply_marks(leaf: &TextNode, registry: &Registry, content: Fragment) -> Fragment {
    registry.mark_bindings().fold(content, |acc, binding| {
        match binding.mark_target() {
            Some(mark) if leaf.has_mark(mark) => {
                let rendered = binding.render_leaf(&LeafProps {
                    leaf,
                    children: &acc,
                });
                rendered.unwrap_or(acc)
            }
            _ => acc,
        }
    })
}

fn serialize_element(element: &ElementNode, registry: &Registry) -> Fragment {
    let children = serialize_nodes(&element.children, registry);

    let Some(kind) = element.kind.as_deref() else {
        return Tag::new("div").wrap(&children);
    };

    let props = ElementProps {
        element,
        children: &children,
    };
    match registry
        .resolve(kind)
        .and_then(|binding| binding.serialize_element(&props))
    {
        Some(html) => html,
        None => {
            log::warn!("No serializer for element type '{}', wrapping in <div>", kind);
            Tag::new("div").wrap(&children)
        }
    }
}

/// Code blocks bypass the registry: each line is escaped and the lines are
/// joined with newlines inside `<pre><code>`.
fn serialize_code_block(element: &ElementNode) -> Fragment {
    let lines: Vec<String> = element
        .children
        .iter()
        .filter_map(|line| match line {
            Node::Text(leaf) => Some(leaf.text.as_str()),
            Node::Element(line) => line
                .children
                .iter()
                .find_map(Node::as_text)
                .map(|leaf| leaf.text.as_str()),
        })
        .map(escape_html)
        .collect();

    Fragment::preformatted(format!("<pre><code>{}</code></pre>", lines.join("\n")))
}
