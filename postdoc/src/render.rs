//! Interactive editor rendering
//!
//! Produces the editor DOM: every binding's interactive renderer, leaf spans
//! carrying `data-slate-leaf`, and a drag gutter around each block the drag
//! table allows at its depth. This markup keeps all bookkeeping attributes;
//! [`crate::html_serializer`] is the path for published output.

use crate::document::Node;
use crate::draggable::{DragConfig, DragOptions};
use crate::html_serializer::apply_marks;
use crate::markup::{Fragment, Tag};
use crate::registry::{ElementProps, Registry};

/// Render a whole editor surface
pub fn render_editor(nodes: &[Node], registry: &Registry, drag: &DragConfig) -> String {
    let blocks: Fragment = nodes
        .iter()
        .map(|node| render_node(node, registry, drag, 0))
        .collect();

    Tag::new("div")
        .class("slate-editor prose w-full")
        .attr("data-slate-editor", "true")
        .attr("contenteditable", "true")
        .wrap(&blocks)
        .into_string()
}

fn render_node(node: &Node, registry: &Registry, drag: &DragConfig, depth: usize) -> Fragment {
    let element = match node {
        Node::Text(leaf) => {
            let content = if leaf.text.is_empty() {
                Tag::new("span")
                    .attr("data-slate-zero-width", "n")
                    .wrap(&Fragment::text("\u{feff}"))
            } else {
                Fragment::text(&leaf.text)
            };
            let marked = apply_marks(leaf, registry, content);
            return Tag::new("span").attr("data-slate-leaf", "true").wrap(&marked);
        }
        Node::Element(element) => element,
    };

    let children: Fragment = element
        .children
        .iter()
        .map(|child| render_node(child, registry, drag, depth + 1))
        .collect();
    let props = ElementProps {
        element,
        children: &children,
    };

    let html = element
        .kind
        .as_deref()
        .and_then(|kind| registry.resolve(kind))
        .and_then(|binding| binding.render_element(&props))
        .unwrap_or_else(|| Tag::new("div").node().wrap(&children));

    if drag.allows(element.kind(), depth) {
        drag_gutter(&html, &drag.options(element.kind()))
    } else {
        html
    }
}

fn drag_gutter(block: &Fragment, options: &DragOptions) -> Fragment {
    let padding = options
        .padding_top
        .as_ref()
        .map(|padding| format!("padding-top: {}", padding));

    let handle = Tag::new("button")
        .class("slate-drag-handle opacity-0 group-hover:opacity-100")
        .attr("type", "button")
        .attr("draggable", "true")
        .attr("data-testid", "drag-handle")
        .wrap(&Fragment::empty());
    let mut inner = Tag::new("div")
        .class("slate-gutterLeft absolute -left-8")
        .attr_opt("style", padding.as_deref())
        .attr("contenteditable", "false")
        .wrap(&handle);
    inner.push(&Tag::new("div").class("slate-blockWrapper").wrap(block));

    Tag::new("div")
        .class("slate-draggable group relative")
        .attr("data-testid", "draggable")
        .wrap(&inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ElementNode, Mark, TextNode};
    use crate::plugins::default_registry;

    fn render(nodes: &[Node]) -> String {
        render_editor(nodes, &default_registry(), &DragConfig::standard())
    }

    #[test]
    fn test_leaf_spans_wrap_marks() {
        let leaf = TextNode::new("b").with_mark(Mark::Bold);
        let html = render(&[Node::element("h4", vec![leaf.into()])]);

        assert!(html.contains("<span data-slate-leaf=\"true\"><strong>b</strong></span>"));
    }

    #[test]
    fn test_gutter_only_at_allowed_depth() {
        let nested = Node::element(
            "ul",
            vec![Node::element("li", vec![Node::element("p", vec![Node::text("x")])])],
        );

        let html = render(&[nested]);

        assert_eq!(html.matches("data-testid=\"draggable\"").count(), 1);
        assert!(html.contains("padding-top: 0.75em"));
    }

    #[test]
    fn test_heading_gutter_padding() {
        let html = render(&[Node::element("h2", vec![Node::text("T")])]);
        assert!(html.contains("style=\"padding-top: 3em\""));
    }

    #[test]
    fn test_void_renders_single_placeholder() {
        let html = render(&[ElementNode::void("img").with_attr("url", "/a.png").into()]);

        assert!(html.contains("data-slate-void=\"true\" contenteditable=\"false\""));
        assert_eq!(html.matches("data-slate-leaf").count(), 1);
        assert!(html.contains("data-slate-zero-width"));
    }
}
