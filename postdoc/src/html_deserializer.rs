//! HTML to document deserialization
//!
//! The deserializer is the round-trip binding appended last to the registry.
//! It is assembled from the [`DeserializeRule`]s every earlier binding
//! declares, so it only knows the types the registry can render.

use crate::document::{merge_text_leaves, types, ElementNode, Mark, Node, TextNode};
use crate::registry::PluginBinding;
use html5ever::tendril::TendrilSink;
use html5ever::{local_name, namespace_url, ns, parse_fragment, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use serde_json::Value;
use std::collections::BTreeSet;

/// What a matched HTML element becomes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTarget {
    /// An element node of the given type
    Element(String),
    /// A mark applied to every leaf below the HTML element
    Mark(Mark),
}

/// How an HTML attribute value is stored on the node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    String,
    /// Stored as `true` when the value is `"true"` or empty; otherwise omitted
    Bool,
}

/// Copy of one HTML attribute onto a node attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrMapping {
    pub html: String,
    pub attribute: String,
    pub kind: AttrKind,
}

/// How the children of a matched HTML element are read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleContent {
    /// Deserialize children recursively
    Children,
    /// Ignore children; the node gets the placeholder leaf
    Void,
    /// Split the text content on newlines into elements of the given type
    Lines(String),
}

/// One HTML-to-node mapping declared by a binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeserializeRule {
    pub tag: String,
    pub class: Option<String>,
    pub target: RuleTarget,
    pub attributes: Vec<AttrMapping>,
    pub content: RuleContent,
}

impl DeserializeRule {
    /// `<tag>` becomes an element of type `kind`
    pub fn element(tag: &str, kind: &str) -> Self {
        Self {
            tag: tag.to_string(),
            class: None,
            target: RuleTarget::Element(kind.to_string()),
            attributes: Vec::new(),
            content: RuleContent::Children,
        }
    }

    /// `<tag>` applies `mark` to its contents
    pub fn mark(tag: &str, mark: Mark) -> Self {
        Self {
            tag: tag.to_string(),
            class: None,
            target: RuleTarget::Mark(mark),
            attributes: Vec::new(),
            content: RuleContent::Children,
        }
    }

    /// Builder: only match elements carrying this class name
    pub fn class(mut self, class: &str) -> Self {
        self.class = Some(class.to_string());
        self
    }

    /// Builder: copy a string attribute
    pub fn attr(mut self, html: &str, attribute: &str) -> Self {
        self.attributes.push(AttrMapping {
            html: html.to_string(),
            attribute: attribute.to_string(),
            kind: AttrKind::String,
        });
        self
    }

    /// Builder: copy a boolean attribute
    pub fn bool_attr(mut self, html: &str, attribute: &str) -> Self {
        self.attributes.push(AttrMapping {
            html: html.to_string(),
            attribute: attribute.to_string(),
            kind: AttrKind::Bool,
        });
        self
    }

    /// Builder: ignore the HTML children
    pub fn void(mut self) -> Self {
        self.content = RuleContent::Void;
        self
    }

    /// Builder: read the text content as lines of `line_kind` elements
    pub fn lines(mut self, line_kind: &str) -> Self {
        self.content = RuleContent::Lines(line_kind.to_string());
        self
    }

    fn matches(&self, element: &HtmlElement) -> bool {
        element.tag == self.tag
            && self
                .class
                .as_deref()
                .map_or(true, |class| element.has_class(class))
    }
}

/// Parsed HTML tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlNode {
    Element(HtmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlElement {
    /// Lower-cased tag name
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<HtmlNode>,
}

impl HtmlElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    fn text_content(&self, out: &mut String) {
        for child in &self.children {
            match child {
                HtmlNode::Text(text) => out.push_str(text),
                HtmlNode::Element(element) if element.tag == "br" => out.push('\n'),
                HtmlNode::Element(element) => element.text_content(out),
            }
        }
    }
}

/// Elements whose content is never document text
const SKIPPED_HTML_TAGS: [&str; 4] = ["script", "style", "template", "noscript"];

/// Parse an HTML fragment into a tree
///
/// Parsing follows the HTML5 algorithm in a `<body>` context, so character
/// references are decoded, unbalanced tags are repaired the way browsers
/// repair them, and raw-text elements never produce markup. Comments,
/// scripts and styles are dropped.
pub fn parse_html(html: &str) -> Vec<HtmlNode> {
    let dom = parse_fragment(
        RcDom::default(),
        ParseOpts::default(),
        QualName::new(None, ns!(html), local_name!("body")),
        Vec::new(),
    )
    .one(html);

    // The fragment's nodes hang off a synthetic <html> root
    let roots = dom.document.children.borrow();
    let nodes = roots
        .iter()
        .flat_map(|root| match &root.data {
            NodeData::Element { .. } => root
                .children
                .borrow()
                .iter()
                .filter_map(convert_handle)
                .collect::<Vec<_>>(),
            _ => Vec::new(),
        })
        .collect();
    nodes
}

fn convert_handle(handle: &Handle) -> Option<HtmlNode> {
    match &handle.data {
        NodeData::Text { contents } => Some(HtmlNode::Text(contents.borrow().to_string())),
        NodeData::Element { name, attrs, .. } => {
            let tag = name.local.to_string();
            if SKIPPED_HTML_TAGS.contains(&tag.as_str()) {
                return None;
            }
            let attributes = attrs
                .borrow()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect();
            let children = handle
                .children
                .borrow()
                .iter()
                .filter_map(convert_handle)
                .collect();
            Some(HtmlNode::Element(HtmlElement {
                tag,
                attributes,
                children,
            }))
        }
        _ => None,
    }
}

/// Converts HTML back into document nodes
#[derive(Debug, Clone, Default)]
pub struct HtmlDeserializer {
    rules: Vec<DeserializeRule>,
}

impl HtmlDeserializer {
    /// Collect the rules of every binding; class-qualified rules are tried first
    pub fn from_bindings(bindings: &[PluginBinding]) -> Self {
        let (mut rules, unqualified): (Vec<_>, Vec<_>) = bindings
            .iter()
            .flat_map(|binding| binding.deserialize_rules().iter().cloned())
            .partition(|rule| rule.class.is_some());
        rules.extend(unqualified);
        Self { rules }
    }

    pub fn rules(&self) -> &[DeserializeRule] {
        &self.rules
    }

    /// Deserialize an HTML fragment into top-level blocks
    ///
    /// Inline content found at the top level is gathered into paragraphs.
    /// Tags no rule claims are unwrapped and their children kept.
    pub fn deserialize(&self, html: &str) -> Vec<Node> {
        let mut inline = Vec::new();
        for node in parse_html(html) {
            self.convert(&node, &BTreeSet::new(), &mut inline);
        }

        let mut blocks = Vec::new();
        let mut run: Vec<Node> = Vec::new();
        for node in inline {
            if is_block(&node) {
                flush_paragraph(&mut run, &mut blocks);
                blocks.push(node);
            } else {
                run.push(node);
            }
        }
        flush_paragraph(&mut run, &mut blocks);
        blocks
    }

    fn rule_for(&self, element: &HtmlElement) -> Option<&DeserializeRule> {
        self.rules.iter().find(|rule| rule.matches(element))
    }

    fn convert(&self, node: &HtmlNode, marks: &BTreeSet<Mark>, out: &mut Vec<Node>) {
        let element = match node {
            HtmlNode::Text(text) => {
                out.push(leaf(text.clone(), marks));
                return;
            }
            HtmlNode::Element(element) => element,
        };

        if element.tag == "br" {
            out.push(leaf("\n".to_string(), marks));
            return;
        }

        let Some(rule) = self.rule_for(element) else {
            log::debug!("Unwrapping unclaimed <{}>", element.tag);
            for child in &element.children {
                self.convert(child, marks, out);
            }
            return;
        };

        let kind = match &rule.target {
            RuleTarget::Mark(mark) => {
                let mut marks = marks.clone();
                marks.insert(*mark);
                for child in &element.children {
                    self.convert(child, &marks, out);
                }
                return;
            }
            RuleTarget::Element(kind) => kind,
        };

        let mut node = ElementNode::new(kind, Vec::new());
        for mapping in &rule.attributes {
            let Some(value) = element.attr(&mapping.html) else {
                continue;
            };
            match mapping.kind {
                AttrKind::String => {
                    node.attributes
                        .insert(mapping.attribute.clone(), Value::String(value.to_string()));
                }
                AttrKind::Bool if value.is_empty() || value == "true" => {
                    node.attributes.insert(mapping.attribute.clone(), Value::Bool(true));
                }
                AttrKind::Bool => {}
            }
        }

        match &rule.content {
            RuleContent::Void => {}
            RuleContent::Lines(line_kind) => {
                let mut text = String::new();
                element.text_content(&mut text);
                node.children = text
                    .split('\n')
                    .map(|line| Node::element(line_kind, vec![Node::text(line)]))
                    .collect();
            }
            RuleContent::Children => {
                for child in &element.children {
                    self.convert(child, marks, &mut node.children);
                }
                if node.children.iter().any(is_block) {
                    node.children.retain(|child| {
                        !matches!(child, Node::Text(leaf) if leaf.text.trim().is_empty())
                    });
                }
            }
        }

        merge_text_leaves(&mut node.children);
        out.push(node.into());
    }
}

fn leaf(text: String, marks: &BTreeSet<Mark>) -> Node {
    let mut leaf = TextNode::new(text);
    leaf.marks = marks.clone();
    leaf.into()
}

fn is_block(node: &Node) -> bool {
    node.as_element()
        .is_some_and(|element| !types::is_inline(element.kind()))
}

fn flush_paragraph(run: &mut Vec<Node>, blocks: &mut Vec<Node>) {
    let only_whitespace = run.iter().all(|node| match node {
        Node::Text(leaf) => leaf.text.trim().is_empty(),
        Node::Element(_) => false,
    });
    if !only_whitespace {
        let mut children = std::mem::take(run);
        merge_text_leaves(&mut children);
        blocks.push(Node::element(types::ELEMENT_PARAGRAPH, children));
    }
    run.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::default_registry;

    fn deserialize(html: &str) -> Vec<Node> {
        let registry = default_registry();
        registry.html_deserializer().unwrap().deserialize(html)
    }

    #[test]
    fn test_parse_html_tree() {
        let nodes = parse_html("<p class=\"a b\">x<br>y</p>");
        let HtmlNode::Element(p) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(p.tag, "p");
        assert!(p.has_class("b"));
        assert_eq!(p.children.len(), 3);
    }

    #[test]
    fn test_parse_html_closes_unbalanced_tags() {
        let nodes = parse_html("<ul><li>one<li>two</ul></b>tail");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1], HtmlNode::Text("tail".to_string()));
    }

    #[test]
    fn test_parse_html_decodes_character_references() {
        let nodes = parse_html("<p>a &mdash; b &hellip; &copy;&rsquo; &lt;&#x41;&#39; &bogus;</p>");
        let HtmlNode::Element(p) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(
            p.children,
            vec![HtmlNode::Text("a \u{2014} b \u{2026} \u{a9}\u{2019} <A' &bogus;".to_string())]
        );
    }

    #[test]
    fn test_script_content_is_dropped() {
        let nodes = deserialize("<p>x</p><script>if (a<b>0) { y() }</script><style>p{}</style>");
        assert_eq!(nodes, vec![Node::element("p", vec![Node::text("x")])]);
    }

    #[test]
    fn test_named_entities_survive_round_trip() {
        let registry = default_registry();
        let nodes = registry
            .html_deserializer()
            .unwrap()
            .deserialize("<p>a &mdash; b &hellip;</p>");
        assert_eq!(nodes, vec![Node::element("p", vec![Node::text("a \u{2014} b \u{2026}")])]);

        let html = crate::html_serializer::serialize(
            &nodes,
            &registry,
            &crate::html_serializer::SerializeOptions::default(),
        );
        assert_eq!(html, "<p class=\"slate-p\">a \u{2014} b \u{2026}</p>");
    }

    #[test]
    fn test_marks_accumulate() {
        let nodes = deserialize("<p><em><strong>both</strong></em> plain</p>");

        let both = TextNode::new("both").with_mark(Mark::Bold).with_mark(Mark::Italic);
        assert_eq!(
            nodes,
            vec![Node::element("p", vec![both.into(), Node::text(" plain")])]
        );
    }

    #[test]
    fn test_pre_becomes_code_lines() {
        let nodes = deserialize("<pre><code>let a = 1;\n&lt;b&gt;</code></pre>");

        assert_eq!(
            nodes,
            vec![Node::element(
                "code_block",
                vec![
                    Node::element("code_line", vec![Node::text("let a = 1;")]),
                    Node::element("code_line", vec![Node::text("<b>")]),
                ]
            )]
        );
    }

    #[test]
    fn test_unknown_tags_are_unwrapped() {
        let nodes = deserialize("<section><p>in <blink>side</blink></p></section>");
        assert_eq!(nodes, vec![Node::element("p", vec![Node::text("in side")])]);
    }

    #[test]
    fn test_top_level_inline_is_wrapped() {
        let nodes = deserialize("loose <a href=\"http://x.io\">link</a>\n<h2>Title</h2>\n");

        let link = ElementNode::new("a", vec![Node::text("link")]).with_attr("url", "http://x.io");
        assert_eq!(
            nodes,
            vec![
                Node::element("p", vec![Node::text("loose "), link.into(), Node::text("\n")]),
                Node::element("h2", vec![Node::text("Title")]),
            ]
        );
    }

    #[test]
    fn test_void_embeds_get_placeholder() {
        let nodes = deserialize(
            "<img class=\"slate-img\" src=\"/a.png\"><div class=\"slate-tweet\" data-tweet-id=\"42\"><a href=\"x\">x</a></div>",
        );

        assert_eq!(
            nodes,
            vec![
                ElementNode::void("img").with_attr("url", "/a.png").into(),
                ElementNode::void("tweet").with_attr("tweetId", "42").into(),
            ]
        );
    }

    #[test]
    fn test_empty_element_gets_placeholder() {
        assert_eq!(
            deserialize("<p class=\"slate-p\"></p>"),
            vec![Node::element("p", vec![Node::text("")])]
        );
    }
}
