//! Image references inside documents
//!
//! Used by the orphan-image cleanup: uploads attached to a post or snippet
//! that no image node references any more can be deleted.

use super::node::Node;
use super::types::ELEMENT_IMAGE;

/// Collect the `url` of every image element, in document order
pub fn find_images(nodes: &[Node]) -> Vec<String> {
    let mut urls = Vec::new();
    collect_images(nodes, &mut urls);
    urls
}

fn collect_images(nodes: &[Node], urls: &mut Vec<String>) {
    for node in nodes {
        let Node::Element(element) = node else {
            continue;
        };
        if element.is_type(ELEMENT_IMAGE) {
            if let Some(url) = element.attr_str("url") {
                urls.push(url.to_string());
            }
        }
        collect_images(&element.children, urls);
    }
}

/// Return the attached image keys that no used URL contains
///
/// # Parameters
/// * `attached` - Storage keys of every image uploaded for the document
/// * `used` - URLs referenced by the document's image nodes
pub fn unused_images<'a>(attached: &'a [String], used: &[String]) -> Vec<&'a String> {
    attached
        .iter()
        .filter(|key| !used.iter().any(|url| url.contains(key.as_str())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ElementNode;

    #[test]
    fn test_find_images_nested() {
        let nodes = vec![
            Node::element("p", vec![Node::text("intro")]),
            ElementNode::void("img").with_attr("url", "https://cdn/a.png").into(),
            Node::element(
                "ul",
                vec![Node::element(
                    "li",
                    vec![ElementNode::void("img").with_attr("url", "https://cdn/b.png").into()],
                )],
            ),
        ];

        assert_eq!(find_images(&nodes), vec!["https://cdn/a.png", "https://cdn/b.png"]);
    }

    #[test]
    fn test_unused_images() {
        let attached = vec!["a.png".to_string(), "b.png".to_string()];
        let used = vec!["https://cdn/u/a.png".to_string()];

        assert_eq!(unused_images(&attached, &used), vec![&"b.png".to_string()]);
    }
}
