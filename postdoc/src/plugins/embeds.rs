//! Void embed bindings
//!
//! Void elements render their placeholder leaf inside a non-editable wrapper in
//! the editor. Their static form carries no placeholder at all.

use crate::document::types;
use crate::html_deserializer::DeserializeRule;
use crate::markup::{Fragment, Tag};
use crate::registry::{ElementProps, PluginBinding};

/// Canonical URL of a tweet
pub fn tweet_url(tweet_id: &str) -> String {
    format!("https://twitter.com/i/status/{}", tweet_id)
}

pub(super) fn bindings() -> Vec<PluginBinding> {
    vec![image(), media_embed(), loading(), tweet(), cta()]
}

/// Editor wrapper shared by every void element
fn void_wrapper(class: &str, content: Fragment, props: &ElementProps<'_>) -> Fragment {
    let mut inner = content;
    inner.push(props.children);
    Tag::new("div").class(class).void_node().wrap(&inner)
}

fn image() -> PluginBinding {
    PluginBinding::element(types::ELEMENT_IMAGE, &[types::ELEMENT_IMAGE])
        .render(|props| {
            let img = Tag::new("img")
                .class("slate-img-content max-w-full mx-auto")
                .attr_opt("src", props.element.attr_str("url"))
                .empty();
            void_wrapper("slate-img my-4", img, props)
        })
        .serialize(|props| {
            Tag::new("img")
                .class("slate-img")
                .attr_opt("src", props.element.attr_str("url"))
                .empty()
        })
        .void()
        .deserialize(DeserializeRule::element("img", types::ELEMENT_IMAGE).attr("src", "url").void())
}

fn media_embed() -> PluginBinding {
    PluginBinding::element(types::ELEMENT_MEDIA_EMBED, &[types::ELEMENT_MEDIA_EMBED])
        .render(|props| {
            let frame = Tag::new("iframe")
                .class("slate-media_embed-iframe w-full aspect-video")
                .attr_opt("src", props.element.attr_str("url"))
                .wrap(&Fragment::empty());
            void_wrapper("slate-media_embed my-4", frame, props)
        })
        .serialize(|props| {
            Tag::new("iframe")
                .class("slate-media_embed")
                .attr_opt("src", props.element.attr_str("url"))
                .wrap(&Fragment::empty())
        })
        .void()
        .deserialize(
            DeserializeRule::element("iframe", types::ELEMENT_MEDIA_EMBED)
                .attr("src", "url")
                .void(),
        )
}

fn loading_tag(props: &ElementProps<'_>) -> Tag {
    let element = props.element;
    Tag::new("div")
        .attr_opt("data-upload-id", element.attr_str("uploadId"))
        .attr_opt("data-failed", element.attr_bool("failed").then_some("true"))
        .attr_opt("data-error", element.attr_str("error"))
}

fn loading() -> PluginBinding {
    PluginBinding::element(types::ELEMENT_LOADING, &[types::ELEMENT_LOADING])
        .render(|props| {
            let message = if props.element.attr_bool("failed") {
                let error = props.element.attr_str("error").unwrap_or("unknown error");
                Tag::new("span")
                    .class("text-red-500")
                    .wrap(&Fragment::text(&format!("Image upload failed: {}", error)))
            } else {
                Tag::new("span")
                    .class("opacity-50")
                    .wrap(&Fragment::text("Uploading image..."))
            };
            let mut inner = message;
            inner.push(props.children);
            loading_tag(props)
                .class("slate-loading my-4 p-4 border")
                .void_node()
                .wrap(&inner)
        })
        .serialize(|props| loading_tag(props).class("slate-loading").wrap(&Fragment::empty()))
        .void()
        .deserialize(
            DeserializeRule::element("div", types::ELEMENT_LOADING)
                .class("slate-loading")
                .attr("data-upload-id", "uploadId")
                .bool_attr("data-failed", "failed")
                .attr("data-error", "error")
                .void(),
        )
}

fn tweet_markup(props: &ElementProps<'_>, class: &str) -> Tag {
    Tag::new("div")
        .class(class)
        .attr_opt("data-tweet-id", props.element.attr_str("tweetId"))
}

fn tweet_link(props: &ElementProps<'_>) -> Fragment {
    match props.element.attr_str("tweetId") {
        Some(id) => {
            let url = tweet_url(id);
            Tag::new("a").attr("href", &url).wrap(&Fragment::text(&url))
        }
        None => Fragment::empty(),
    }
}

fn tweet() -> PluginBinding {
    PluginBinding::element(types::ELEMENT_TWEET, &[types::ELEMENT_TWEET])
        .render(|props| {
            let mut inner = tweet_link(props);
            inner.push(props.children);
            tweet_markup(props, "slate-tweet my-4 mx-auto")
                .void_node()
                .wrap(&inner)
        })
        .serialize(|props| tweet_markup(props, "slate-tweet").wrap(&tweet_link(props)))
        .void()
        .deserialize(
            DeserializeRule::element("div", types::ELEMENT_TWEET)
                .class("slate-tweet")
                .attr("data-tweet-id", "tweetId")
                .void(),
        )
}

fn cta() -> PluginBinding {
    PluginBinding::element(types::ELEMENT_CTA, &[types::ELEMENT_CTA])
        .render(|props| {
            let label = Tag::new("div")
                .class("up-cta-box p-4 border rounded")
                .wrap(&Fragment::text("Call to action"));
            void_wrapper("slate-cta my-4", label, props)
        })
        .serialize(|_| Tag::new("div").class("slate-cta").wrap(&Fragment::empty()))
        .void()
        .deserialize(DeserializeRule::element("div", types::ELEMENT_CTA).class("slate-cta").void())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ElementNode, Node};

    fn serialize(binding: &PluginBinding, element: &ElementNode) -> String {
        let children = Fragment::empty();
        let props = ElementProps {
            element,
            children: &children,
        };
        binding.serialize_element(&props).unwrap().into_string()
    }

    #[test]
    fn test_image_static_markup() {
        let element = ElementNode::void("img").with_attr("url", "/uploads/a.png");
        assert_eq!(
            serialize(&image(), &element),
            "<img class=\"slate-img\" src=\"/uploads/a.png\">"
        );
    }

    #[test]
    fn test_tweet_static_markup() {
        let element = ElementNode::void("tweet").with_attr("tweetId", "123");
        assert_eq!(
            serialize(&tweet(), &element),
            "<div class=\"slate-tweet\" data-tweet-id=\"123\"><a href=\"https://twitter.com/i/status/123\">https://twitter.com/i/status/123</a></div>"
        );
    }

    #[test]
    fn test_failed_loading_keeps_error() {
        let element = ElementNode::void("loading")
            .with_attr("uploadId", "7")
            .with_attr("failed", true)
            .with_attr("error", "too <big>");
        assert_eq!(
            serialize(&loading(), &element),
            "<div class=\"slate-loading\" data-upload-id=\"7\" data-failed=\"true\" data-error=\"too &lt;big&gt;\"></div>"
        );
    }

    #[test]
    fn test_void_render_holds_placeholder() {
        let element = ElementNode::void("cta");
        let children = Fragment::markup("<span data-slate-leaf=\"true\"></span>");
        let props = ElementProps {
            element: &element,
            children: &children,
        };

        let html = cta().render_element(&props).unwrap().into_string();

        assert!(html.contains("data-slate-void=\"true\" contenteditable=\"false\""));
        assert!(html.ends_with("<span data-slate-leaf=\"true\"></span></div>"));
        assert_eq!(element.children, vec![Node::text("")]);
    }
}
