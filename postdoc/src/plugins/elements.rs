//! Block and inline element bindings

use crate::document::types::{self, KEYS_HEADING};
use crate::html_deserializer::DeserializeRule;
use crate::markup::{Fragment, Tag};
use crate::registry::{ElementProps, PluginBinding};

pub(super) fn bindings() -> Vec<PluginBinding> {
    let mut bindings = vec![paragraph()];
    bindings.extend(headings());
    bindings.extend([
        blockquote(),
        code_block(),
        code_line(),
        list(types::ELEMENT_UL),
        list(types::ELEMENT_OL),
        list_item(),
        action_item(),
        link(),
        table(),
        table_part(types::ELEMENT_TR, "tr", ""),
        table_part(types::ELEMENT_TH, "th", "border px-4 py-2 font-bold"),
        table_part(types::ELEMENT_TD, "td", "border px-4 py-2"),
    ]);
    bindings
}

fn paragraph() -> PluginBinding {
    PluginBinding::element(types::ELEMENT_PARAGRAPH, &[types::ELEMENT_PARAGRAPH])
        .render(|props| {
            Tag::new("p")
                .class("slate-p")
                .node()
                .wrap(props.children)
        })
        .deserialize(DeserializeRule::element("p", types::ELEMENT_PARAGRAPH))
}

fn headings() -> Vec<PluginBinding> {
    KEYS_HEADING
        .iter()
        .map(|&kind| {
            PluginBinding::element(kind, &[kind])
                .render(move |props| {
                    Tag::new(kind)
                        .class(&format!("slate-{}", kind))
                        .node()
                        .wrap(props.children)
                })
                .deserialize(DeserializeRule::element(kind, kind))
        })
        .collect()
}

fn blockquote() -> PluginBinding {
    PluginBinding::element(types::ELEMENT_BLOCKQUOTE, &[types::ELEMENT_BLOCKQUOTE])
        .render(|props| {
            Tag::new("blockquote")
                .class("slate-blockquote border-l-2 pl-4 my-2")
                .node()
                .wrap(props.children)
        })
        .deserialize(DeserializeRule::element("blockquote", types::ELEMENT_BLOCKQUOTE))
}

// The serializer writes code blocks itself; this renderer is the editor view.
fn code_block() -> PluginBinding {
    PluginBinding::element(types::ELEMENT_CODE_BLOCK, &[types::ELEMENT_CODE_BLOCK])
        .render(|props| {
            let code = Tag::new("code").wrap(props.children);
            Tag::new("pre")
                .class("slate-code_block font-mono p-4")
                .node()
                .wrap(&code)
        })
        .deserialize(
            DeserializeRule::element("pre", types::ELEMENT_CODE_BLOCK)
                .lines(types::ELEMENT_CODE_LINE),
        )
}

fn code_line() -> PluginBinding {
    PluginBinding::element(types::ELEMENT_CODE_LINE, &[types::ELEMENT_CODE_LINE]).render(|props| {
        Tag::new("div")
            .class("slate-code_line")
            .node()
            .wrap(props.children)
    })
}

fn list(kind: &'static str) -> PluginBinding {
    PluginBinding::element(kind, &[kind])
        .render(move |props| {
            let utility = if kind == types::ELEMENT_UL {
                "list-disc pl-6"
            } else {
                "list-decimal pl-6"
            };
            Tag::new(kind)
                .class(&format!("slate-{} {}", kind, utility))
                .node()
                .wrap(props.children)
        })
        .deserialize(DeserializeRule::element(kind, kind))
}

fn list_item() -> PluginBinding {
    PluginBinding::element(types::ELEMENT_LI, &[types::ELEMENT_LI])
        .render(|props| {
            Tag::new("li")
                .class("slate-li")
                .node()
                .wrap(props.children)
        })
        .deserialize(DeserializeRule::element("li", types::ELEMENT_LI))
}

fn action_item_markup(props: &ElementProps<'_>, editable: bool) -> Fragment {
    let checked = props.element.attr_bool("checked");
    let mut checkbox = Tag::new("input")
        .class("slate-action_item-checkbox mr-2")
        .attr("type", "checkbox")
        .attr_opt("checked", checked.then_some(""));
    if !editable {
        checkbox = checkbox.attr("disabled", "");
    }
    let mut inner = checkbox.empty();
    inner.push(&Tag::new("span").class("slate-action_item-text").wrap(props.children));

    let tag = Tag::new("div")
        .class("slate-action_item flex items-center")
        .attr("data-checked", if checked { "true" } else { "false" });
    if editable {
        tag.node().wrap(&inner)
    } else {
        tag.wrap(&inner)
    }
}

fn action_item() -> PluginBinding {
    PluginBinding::element(types::ELEMENT_TODO_LI, &[types::ELEMENT_TODO_LI])
        .render(|props| action_item_markup(props, true))
        .serialize(|props| action_item_markup(props, false))
        .deserialize(
            DeserializeRule::element("div", types::ELEMENT_TODO_LI)
                .class("slate-action_item")
                .bool_attr("data-checked", "checked"),
        )
}

fn link() -> PluginBinding {
    PluginBinding::element(types::ELEMENT_LINK, &[types::ELEMENT_LINK])
        .render(|props| {
            Tag::new("a")
                .class("slate-a underline")
                .node()
                .attr_opt("href", props.element.attr_str("url"))
                .wrap(props.children)
        })
        .deserialize(DeserializeRule::element("a", types::ELEMENT_LINK).attr("href", "url"))
}

fn table() -> PluginBinding {
    PluginBinding::element(types::ELEMENT_TABLE, &[types::ELEMENT_TABLE])
        .render(|props| {
            let body = Tag::new("tbody").wrap(props.children);
            Tag::new("table")
                .class("slate-table table-auto my-4")
                .node()
                .wrap(&body)
        })
        .deserialize(DeserializeRule::element("table", types::ELEMENT_TABLE))
}

fn table_part(kind: &'static str, tag: &'static str, utility: &'static str) -> PluginBinding {
    PluginBinding::element(kind, &[kind])
        .render(move |props| {
            Tag::new(tag)
                .class(&format!("slate-{} {}", kind, utility))
                .node()
                .wrap(props.children)
        })
        .deserialize(DeserializeRule::element(tag, kind))
}
