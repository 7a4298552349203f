//! Character mark bindings, in composition order

use crate::document::Mark;
use crate::html_deserializer::DeserializeRule;
use crate::markup::Tag;
use crate::registry::PluginBinding;

/// HTML tag a mark renders as, plus alternative tags read back as the same mark
fn tags(mark: Mark) -> (&'static str, &'static [&'static str]) {
    match mark {
        Mark::Bold => ("strong", &["b"]),
        Mark::Italic => ("em", &["i"]),
        Mark::Underline => ("u", &[]),
        Mark::Strikethrough => ("del", &["s"]),
        Mark::Code => ("code", &[]),
        Mark::Subscript => ("sub", &[]),
        Mark::Superscript => ("sup", &[]),
    }
}

pub(super) fn bindings() -> Vec<PluginBinding> {
    [
        Mark::Bold,
        Mark::Italic,
        Mark::Underline,
        Mark::Strikethrough,
        Mark::Code,
        Mark::Subscript,
        Mark::Superscript,
    ]
    .into_iter()
    .map(|mark| {
        let (tag, aliases) = tags(mark);
        let binding = PluginBinding::mark(mark, move |props| Tag::new(tag).wrap(props.children))
            .deserialize(DeserializeRule::mark(tag, mark));
        aliases.iter().fold(binding, |binding, alias| {
            binding.deserialize(DeserializeRule::mark(alias, mark))
        })
    })
    .collect()
}
