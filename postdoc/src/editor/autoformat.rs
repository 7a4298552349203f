//! Markdown-style shortcuts applied while typing

use super::Editor;
use crate::document::{siblings_mut, types, Mark, Node};
use crate::rules::{AutoformatMode, AutoformatRule, FormatTarget};

impl Editor {
    /// Offer a typed character to the autoformat rules
    ///
    /// Returns `true` when a rule fired and consumed the character. Rules are
    /// tried in table order; code lines and void elements never autoformat.
    pub(crate) fn autoformat(&mut self, trigger: char) -> bool {
        if !self.selection.is_collapsed() || self.in_void() {
            return false;
        }
        if self.above(&[types::ELEMENT_CODE_LINE.to_string()]).is_some() {
            return false;
        }

        let rules = self.rules.clone();
        for rule in rules.autoformat.iter().filter(|rule| rule.trigger == trigger) {
            let fired = match rule.mode {
                AutoformatMode::Block => self.apply_block_rule(rule),
                AutoformatMode::Inline => self.apply_inline_rule(rule),
            };
            if fired {
                log::debug!("Autoformat fired for {}", rule.target);
                return true;
            }
        }
        false
    }

    fn apply_block_rule(&mut self, rule: &AutoformatRule) -> bool {
        let FormatTarget::Element(kind) = &rule.target else {
            return false;
        };
        let Some(block) = self.block_path() else {
            return false;
        };
        let before = self.text_before_cursor();

        let markup = if rule.trigger_at_block_start {
            let first_leaf = self.focus().path[block.len()..].iter().all(|&index| index == 0);
            if !first_leaf {
                return false;
            }
            rule.markup.iter().find(|markup| before == **markup)
        } else {
            rule.markup.iter().find(|markup| before.ends_with(markup.as_str()))
        };
        let Some(markup) = markup else {
            return false;
        };

        self.delete_before_cursor(markup.chars().count());
        if let Some(pre_format) = rule.pre_format {
            pre_format(self);
        }
        match rule.format {
            Some(format) => format(self),
            None => {
                self.set_block_type(kind);
            }
        }
        true
    }

    fn apply_inline_rule(&mut self, rule: &AutoformatRule) -> bool {
        let FormatTarget::Mark(mark) = rule.target else {
            return false;
        };
        rule.markup
            .iter()
            .any(|delimiter| self.wrap_delimited(delimiter, mark))
    }

    /// Mark the text between an opening `delimiter` and the caret, where the
    /// caret closes the delimiter with the character being typed
    fn wrap_delimited(&mut self, delimiter: &str, mark: Mark) -> bool {
        let Some(leaf) = self.leaf() else {
            return false;
        };
        let before = self.text_before_cursor();
        let after: String = leaf.text.chars().skip(self.focus().offset).collect();

        let mut closing = delimiter.chars();
        closing.next_back();
        let Some(search) = before.strip_suffix(closing.as_str()) else {
            return false;
        };
        let Some(open) = search.rfind(delimiter) else {
            return false;
        };
        let pre = &search[..open];
        let content = &search[open + delimiter.len()..];

        let bounded = |c: Option<char>| c.is_some_and(|c| !c.is_whitespace());
        if !bounded(content.chars().next()) || !bounded(content.chars().last()) {
            return false;
        }
        if pre.chars().last().is_some_and(|c| !c.is_whitespace()) {
            return false;
        }

        let mut replacement: Vec<Node> = Vec::new();
        if !pre.is_empty() {
            replacement.push(leaf.with_text(pre).into());
        }
        let mut marked = leaf.with_text(content);
        marked.marks.insert(mark);
        replacement.push(marked.into());
        replacement.push(leaf.with_text(after).into());

        let path = self.focus().path.clone();
        let Some((&index, parent)) = path.split_last() else {
            return false;
        };
        let caret_index = index + replacement.len() - 1;
        let Some(siblings) = siblings_mut(&mut self.document.nodes, &path) else {
            return false;
        };
        siblings.splice(index..=index, replacement);

        let mut caret = parent.to_vec();
        caret.push(caret_index);
        self.set_caret(caret, 0);
        true
    }
}
