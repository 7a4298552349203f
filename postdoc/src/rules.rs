//! Editing rule tables
//!
//! Immutable configuration built once per process: autoformat rules applied
//! as the user types, block reset rules, soft and exit break rules, and the
//! hotkeys of the editor commands. Hotkey strings are parsed here, so a bad
//! table fails at construction rather than on the first key press.

use crate::document::types::{self, KEYS_HEADING};
use crate::document::Mark;
use crate::editor::Editor;
use crate::hotkey::{Hotkey, HotkeyError};
use std::fmt;

/// Hook run against the editor when a rule fires
pub type EditorHook = fn(&mut Editor);

/// Predicate over the editor state
pub type EditorPredicate = fn(&Editor) -> bool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoformatMode {
    /// Markup typed at the start of a block changes the block
    Block,
    /// Text between two copies of the markup gets a mark
    Inline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatTarget {
    Element(String),
    Mark(Mark),
}

impl fmt::Display for FormatTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatTarget::Element(kind) => write!(f, "element '{}'", kind),
            FormatTarget::Mark(mark) => write!(f, "mark '{}'", mark),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AutoformatRule {
    pub mode: AutoformatMode,
    /// Alternative markups; inline rules use the markup as both delimiters
    pub markup: Vec<String>,
    pub target: FormatTarget,
    /// Character whose input fires the rule
    pub trigger: char,
    /// Block rules: the markup must be everything between block start and cursor
    pub trigger_at_block_start: bool,
    /// Runs after the markup is removed, before formatting
    pub pre_format: Option<EditorHook>,
    /// Replaces the default formatting (setting the block type)
    pub format: Option<EditorHook>,
}

impl AutoformatRule {
    /// Block rule fired by a space after `markup` at block start
    pub fn block(markup: &[&str], kind: &str) -> Self {
        Self {
            mode: AutoformatMode::Block,
            markup: markup.iter().map(|m| m.to_string()).collect(),
            target: FormatTarget::Element(kind.to_string()),
            trigger: ' ',
            trigger_at_block_start: true,
            pre_format: None,
            format: None,
        }
    }

    /// Inline rule for text between two copies of `delimiter`
    ///
    /// Fires on the last character of the closing delimiter.
    pub fn inline(delimiter: &str, mark: Mark) -> Self {
        Self {
            mode: AutoformatMode::Inline,
            markup: vec![delimiter.to_string()],
            target: FormatTarget::Mark(mark),
            trigger: delimiter.chars().last().unwrap_or(' '),
            trigger_at_block_start: false,
            pre_format: None,
            format: None,
        }
    }

    fn trigger(mut self, trigger: char, at_block_start: bool) -> Self {
        self.trigger = trigger;
        self.trigger_at_block_start = at_block_start;
        self
    }

    fn pre_format(mut self, hook: EditorHook) -> Self {
        self.pre_format = Some(hook);
        self
    }

    fn format(mut self, hook: EditorHook) -> Self {
        self.format = Some(hook);
        self
    }
}

/// Turns a block back into the default type
#[derive(Debug, Clone)]
pub struct ResetRule {
    pub types: Vec<String>,
    pub default_type: String,
    pub hotkey: Hotkey,
    pub predicate: EditorPredicate,
}

/// Which blocks a break rule applies to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreakQuery {
    /// Applies only inside one of these types (any ancestor); empty means everywhere
    pub allow: Vec<String>,
    /// Applies when the cursor is at block start
    pub start: bool,
    /// Applies when the cursor is at block end
    pub end: bool,
}

#[derive(Debug, Clone)]
pub struct BreakRule {
    pub hotkey: Hotkey,
    pub query: BreakQuery,
    /// Exit breaks: insert the new block before the current one
    pub before: bool,
}

/// Hotkeys of the editor commands
#[derive(Debug, Clone)]
pub struct CommandKeys {
    pub link: Hotkey,
    pub tweet: Hotkey,
    pub cta: Hotkey,
}

/// Every rule table an editor runs with
#[derive(Debug, Clone)]
pub struct Rules {
    pub autoformat: Vec<AutoformatRule>,
    pub reset: Vec<ResetRule>,
    pub soft_break: Vec<BreakRule>,
    pub exit_break: Vec<BreakRule>,
    pub marks: Vec<(Hotkey, Mark)>,
    pub commands: CommandKeys,
}

fn unwrap_list(editor: &mut Editor) {
    editor.unwrap_list();
}

fn toggle_bulleted_list(editor: &mut Editor) {
    editor.toggle_list(types::ELEMENT_UL);
}

fn toggle_numbered_list(editor: &mut Editor) {
    editor.toggle_list(types::ELEMENT_OL);
}

fn insert_code_block(editor: &mut Editor) {
    editor.insert_code_block();
}

fn break_rule(hotkey: &str, query: BreakQuery, before: bool) -> Result<BreakRule, HotkeyError> {
    Ok(BreakRule {
        hotkey: Hotkey::parse(hotkey)?,
        query,
        before,
    })
}

fn allow(kinds: &[&str]) -> Vec<String> {
    kinds.iter().map(|k| k.to_string()).collect()
}

impl Rules {
    /// The tables the post and snippet editors use
    pub fn standard() -> Result<Self, HotkeyError> {
        Ok(Self {
            autoformat: standard_autoformat(),
            reset: standard_reset()?,
            soft_break: vec![
                break_rule("shift+enter", BreakQuery::default(), false)?,
                break_rule(
                    "enter",
                    BreakQuery {
                        allow: allow(&[
                            types::ELEMENT_CODE_BLOCK,
                            types::ELEMENT_BLOCKQUOTE,
                            types::ELEMENT_TD,
                        ]),
                        ..BreakQuery::default()
                    },
                    false,
                )?,
            ],
            exit_break: vec![
                break_rule("mod+enter", BreakQuery::default(), false)?,
                break_rule("mod+shift+enter", BreakQuery::default(), true)?,
                break_rule(
                    "enter",
                    BreakQuery {
                        allow: allow(&KEYS_HEADING),
                        start: true,
                        end: true,
                    },
                    false,
                )?,
            ],
            marks: vec![
                (Hotkey::parse("mod+b")?, Mark::Bold),
                (Hotkey::parse("mod+i")?, Mark::Italic),
                (Hotkey::parse("mod+u")?, Mark::Underline),
                (Hotkey::parse("mod+e")?, Mark::Code),
                (Hotkey::parse("mod+shift+x")?, Mark::Strikethrough),
                (Hotkey::parse("mod+,")?, Mark::Subscript),
                (Hotkey::parse("mod+.")?, Mark::Superscript),
            ],
            commands: CommandKeys {
                link: Hotkey::parse("mod+k")?,
                tweet: Hotkey::parse("mod+shift+k")?,
                cta: Hotkey::parse("mod+shift+c")?,
            },
        })
    }
}

fn standard_autoformat() -> Vec<AutoformatRule> {
    let mut rules: Vec<AutoformatRule> = KEYS_HEADING
        .iter()
        .enumerate()
        .map(|(level, kind)| {
            let markup = "#".repeat(level + 1);
            AutoformatRule::block(&[markup.as_str()], kind).pre_format(unwrap_list)
        })
        .collect();

    rules.extend([
        AutoformatRule::block(&["*", "-"], types::ELEMENT_LI)
            .pre_format(unwrap_list)
            .format(toggle_bulleted_list),
        AutoformatRule::block(&["1.", "1)"], types::ELEMENT_LI)
            .pre_format(unwrap_list)
            .format(toggle_numbered_list),
        AutoformatRule::block(&["[]"], types::ELEMENT_TODO_LI),
        AutoformatRule::block(&[">"], types::ELEMENT_BLOCKQUOTE).pre_format(unwrap_list),
        AutoformatRule::inline("**", Mark::Bold),
        AutoformatRule::inline("__", Mark::Bold),
        AutoformatRule::inline("*", Mark::Italic),
        AutoformatRule::inline("_", Mark::Italic),
        AutoformatRule::inline("`", Mark::Code),
        AutoformatRule::inline("~~", Mark::Strikethrough),
        AutoformatRule::block(&["``"], types::ELEMENT_CODE_BLOCK)
            .trigger('`', false)
            .pre_format(unwrap_list)
            .format(insert_code_block),
    ]);
    rules
}

fn standard_reset() -> Result<Vec<ResetRule>, HotkeyError> {
    let reset_types = allow(&[types::ELEMENT_BLOCKQUOTE, types::ELEMENT_TODO_LI]);
    Ok(vec![
        ResetRule {
            types: reset_types.clone(),
            default_type: types::ELEMENT_PARAGRAPH.to_string(),
            hotkey: Hotkey::parse("enter")?,
            predicate: Editor::is_block_above_empty,
        },
        ResetRule {
            types: reset_types,
            default_type: types::ELEMENT_PARAGRAPH.to_string(),
            hotkey: Hotkey::parse("backspace")?,
            predicate: Editor::is_selection_at_block_start,
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_rules_parse() {
        let rules = Rules::standard().unwrap();
        assert_eq!(rules.reset.len(), 2);
        assert_eq!(rules.soft_break.len(), 2);
        assert_eq!(rules.exit_break.len(), 3);
        assert!(rules.exit_break[1].before);
    }

    #[test]
    fn test_heading_markup_levels() {
        let rules = standard_autoformat();
        let h2 = rules
            .iter()
            .find(|rule| rule.target == FormatTarget::Element("h2".to_string()))
            .unwrap();
        assert_eq!(h2.markup, vec!["##".to_string()]);
        assert_eq!(h2.trigger, ' ');
    }

    #[test]
    fn test_inline_trigger_is_last_delimiter_char() {
        let rule = AutoformatRule::inline("~~", Mark::Strikethrough);
        assert_eq!(rule.trigger, '~');
        assert_eq!(rule.mode, AutoformatMode::Inline);
    }

    #[test]
    fn test_block_rules_precede_code_block_rule() {
        let rules = standard_autoformat();
        let last = rules.last().unwrap();
        assert_eq!(last.target, FormatTarget::Element("code_block".to_string()));
        assert!(!last.trigger_at_block_start);
        assert_eq!(last.trigger, '`');
    }
}
