//! Key press dispatch

use super::{normalize_url, tweet_id_from_url, Editor, Prompt};
use crate::document::types;
use crate::hotkey::{Key, KeyEvent};
use crate::rules::BreakQuery;

impl Editor {
    fn break_applies(&self, query: &BreakQuery) -> bool {
        if !query.allow.is_empty() && self.above(&query.allow).is_none() {
            return false;
        }
        if query.start || query.end {
            return (query.start && self.is_selection_at_block_start())
                || (query.end && self.is_selection_at_block_end());
        }
        true
    }

    /// Handle a key press
    ///
    /// Reset rules go first, then soft breaks, exit breaks, the editor
    /// commands, mark hotkeys and finally the default Enter and Backspace.
    /// Returns `false` when the key was left for the host to handle.
    pub fn key_down(&mut self, event: &KeyEvent, prompt: &mut dyn Prompt) -> bool {
        let rules = self.rules.clone();

        for rule in rules.reset.iter().filter(|rule| rule.hotkey.matches(event)) {
            let Some(path) = self.above(&rule.types) else {
                continue;
            };
            if !(rule.predicate)(self) {
                continue;
            }
            if let Some(block) = self.element_mut(&path) {
                block.kind = Some(rule.default_type.clone());
                block.attributes.remove("checked");
            }
            log::debug!("Reset block {:?} to '{}'", path, rule.default_type);
            return true;
        }

        if rules
            .soft_break
            .iter()
            .any(|rule| rule.hotkey.matches(event) && self.break_applies(&rule.query))
        {
            self.insert_soft_break();
            return true;
        }

        if let Some(rule) = rules
            .exit_break
            .iter()
            .find(|rule| rule.hotkey.matches(event) && self.break_applies(&rule.query))
        {
            let before = rule.before
                || (rule.query.start
                    && self.is_selection_at_block_start()
                    && !self.is_selection_at_block_end());
            self.exit_break(before);
            return true;
        }

        if rules.commands.link.matches(event) {
            if self.above(&[types::ELEMENT_LINK.to_string()]).is_some() {
                self.unwrap_link();
            } else if !self.selection.is_collapsed() {
                if let Some(url) = prompt
                    .prompt("Enter the URL of the link:")
                    .and_then(|input| normalize_url(&input))
                {
                    self.insert_link(&url);
                }
            }
            return true;
        }

        if rules.commands.tweet.matches(event) {
            let Some(input) = prompt.prompt("Enter the Tweet URL") else {
                return true;
            };
            match normalize_url(&input).and_then(|url| tweet_id_from_url(&url)) {
                Some(tweet_id) => self.insert_tweet(&tweet_id),
                None => prompt.alert("Invalid Twitter url"),
            }
            return true;
        }

        if rules.commands.cta.matches(event) && self.insert_cta() {
            return true;
        }

        if let Some((_, mark)) = rules.marks.iter().find(|(hotkey, _)| hotkey.matches(event)) {
            self.toggle_mark(*mark);
            return true;
        }

        if event.modifiers.is_empty() {
            match event.key {
                Key::Enter => {
                    self.insert_break();
                    return true;
                }
                Key::Backspace => {
                    self.delete_backward();
                    return true;
                }
                _ => {}
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{editor, type_text};
    use super::*;
    use crate::document::{ElementNode, Mark, Node, Point, Selection};
    use crate::editor_config::SessionConfig;
    use crate::hotkey::Modifiers;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct ScriptedPrompt {
        answers: VecDeque<Option<String>>,
        alerts: Vec<String>,
    }

    impl ScriptedPrompt {
        fn answering(answer: &str) -> Self {
            Self {
                answers: VecDeque::from([Some(answer.to_string())]),
                alerts: Vec::new(),
            }
        }
    }

    impl Prompt for ScriptedPrompt {
        fn prompt(&mut self, _message: &str) -> Option<String> {
            self.answers.pop_front().flatten()
        }

        fn alert(&mut self, message: &str) {
            self.alerts.push(message.to_string());
        }
    }

    fn enter() -> KeyEvent {
        KeyEvent::plain(Key::Enter)
    }

    fn cmd(c: char) -> KeyEvent {
        KeyEvent::new(Key::Char(c), Modifiers::cmd())
    }

    fn cmd_shift(c: char) -> KeyEvent {
        KeyEvent::new(Key::Char(c), Modifiers::cmd() | Modifiers::SHIFT)
    }

    #[test]
    fn test_enter_resets_empty_blockquote() {
        let mut editor = editor(vec![Node::element("blockquote", vec![Node::text("")])]);

        assert!(editor.key_down(&enter(), &mut ScriptedPrompt::default()));

        assert!(editor.nodes()[0].is_type("p"));
        assert_eq!(editor.nodes().len(), 1);
    }

    #[test]
    fn test_backspace_resets_action_item_at_start() {
        let item = ElementNode::new("action_item", vec![Node::text("todo")]).with_attr("checked", true);
        let mut editor = editor(vec![item.into()]);

        editor.key_down(&KeyEvent::plain(Key::Backspace), &mut ScriptedPrompt::default());

        let block = editor.nodes()[0].as_element().unwrap();
        assert!(block.is_type("p"));
        assert!(!block.attributes.contains_key("checked"));
        assert_eq!(editor.nodes()[0].text_content(), "todo");
    }

    #[test]
    fn test_enter_in_code_block_is_soft() {
        let mut editor = editor(vec![Node::element(
            "code_block",
            vec![Node::element("code_line", vec![Node::text("a")])],
        )]);
        editor.select(vec![0, 0, 0], 1).unwrap();

        editor.key_down(&enter(), &mut ScriptedPrompt::default());

        assert_eq!(editor.nodes().len(), 1);
        assert_eq!(editor.leaf().unwrap().text, "a\n");
    }

    #[test]
    fn test_shift_enter_inserts_line_break() {
        let mut editor = editor(vec![Node::element("p", vec![Node::text("ab")])]);
        editor.select(vec![0, 0], 1).unwrap();

        editor.key_down(&KeyEvent::new(Key::Enter, Modifiers::SHIFT), &mut ScriptedPrompt::default());

        assert_eq!(editor.leaf().unwrap().text, "a\nb");
    }

    #[test]
    fn test_enter_at_heading_edges_exits() {
        let mut editor = editor(vec![Node::element("h1", vec![Node::text("Title")])]);
        editor.select(vec![0, 0], 5).unwrap();

        editor.key_down(&enter(), &mut ScriptedPrompt::default());
        assert!(editor.nodes()[0].is_type("h1"));
        assert!(editor.nodes()[1].is_type("p"));
        assert_eq!(editor.selection().focus, Point::new(vec![1, 0], 0));

        editor.select(vec![0, 0], 0).unwrap();
        editor.key_down(&enter(), &mut ScriptedPrompt::default());
        assert!(editor.nodes()[0].is_type("p"));
        assert!(editor.nodes()[1].is_type("h1"));
    }

    #[test]
    fn test_link_command_prompts_and_wraps() {
        let mut editor = editor(vec![Node::element("p", vec![Node::text("read docs")])]);
        editor
            .set_selection(Selection {
                anchor: Point::new(vec![0, 0], 5),
                focus: Point::new(vec![0, 0], 9),
            })
            .unwrap();

        editor.key_down(&cmd('k'), &mut ScriptedPrompt::answering("docs.rs"));

        let link = editor.nodes()[0].as_element().unwrap().children[1].as_element().unwrap();
        assert_eq!(link.attr_str("url"), Some("http://docs.rs"));

        editor.key_down(&cmd('k'), &mut ScriptedPrompt::default());
        assert_eq!(editor.nodes()[0].as_element().unwrap().children.len(), 2);
    }

    #[test]
    fn test_link_command_rejects_unparseable_url() {
        let mut editor = editor(vec![Node::element("p", vec![Node::text("read docs")])]);
        editor
            .set_selection(Selection {
                anchor: Point::new(vec![0, 0], 5),
                focus: Point::new(vec![0, 0], 9),
            })
            .unwrap();

        editor.key_down(&cmd('k'), &mut ScriptedPrompt::answering("exa mple.com"));

        assert_eq!(
            editor.nodes(),
            &[Node::element("p", vec![Node::text("read docs")])]
        );
    }

    #[test]
    fn test_tweet_command() {
        let mut editor = editor(vec![Node::element("p", vec![Node::text("")])]);
        let mut prompt = ScriptedPrompt::answering("twitter.com/jack/status/20");

        editor.key_down(&cmd_shift('k'), &mut prompt);

        assert_eq!(editor.nodes()[0].as_element().unwrap().attr_str("tweetId"), Some("20"));
        assert!(prompt.alerts.is_empty());

        let mut prompt = ScriptedPrompt::answering("twitter.com/jack");
        editor.key_down(&cmd_shift('k'), &mut prompt);
        assert_eq!(prompt.alerts, vec!["Invalid Twitter url".to_string()]);
    }

    #[test]
    fn test_cta_hotkey_needs_post() {
        let mut editor = editor(vec![Node::element("p", vec![Node::text("")])]);
        assert!(!editor.key_down(&cmd_shift('c'), &mut ScriptedPrompt::default()));

        let mut editor = editor.with_session(SessionConfig {
            is_post: true,
            ..SessionConfig::default()
        });
        assert!(editor.key_down(&cmd_shift('c'), &mut ScriptedPrompt::default()));
        assert!(editor.nodes()[0].is_type("cta"));
    }

    #[test]
    fn test_mark_hotkey_toggles() {
        let mut editor = editor(vec![Node::element("p", vec![Node::text("word")])]);
        editor
            .set_selection(Selection {
                anchor: Point::new(vec![0, 0], 0),
                focus: Point::new(vec![0, 0], 4),
            })
            .unwrap();

        editor.key_down(&cmd('b'), &mut ScriptedPrompt::default());

        assert!(editor.leaf().unwrap().has_mark(Mark::Bold));
    }

    #[test]
    fn test_typing_then_enter_splits() {
        let mut editor = editor(vec![Node::element("p", vec![Node::text("")])]);
        type_text(&mut editor, "one");
        editor.key_down(&enter(), &mut ScriptedPrompt::default());
        type_text(&mut editor, "two");

        assert_eq!(editor.nodes().len(), 2);
        assert_eq!(editor.nodes()[1].text_content(), "two");
    }
}
