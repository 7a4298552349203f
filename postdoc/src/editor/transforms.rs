//! Structural edits: block types, lists, breaks, marks and links

use super::{first_leaf_path, last_leaf_path, shared_parent, Editor};
use crate::document::{byte_index, node_at, siblings_mut, types, ElementNode, Mark, Node, Point, Selection};
use serde_json::Value;
use std::ops::Range;

/// `path` moved from under `old` to under `new`, if it was under `old`
fn rebase(path: &[usize], old: &[usize], new: &[usize]) -> Option<Vec<usize>> {
    path.starts_with(old).then(|| {
        let mut moved = new.to_vec();
        moved.extend_from_slice(&path[old.len()..]);
        moved
    })
}

/// Split a node along `rel` (child indices down to a leaf) at a character offset
fn split_node(node: &Node, rel: &[usize], offset: usize) -> (Node, Node) {
    match node {
        Node::Text(leaf) => {
            let at = byte_index(&leaf.text, offset);
            (
                leaf.with_text(&leaf.text[..at]).into(),
                leaf.with_text(&leaf.text[at..]).into(),
            )
        }
        Node::Element(element) => {
            let shell = |children: Vec<Node>| ElementNode {
                kind: element.kind.clone(),
                children,
                attributes: element.attributes.clone(),
            };
            let Some((&index, rest)) = rel.split_first() else {
                return (node.clone(), shell(vec![Node::text("")]).into());
            };
            let Some(child) = element.children.get(index) else {
                return (node.clone(), shell(vec![Node::text("")]).into());
            };

            let (left, right) = split_node(child, rest, offset);
            let mut left_children = element.children[..index].to_vec();
            left_children.push(left);
            let mut right_children = vec![right];
            right_children.extend_from_slice(&element.children[index + 1..]);
            (shell(left_children).into(), shell(right_children).into())
        }
    }
}

/// Give every element below and including `node` a new id
fn reassign_ids(node: &mut Node, next: &mut u64) {
    if let Node::Element(element) = node {
        if element.attributes.contains_key("id") {
            element.attributes.insert("id".to_string(), Value::from(*next));
            *next += 1;
        }
        for child in &mut element.children {
            reassign_ids(child, next);
        }
    }
}

impl Editor {
    fn remap_selection(&mut self, old: &[usize], new: &[usize]) {
        for point in [&mut self.selection.anchor, &mut self.selection.focus] {
            if let Some(path) = rebase(&point.path, old, new) {
                point.path = path;
            }
        }
    }

    /// Path of the list item directly holding `block`, when it sits in a list
    fn list_item_of(&self, block: &[usize]) -> Option<Vec<usize>> {
        let li = block.split_last()?.1;
        let list = li.split_last()?.1;
        let in_list = self.element(li).is_some_and(|e| e.is_type(types::ELEMENT_LI))
            && self.element(list).is_some_and(|e| types::is_list(e.kind()));
        in_list.then(|| li.to_vec())
    }

    /// Change the type of the lowest block above the caret
    pub fn set_block_type(&mut self, kind: &str) -> bool {
        let Some(path) = self.block_path() else {
            return false;
        };
        let Some(block) = self.element_mut(&path) else {
            return false;
        };
        block.kind = Some(kind.to_string());
        if kind != types::ELEMENT_TODO_LI {
            block.attributes.remove("checked");
        }
        true
    }

    /// Wrap the current block in a list, switch the list type, or unwrap it
    pub fn toggle_list(&mut self, list_kind: &str) -> bool {
        let Some(block) = self.block_path() else {
            return false;
        };

        if let Some(li) = self.list_item_of(&block) {
            let list = li[..li.len() - 1].to_vec();
            if self.element(&list).is_some_and(|e| e.is_type(list_kind)) {
                return self.unwrap_list();
            }
            if let Some(list) = self.element_mut(&list) {
                list.kind = Some(list_kind.to_string());
            }
            return true;
        }

        let li_id = self.fresh_id();
        let Some((&index, _)) = block.split_last() else {
            return false;
        };
        let Some(siblings) = siblings_mut(&mut self.document.nodes, &block) else {
            return false;
        };
        let Some(Node::Element(content)) = siblings.get_mut(index) else {
            return false;
        };
        content.kind = Some(types::ELEMENT_PARAGRAPH.to_string());
        content.attributes.remove("checked");

        let content = std::mem::replace(&mut siblings[index], Node::text(""));
        let li = ElementNode::new(types::ELEMENT_LI, vec![content]).with_attr("id", li_id);
        siblings[index] = ElementNode::new(list_kind, vec![li.into()])
            .with_attr("id", li_id + 1)
            .into();

        let mut inner = block.clone();
        inner.extend([0, 0]);
        self.remap_selection(&block, &inner);
        log::debug!("Wrapped block {:?} in {}", block, list_kind);
        true
    }

    /// Lift the caret's block out of every enclosing list
    pub fn unwrap_list(&mut self) -> bool {
        let mut changed = false;
        while let Some(li) = self.block_path().and_then(|block| self.list_item_of(&block)) {
            self.lift_list_item(&li);
            changed = true;
        }
        changed
    }

    /// Replace a list item by its children, splitting the list around it
    pub(crate) fn lift_list_item(&mut self, li_path: &[usize]) {
        let Some((&li_index, list_path)) = li_path.split_last() else {
            return;
        };
        let Some((&list_index, parent_path)) = list_path.split_last() else {
            return;
        };
        let after_id = self.fresh_id();
        let Some(siblings) = siblings_mut(&mut self.document.nodes, list_path) else {
            return;
        };
        let Some(list) = siblings.get_mut(list_index).and_then(Node::as_element_mut) else {
            return;
        };
        if li_index >= list.children.len() {
            return;
        }

        let mut before = std::mem::take(&mut list.children);
        let after = before.split_off(li_index + 1);
        let lifted = match before.pop() {
            Some(Node::Element(item)) => item.children,
            Some(leaf) => vec![leaf],
            None => Vec::new(),
        };
        let shell = |children: Vec<Node>| ElementNode {
            kind: list.kind.clone(),
            children,
            attributes: list.attributes.clone(),
        };

        let mut replacement: Vec<Node> = Vec::new();
        if !before.is_empty() {
            replacement.push(shell(before).into());
        }
        let lifted_start = list_index + replacement.len();
        replacement.extend(lifted);
        if !after.is_empty() {
            let mut rest = shell(after);
            if rest.attributes.contains_key("id") {
                rest.attributes.insert("id".to_string(), Value::from(after_id));
            }
            replacement.push(rest.into());
        }
        siblings.splice(list_index..=list_index, replacement);

        for point in [&mut self.selection.anchor, &mut self.selection.focus] {
            if point.path.starts_with(li_path) && point.path.len() > li_path.len() {
                let mut path = parent_path.to_vec();
                path.push(lifted_start + point.path[li_path.len()]);
                path.extend_from_slice(&point.path[li_path.len() + 1..]);
                point.path = path;
            }
        }
    }

    /// Turn the current block into the first line of a new code block
    pub fn insert_code_block(&mut self) -> bool {
        let Some(block) = self.block_path() else {
            return false;
        };
        let id = self.fresh_id();
        let Some((&index, _)) = block.split_last() else {
            return false;
        };
        let Some(siblings) = siblings_mut(&mut self.document.nodes, &block) else {
            return false;
        };
        let Some(Node::Element(line)) = siblings.get_mut(index) else {
            return false;
        };
        line.kind = Some(types::ELEMENT_CODE_LINE.to_string());
        line.attributes.remove("checked");

        let line = std::mem::replace(&mut siblings[index], Node::text(""));
        siblings[index] = ElementNode::new(types::ELEMENT_CODE_BLOCK, vec![line])
            .with_attr("id", id)
            .into();

        let mut inner = block.clone();
        inner.push(0);
        self.remap_selection(&block, &inner);
        true
    }

    /// Split the node at `target` at the caret; the caret moves to the new half
    fn split_at(&mut self, target: &[usize]) {
        let focus = self.focus().clone();
        let Some(rel) = focus.path.get(target.len()..) else {
            return;
        };
        let Some(node) = node_at(&self.document.nodes, target) else {
            return;
        };
        let (left, mut right) = split_node(node, rel, focus.offset);
        if let Node::Element(element) = &mut right {
            element.attributes.remove("checked");
        }
        let mut next = self.fresh_id();
        reassign_ids(&mut right, &mut next);

        let Some((&index, _)) = target.split_last() else {
            return;
        };
        let Some(siblings) = siblings_mut(&mut self.document.nodes, target) else {
            return;
        };
        siblings.splice(index..=index, [left, right]);

        let mut path = target.to_vec();
        if let Some(last) = path.last_mut() {
            *last += 1;
        }
        path.extend(std::iter::repeat(0).take(rel.len()));
        self.set_caret(path, 0);
    }

    /// Default Enter: split the block (or list item) at the caret
    ///
    /// Enter in an empty list item lifts it out of the list; Enter on a void
    /// element opens a paragraph after it.
    pub fn insert_break(&mut self) {
        if !self.selection.is_collapsed() {
            self.delete_selection();
        }
        if self.in_void() {
            self.exit_break(false);
            return;
        }
        let Some(block) = self.block_path() else {
            return;
        };

        if let Some(li) = self.list_item_of(&block) {
            if self.is_block_above_empty() {
                self.lift_list_item(&li);
            } else {
                self.split_at(&li);
            }
            return;
        }

        self.split_at(&block);
    }

    /// Insert a line break inside the current block
    pub fn insert_soft_break(&mut self) {
        if !self.in_void() {
            self.insert_at_cursor("\n");
        }
    }

    /// Open an empty paragraph after (or before) the caret's top-level block
    pub fn exit_break(&mut self, before: bool) {
        let Some(&top) = self.focus().path.first() else {
            return;
        };
        let paragraph = self.new_element(types::ELEMENT_PARAGRAPH, vec![Node::text("")]);
        let index = if before { top } else { top + 1 };
        self.document.nodes.insert(index, paragraph.into());
        self.set_caret(vec![index, 0], 0);
    }

    /// Default Backspace
    ///
    /// Deletes the character before the caret. At the start of a block the
    /// block leaves its list, or merges into the previous block; a void
    /// element under the caret or just before it is removed.
    pub fn delete_backward(&mut self) {
        if !self.selection.is_collapsed() {
            self.delete_selection();
            return;
        }
        if self.in_void() {
            self.remove_top_level_block();
            return;
        }
        if self.focus().offset > 0 {
            self.delete_before_cursor(1);
            return;
        }

        let Some(block) = self.block_path() else {
            return;
        };
        if let Some(previous) = self.previous_leaf_in(&block) {
            let length = node_at(&self.document.nodes, &previous)
                .and_then(Node::as_text)
                .map_or(0, |leaf| leaf.text.chars().count());
            self.set_caret(previous, length);
            if length > 0 {
                self.delete_before_cursor(1);
            }
            return;
        }
        if let Some(li) = self.list_item_of(&block) {
            self.lift_list_item(&li);
            return;
        }
        self.merge_with_previous(&block);
    }

    fn previous_leaf_in(&self, block: &[usize]) -> Option<Vec<usize>> {
        fn collect(nodes: &[Node], path: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
            for (index, node) in nodes.iter().enumerate() {
                path.push(index);
                match node {
                    Node::Text(_) => out.push(path.clone()),
                    Node::Element(element) => collect(&element.children, path, out),
                }
                path.pop();
            }
        }

        let mut leaves = Vec::new();
        let mut path = block.to_vec();
        collect(&self.element(block)?.children, &mut path, &mut leaves);
        let position = leaves.iter().position(|leaf| *leaf == self.focus().path)?;
        position.checked_sub(1).map(|previous| leaves[previous].clone())
    }

    fn remove_top_level_block(&mut self) {
        let Some(&top) = self.focus().path.first() else {
            return;
        };
        self.document.nodes.remove(top);
        if self.document.nodes.is_empty() {
            let paragraph = self.new_element(types::ELEMENT_PARAGRAPH, vec![Node::text("")]);
            self.document.nodes.push(paragraph.into());
        }

        let target = top.saturating_sub(1).min(self.document.nodes.len() - 1);
        let caret = if top > 0 {
            last_leaf_path(&self.document.nodes, &[target]).map(|path| {
                let length = node_at(&self.document.nodes, &path)
                    .and_then(Node::as_text)
                    .map_or(0, |leaf| leaf.text.chars().count());
                (path, length)
            })
        } else {
            first_leaf_path(&self.document.nodes, &[target]).map(|path| (path, 0))
        };
        if let Some((path, offset)) = caret {
            self.set_caret(path, offset);
        }
    }

    fn merge_with_previous(&mut self, block: &[usize]) {
        let Some((&index, parent)) = block.split_last() else {
            return;
        };
        if index == 0 {
            return;
        }
        let mut previous = parent.to_vec();
        previous.push(index - 1);

        let previous_is_void = self
            .element(&previous)
            .is_some_and(|element| self.registry.is_void(element.kind()));
        if previous_is_void {
            if let Some(siblings) = siblings_mut(&mut self.document.nodes, &previous) {
                siblings.remove(index - 1);
            }
            self.remap_selection(block, &previous);
            return;
        }

        let Some(target_leaf) = last_leaf_path(&self.document.nodes, &previous) else {
            return;
        };
        let Some((_, target_block)) = target_leaf.split_last() else {
            return;
        };
        let target_block = target_block.to_vec();
        let offset = node_at(&self.document.nodes, &target_leaf)
            .and_then(Node::as_text)
            .map_or(0, |leaf| leaf.text.chars().count());

        let Some(siblings) = siblings_mut(&mut self.document.nodes, block) else {
            return;
        };
        let removed = siblings.remove(index);
        let children = match removed {
            Node::Element(element) => element.children,
            leaf => vec![leaf],
        };
        if let Some(target) = self.element_mut(&target_block) {
            target.children.extend(children);
        }
        self.set_caret(target_leaf, offset);
    }

    /// Split the leaves at both selection ends so the selection covers whole
    /// leaves of one parent; returns the parent and the covered child range
    fn split_selected_leaves(&mut self) -> Option<(Vec<usize>, Range<usize>)> {
        let (start, end) = self.selection.ordered();
        let (start, end) = (start.clone(), end.clone());
        let (parent, first, last) = if start.path == end.path {
            let (&index, parent) = start.path.split_last()?;
            (parent.to_vec(), index, index)
        } else {
            shared_parent(&start.path, &end.path)?
        };

        let element = self.element_mut(&parent)?;
        let split = |node: &Node, offset: usize| -> Option<(Node, Node)> {
            let leaf = node.as_text()?;
            let at = byte_index(&leaf.text, offset);
            Some((
                leaf.with_text(&leaf.text[..at]).into(),
                leaf.with_text(&leaf.text[at..]).into(),
            ))
        };

        let (left, right) = split(element.children.get(last)?, end.offset)?;
        element.children[last] = left;
        if right.as_text().is_some_and(|leaf| !leaf.text.is_empty()) {
            element.children.insert(last + 1, right);
        }

        let (mut first, mut last) = (first, last);
        if start.offset > 0 {
            let (left, right) = split(element.children.get(first)?, start.offset)?;
            element.children[first] = left;
            element.children.insert(first + 1, right);
            first += 1;
            last += 1;
        }

        Some((parent, first..last + 1))
    }

    fn select_children(&mut self, parent: &[usize], range: Range<usize>) {
        let mut anchor = parent.to_vec();
        anchor.push(range.start);
        let mut focus = parent.to_vec();
        focus.push(range.end - 1);
        let focus = last_leaf_path(&self.document.nodes, &focus).unwrap_or(focus);
        let length = node_at(&self.document.nodes, &focus)
            .and_then(Node::as_text)
            .map_or(0, |leaf| leaf.text.chars().count());
        let anchor = first_leaf_path(&self.document.nodes, &anchor).unwrap_or(anchor);
        self.selection = Selection {
            anchor: Point::new(anchor, 0),
            focus: Point::new(focus, length),
        };
    }

    /// Toggle a mark over the selected text
    ///
    /// Added unless every selected leaf already has it. A collapsed selection
    /// is left alone.
    pub fn toggle_mark(&mut self, mark: Mark) -> bool {
        if self.selection.is_collapsed() {
            return false;
        }
        let Some((parent, range)) = self.split_selected_leaves() else {
            log::debug!("Mark toggle needs a selection within one parent");
            return false;
        };
        let Some(element) = self.element_mut(&parent) else {
            return false;
        };

        let leaves = || element.children[range.clone()].iter().filter_map(Node::as_text);
        let remove = leaves().all(|leaf| leaf.has_mark(mark));
        for child in &mut element.children[range.clone()] {
            if let Some(leaf) = child.as_text_mut() {
                if remove {
                    leaf.marks.remove(&mark);
                } else {
                    leaf.marks.insert(mark);
                }
            }
        }
        self.select_children(&parent, range);
        true
    }

    /// Wrap the selected text in a link
    pub fn insert_link(&mut self, url: &str) -> bool {
        if self.selection.is_collapsed() {
            return false;
        }
        let Some((parent, range)) = self.split_selected_leaves() else {
            return false;
        };
        let Some(element) = self.element_mut(&parent) else {
            return false;
        };

        let start = range.start;
        let children: Vec<Node> = element.children.drain(range).collect();
        let link = ElementNode::new(types::ELEMENT_LINK, children).with_attr("url", url);
        element.children.insert(start, link.into());
        self.select_children(&parent, start..start + 1);
        true
    }

    /// Replace the link around the caret by its contents
    pub fn unwrap_link(&mut self) -> bool {
        let Some(link) = self.above(&[types::ELEMENT_LINK.to_string()]) else {
            return false;
        };
        let Some((&index, parent)) = link.split_last() else {
            return false;
        };
        let Some(siblings) = siblings_mut(&mut self.document.nodes, &link) else {
            return false;
        };
        let children = match siblings.remove(index) {
            Node::Element(element) => element.children,
            leaf => vec![leaf],
        };
        siblings.splice(index..index, children);

        for point in [&mut self.selection.anchor, &mut self.selection.focus] {
            if point.path.starts_with(&link) && point.path.len() > link.len() {
                let mut path = parent.to_vec();
                path.push(index + point.path[link.len()]);
                path.extend_from_slice(&point.path[link.len() + 1..]);
                point.path = path;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::editor;
    use super::*;

    fn ids_removed(node: &Node) -> Node {
        match node {
            Node::Text(_) => node.clone(),
            Node::Element(element) => {
                let mut element = element.clone();
                element.attributes.remove("id");
                element.children = element.children.iter().map(ids_removed).collect();
                element.into()
            }
        }
    }

    #[test]
    fn test_toggle_list_wraps_and_unwraps() {
        let mut editor = editor(vec![Node::element("h3", vec![Node::text("item")])]);
        editor.select(vec![0, 0], 2).unwrap();

        editor.toggle_list("ul");

        assert_eq!(
            ids_removed(&editor.nodes()[0]),
            Node::element(
                "ul",
                vec![Node::element("li", vec![Node::element("p", vec![Node::text("item")])])]
            )
        );
        assert_eq!(editor.selection().focus, Point::new(vec![0, 0, 0, 0], 2));

        editor.toggle_list("ol");
        assert!(editor.nodes()[0].is_type("ol"));

        editor.toggle_list("ol");
        assert_eq!(
            ids_removed(&editor.nodes()[0]),
            Node::element("p", vec![Node::text("item")])
        );
        assert_eq!(editor.selection().focus, Point::new(vec![0, 0], 2));
    }

    #[test]
    fn test_unwrap_middle_item_splits_list() {
        let item = |text: &str| Node::element("li", vec![Node::element("p", vec![Node::text(text)])]);
        let mut editor = editor(vec![Node::element("ul", vec![item("a"), item("b"), item("c")])]);
        editor.select(vec![0, 1, 0, 0], 1).unwrap();

        assert!(editor.unwrap_list());

        let kinds: Vec<&str> = editor
            .nodes()
            .iter()
            .filter_map(Node::as_element)
            .map(ElementNode::kind)
            .collect();
        assert_eq!(kinds, vec!["ul", "p", "ul"]);
        assert_eq!(editor.selection().focus, Point::new(vec![1, 0], 1));
    }

    #[test]
    fn test_insert_break_splits_paragraph() {
        let mut editor = editor(vec![ElementNode::new("p", vec![Node::text("hello")])
            .with_attr("id", 4)
            .into()]);
        editor.select(vec![0, 0], 2).unwrap();

        editor.insert_break();

        assert_eq!(editor.nodes()[0].text_content(), "he");
        assert_eq!(editor.nodes()[1].text_content(), "llo");
        assert_eq!(
            editor.nodes()[1].as_element().unwrap().attributes.get("id"),
            Some(&Value::from(5))
        );
        assert_eq!(editor.selection().focus, Point::new(vec![1, 0], 0));
    }

    #[test]
    fn test_enter_in_empty_list_item_leaves_list() {
        let item = |text: &str| Node::element("li", vec![Node::element("p", vec![Node::text(text)])]);
        let mut editor = editor(vec![Node::element("ul", vec![item("a"), item("")])]);
        editor.select(vec![0, 1, 0, 0], 0).unwrap();

        editor.insert_break();

        assert_eq!(editor.nodes().len(), 2);
        assert!(editor.nodes()[1].is_type("p"));
        assert_eq!(editor.selection().focus.path, vec![1, 0]);
    }

    #[test]
    fn test_insert_code_block_wraps_line() {
        let mut editor = editor(vec![Node::element("p", vec![Node::text("let x;")])]);

        assert!(editor.insert_code_block());

        assert_eq!(
            ids_removed(&editor.nodes()[0]),
            Node::element(
                "code_block",
                vec![Node::element("code_line", vec![Node::text("let x;")])]
            )
        );
        assert_eq!(editor.selection().focus.path, vec![0, 0, 0]);
    }

    #[test]
    fn test_backspace_merges_into_previous_block() {
        let mut editor = editor(vec![
            Node::element("p", vec![Node::text("ab")]),
            Node::element("h2", vec![Node::text("cd")]),
        ]);
        editor.select(vec![1, 0], 0).unwrap();

        editor.delete_backward();

        assert_eq!(editor.nodes().len(), 1);
        assert_eq!(editor.nodes()[0].text_content(), "abcd");
        assert_eq!(editor.selection().focus, Point::new(vec![0, 0], 2));
    }

    #[test]
    fn test_toggle_mark_over_selection() {
        let mut editor = editor(vec![Node::element("p", vec![Node::text("one two three")])]);
        editor
            .set_selection(Selection {
                anchor: Point::new(vec![0, 0], 4),
                focus: Point::new(vec![0, 0], 7),
            })
            .unwrap();

        assert!(editor.toggle_mark(Mark::Bold));

        let children = &editor.nodes()[0].as_element().unwrap().children;
        assert_eq!(children.len(), 3);
        let bold = children[1].as_text().unwrap();
        assert_eq!(bold.text, "two");
        assert!(bold.has_mark(Mark::Bold));

        assert!(editor.toggle_mark(Mark::Bold));
        assert!(!editor.nodes()[0].as_element().unwrap().children[1]
            .as_text()
            .unwrap()
            .has_mark(Mark::Bold));
    }

    #[test]
    fn test_link_wrap_and_unwrap() {
        let mut editor = editor(vec![Node::element("p", vec![Node::text("see docs here")])]);
        editor
            .set_selection(Selection {
                anchor: Point::new(vec![0, 0], 4),
                focus: Point::new(vec![0, 0], 8),
            })
            .unwrap();

        assert!(editor.insert_link("https://docs.rs"));
        let link = editor.nodes()[0].as_element().unwrap().children[1].as_element().unwrap();
        assert!(link.is_type("a"));
        assert_eq!(link.attr_str("url"), Some("https://docs.rs"));
        assert_eq!(editor.selection().focus, Point::new(vec![0, 1, 0], 4));

        assert!(editor.unwrap_link());
        assert_eq!(editor.nodes()[0].as_element().unwrap().children.len(), 3);
        assert_eq!(editor.nodes()[0].text_content(), "see docs here");
    }
}
