//! Element type tags and character marks
//!
//! These are the literal `type` values stored in persisted documents.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const ELEMENT_PARAGRAPH: &str = "p";
pub const ELEMENT_H1: &str = "h1";
pub const ELEMENT_H2: &str = "h2";
pub const ELEMENT_H3: &str = "h3";
pub const ELEMENT_H4: &str = "h4";
pub const ELEMENT_H5: &str = "h5";
pub const ELEMENT_H6: &str = "h6";
pub const ELEMENT_BLOCKQUOTE: &str = "blockquote";
pub const ELEMENT_CODE_BLOCK: &str = "code_block";
pub const ELEMENT_CODE_LINE: &str = "code_line";
pub const ELEMENT_UL: &str = "ul";
pub const ELEMENT_OL: &str = "ol";
pub const ELEMENT_LI: &str = "li";
pub const ELEMENT_TODO_LI: &str = "action_item";
pub const ELEMENT_LINK: &str = "a";
pub const ELEMENT_IMAGE: &str = "img";
pub const ELEMENT_MEDIA_EMBED: &str = "media_embed";
pub const ELEMENT_TABLE: &str = "table";
pub const ELEMENT_TR: &str = "tr";
pub const ELEMENT_TH: &str = "th";
pub const ELEMENT_TD: &str = "td";
pub const ELEMENT_LOADING: &str = "loading";
pub const ELEMENT_TWEET: &str = "tweet";
pub const ELEMENT_CTA: &str = "cta";

/// All heading types, h1 first
pub const KEYS_HEADING: [&str; 6] = [
    ELEMENT_H1, ELEMENT_H2, ELEMENT_H3, ELEMENT_H4, ELEMENT_H5, ELEMENT_H6,
];

/// Element types that live inside a text block rather than forming one
pub const INLINE_TYPES: [&str; 1] = [ELEMENT_LINK];

/// Element types that contain list items
pub const LIST_TYPES: [&str; 2] = [ELEMENT_UL, ELEMENT_OL];

/// Heading level for a heading type tag (`"h3"` → `Some(3)`)
pub fn heading_level(kind: &str) -> Option<usize> {
    KEYS_HEADING
        .iter()
        .position(|heading| *heading == kind)
        .map(|index| index + 1)
}

/// Check whether a type tag names an inline element
pub fn is_inline(kind: &str) -> bool {
    INLINE_TYPES.contains(&kind)
}

/// Check whether a type tag names a list container
pub fn is_list(kind: &str) -> bool {
    LIST_TYPES.contains(&kind)
}

/// A character-level style attached to a text leaf
///
/// Persisted as a boolean key on the text node (`{"text": "x", "bold": true}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Code,
    Strikethrough,
    Subscript,
    Superscript,
}

impl Mark {
    /// Every mark, in declaration order
    pub const ALL: [Mark; 7] = [
        Mark::Bold,
        Mark::Italic,
        Mark::Underline,
        Mark::Code,
        Mark::Strikethrough,
        Mark::Subscript,
        Mark::Superscript,
    ];

    /// The key used for this mark in persisted text nodes
    pub fn key(self) -> &'static str {
        match self {
            Mark::Bold => "bold",
            Mark::Italic => "italic",
            Mark::Underline => "underline",
            Mark::Code => "code",
            Mark::Strikethrough => "strikethrough",
            Mark::Subscript => "subscript",
            Mark::Superscript => "superscript",
        }
    }

    /// Look up a mark by its persisted key
    pub fn from_key(key: &str) -> Option<Mark> {
        Mark::ALL.into_iter().find(|mark| mark.key() == key)
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level() {
        assert_eq!(heading_level("h1"), Some(1));
        assert_eq!(heading_level("h6"), Some(6));
        assert_eq!(heading_level("p"), None);
    }

    #[test]
    fn test_mark_key_lookup() {
        for mark in Mark::ALL {
            assert_eq!(Mark::from_key(mark.key()), Some(mark));
        }
        assert_eq!(Mark::from_key("highlight"), None);
    }
}
