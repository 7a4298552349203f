//! Locations inside a document tree

/// A position inside a text leaf
///
/// `path` is the sequence of child indices from the document root down to the
/// leaf; `offset` counts characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Point {
    pub path: Vec<usize>,
    pub offset: usize,
}

impl Point {
    pub fn new(path: Vec<usize>, offset: usize) -> Self {
        Self { path, offset }
    }
}

/// An anchor/focus pair; collapsed when both points are equal
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    /// A collapsed selection (a caret)
    pub fn caret(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// The earlier and later point, in document order
    pub fn ordered(&self) -> (&Point, &Point) {
        if (&self.anchor.path, self.anchor.offset) <= (&self.focus.path, self.focus.offset) {
            (&self.anchor, &self.focus)
        } else {
            (&self.focus, &self.anchor)
        }
    }
}

/// Convert a character offset into a byte index, clamping to the end
pub fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_index_multibyte() {
        assert_eq!(byte_index("héllo", 2), 3);
        assert_eq!(byte_index("abc", 10), 3);
    }

    #[test]
    fn test_selection_ordering() {
        let selection = Selection {
            anchor: Point::new(vec![0, 1], 2),
            focus: Point::new(vec![0, 0], 5),
        };
        let (start, end) = selection.ordered();
        assert_eq!(start.path, vec![0, 0]);
        assert_eq!(end.path, vec![0, 1]);
        assert!(!selection.is_collapsed());
    }
}
