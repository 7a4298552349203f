//! Drag-reorder metadata
//!
//! A table of rules folded in order per element type: later rules override
//! the fields they set. The editor renderer reads the folded options to decide
//! which blocks get a drag handle, at which nesting depth, and how far the
//! handle is pushed down to line up with the block's first line.

use crate::document::types;
use crate::registry::Registry;
use serde::Serialize;
use thiserror::Error;

/// One row of the drag table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragRule {
    pub types: Vec<String>,
    pub draggable: Option<bool>,
    /// Only blocks at this depth (0 = top level) get a handle
    pub level: Option<usize>,
    /// Top padding of the drag gutter, as a CSS length
    pub padding_top: Option<String>,
}

impl DragRule {
    fn for_types(kinds: &[&str]) -> Self {
        Self {
            types: kinds.iter().map(|k| k.to_string()).collect(),
            ..Self::default()
        }
    }

    fn draggable(mut self) -> Self {
        self.draggable = Some(true);
        self
    }

    fn level(mut self, level: usize) -> Self {
        self.level = Some(level);
        self
    }

    fn padding_top(mut self, padding: &str) -> Self {
        self.padding_top = Some(padding.to_string());
        self
    }
}

/// Folded drag options for one element type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DragOptions {
    pub draggable: bool,
    pub level: Option<usize>,
    pub padding_top: Option<String>,
}

/// Errors from checking the drag table against a registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    /// Draggable types with no element binding; dragging them does nothing
    #[error("Draggable types without an element binding: {}", .0.join(", "))]
    UnboundDraggable(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragConfig {
    rules: Vec<DragRule>,
}

impl DragConfig {
    pub fn new(rules: Vec<DragRule>) -> Self {
        Self { rules }
    }

    /// The table the post and snippet editors use
    pub fn standard() -> Self {
        use types::*;

        Self::new(vec![
            DragRule::for_types(&[ELEMENT_PARAGRAPH, ELEMENT_UL, ELEMENT_OL]).level(0),
            DragRule::for_types(&[
                ELEMENT_PARAGRAPH,
                ELEMENT_BLOCKQUOTE,
                ELEMENT_TODO_LI,
                ELEMENT_H1,
                ELEMENT_H2,
                ELEMENT_H3,
                ELEMENT_H4,
                ELEMENT_H5,
                ELEMENT_H6,
                ELEMENT_IMAGE,
                ELEMENT_OL,
                ELEMENT_UL,
                ELEMENT_TABLE,
                ELEMENT_MEDIA_EMBED,
                ELEMENT_CODE_BLOCK,
                ELEMENT_TWEET,
                ELEMENT_CTA,
            ])
            .draggable(),
            DragRule::for_types(&[ELEMENT_H1, ELEMENT_H2]).padding_top("3em"),
            DragRule::for_types(&[ELEMENT_H3]).padding_top("2.5em"),
            DragRule::for_types(&[ELEMENT_H4, ELEMENT_H5, ELEMENT_H6]).padding_top("2em"),
            DragRule::for_types(&[ELEMENT_BLOCKQUOTE, ELEMENT_CODE_BLOCK]).padding_top("2em"),
            DragRule::for_types(&[
                ELEMENT_PARAGRAPH,
                ELEMENT_TODO_LI,
                ELEMENT_IMAGE,
                ELEMENT_OL,
                ELEMENT_UL,
                ELEMENT_TABLE,
                ELEMENT_MEDIA_EMBED,
            ])
            .padding_top("0.75em"),
        ])
    }

    pub fn rules(&self) -> &[DragRule] {
        &self.rules
    }

    /// Fold every rule naming `kind`, in table order
    pub fn options(&self, kind: &str) -> DragOptions {
        self.rules
            .iter()
            .filter(|rule| rule.types.iter().any(|t| t == kind))
            .fold(DragOptions::default(), |mut options, rule| {
                if let Some(draggable) = rule.draggable {
                    options.draggable = draggable;
                }
                if let Some(level) = rule.level {
                    options.level = Some(level);
                }
                if let Some(padding) = &rule.padding_top {
                    options.padding_top = Some(padding.clone());
                }
                options
            })
    }

    /// Whether a block of `kind` at `depth` gets a drag handle
    pub fn allows(&self, kind: &str, depth: usize) -> bool {
        let options = self.options(kind);
        options.draggable && options.level.map_or(true, |level| level == depth)
    }

    /// Every type some rule makes draggable, in first-mention order
    pub fn draggable_types(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = Vec::new();
        for rule in &self.rules {
            for kind in &rule.types {
                if !kinds.contains(&kind.as_str()) && self.options(kind).draggable {
                    kinds.push(kind.as_str());
                }
            }
        }
        kinds
    }
}

/// Check every draggable type has an element binding
pub fn validate(config: &DragConfig, registry: &Registry) -> Result<(), IntegrityError> {
    let unbound: Vec<String> = config
        .draggable_types()
        .into_iter()
        .filter(|kind| registry.resolve(kind).is_none())
        .map(str::to_string)
        .collect();

    if unbound.is_empty() {
        Ok(())
    } else {
        Err(IntegrityError::UnboundDraggable(unbound))
    }
}
