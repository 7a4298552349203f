//! postdoc - rich-text post and snippet documents
//!
//! The document model behind a slate-style editor: a tree of typed elements
//! and marked text leaves, a plugin registry binding element types to
//! interactive and static renderers, an HTML serializer and deserializer,
//! rule tables for autoformatting and key handling, and an editing session
//! that applies them.

#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod document;
pub mod markup;
pub mod registry;

// Serialization in both directions
pub mod html_deserializer;
pub mod html_serializer;
pub mod markdown;

// Plugin catalogue and editor rendering
pub mod draggable;
pub mod plugins;
pub mod render;

// Editing
pub mod editor;
pub mod hotkey;
pub mod rules;

pub mod editor_config;
pub mod pipeline;
pub mod upload;

pub use document::{Document, ElementNode, Mark, Node, TextNode};
pub use editor::Editor;
pub use registry::Registry;
