//! Error types for reading persisted document trees

use thiserror::Error;

/// Errors that can occur while converting persisted JSON into nodes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// A node was not a JSON object
    #[error("Expected a node object, found {found}")]
    NotAnObject {
        /// The JSON value that was found instead
        found: String,
    },

    /// The `children` key of an element was not an array
    #[error("Element children must be an array, found {found}")]
    InvalidChildren {
        /// The JSON value that was found instead
        found: String,
    },

    /// The `type` key of an element was not a string
    #[error("Element type must be a string, found {found}")]
    InvalidType {
        /// The JSON value that was found instead
        found: String,
    },

    /// The `text` key of a leaf was not a string
    #[error("Text leaf must carry a string, found {found}")]
    InvalidText {
        /// The JSON value that was found instead
        found: String,
    },

    /// An object had neither `children` nor `text`
    #[error("Node has neither `children` nor `text`")]
    MissingTextOrChildren,

    /// A document root was not an array of nodes
    #[error("Document must be an array of nodes: {0}")]
    InvalidDocument(String),
}
