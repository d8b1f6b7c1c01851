//! Error types for mdcopy operations.

use thiserror::Error;

use crate::dom::NodeId;

/// Errors that can occur while reading the page, rendering Markdown, or
/// injecting controls.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid selector `{0}`")]
    InvalidSelector(String),

    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("node {0:?} has no parent")]
    Detached(NodeId),

    #[error("node {0:?} cannot be inserted into its own subtree")]
    HierarchyRequest(NodeId),

    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("node {0:?} is not a text node")]
    NotText(NodeId),

    #[error("content nested too deeply at <{tag}>")]
    NestingTooDeep { tag: String },

    #[error("message content not found")]
    ContentNotFound,

    #[error("clipboard write failed: {0}")]
    Clipboard(String),

    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),
}

pub type Result<T> = std::result::Result<T, Error>;
