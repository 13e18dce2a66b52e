//! Error types shared by the core crates.

use crate::id::NodeId;
use petgraph::graph::NodeIndex;

/// A user expression that could not be compiled.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("expression is empty")]
    Empty,

    #[error("unexpected character {ch:?} at byte {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("unexpected {found} at token {position}")]
    UnexpectedToken { found: String, position: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unbalanced parentheses")]
    UnbalancedParens,
}

impl ExpressionError {
    pub fn unexpected(found: impl Into<String>, position: usize) -> Self {
        Self::UnexpectedToken {
            found: found.into(),
            position,
        }
    }
}

/// Failures of the host document stand-in.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("node {0:?} does not exist")]
    NodeNotFound(NodeIndex),

    #[error("unknown node id `{0}`")]
    UnknownId(NodeId),

    #[error("duplicate node id `{0}`")]
    DuplicateId(NodeId),

    #[error("the page node cannot be cloned")]
    CannotCloneRoot,

    #[error("invalid size {width}x{height}")]
    InvalidSize { width: f64, height: f64 },

    #[error("document JSON is invalid: {0}")]
    Json(String),
}

impl GraphError {
    pub fn json(msg: impl Into<String>) -> Self {
        Self::Json(msg.into())
    }
}
