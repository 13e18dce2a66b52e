//! Error taxonomy of the transformation engine.
//!
//! Errors are scoped to the unit they can spoil: an [`InstructionError`]
//! discards one property, a [`ModelError`] demotes one node to the generic
//! model, an [`ApplyError`] stops the remaining handlers of one clone. Only
//! an [`EngineError`] fails a whole request.

use recur_core::breakpoint::UnknownBreakpoint;
use recur_core::{ExpressionError, GraphError, NodeId, NodeIndex};
use std::fmt;

/// A property instruction that could not be compiled.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InstructionError {
    #[error("invalid instruction: {0}")]
    Breakpoint(#[from] UnknownBreakpoint),

    #[error("invalid instruction: {which} `{raw}` is not a number")]
    Bound { which: &'static str, raw: String },

    #[error("invalid expression: {0}")]
    Expression(#[from] ExpressionError),
}

impl InstructionError {
    pub fn bound(which: &'static str, raw: impl Into<String>) -> Self {
        Self::Bound {
            which,
            raw: raw.into(),
        }
    }

    /// True for malformed expressions, false for malformed policy/bounds.
    pub fn is_expression(&self) -> bool {
        matches!(self, Self::Expression(_))
    }
}

/// Why a node could not get its kind-specific model.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("`{key}` has mixed values")]
    MixedValue { key: &'static str },

    #[error("text node uses more than one font")]
    MultipleFonts,

    #[error("could not load font {family} {style}: {reason}")]
    FontLoad {
        family: String,
        style: String,
        reason: String,
    },
}

/// A low-level failure while mutating a clone.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ApplyError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("node {node:?} is not a {expected} node")]
    KindMismatch {
        node: NodeIndex,
        expected: &'static str,
    },
}

impl ApplyError {
    pub fn missing(node: NodeIndex) -> Self {
        Self::Graph(GraphError::NodeNotFound(node))
    }

    pub fn kind_mismatch(node: NodeIndex, expected: &'static str) -> Self {
        Self::KindMismatch { node, expected }
    }
}

/// Request-level failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("additions must be at least 1, got {0}")]
    InvalidAdditions(usize),

    #[error("expected edits for {expected} nodes, got {found}")]
    DataMismatch { expected: usize, found: usize },

    #[error("nothing is selected")]
    NoSelection,

    #[error("the session is closed")]
    Closed,

    #[error("no node with id {0}")]
    UnknownId(NodeId),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("message JSON is invalid: {0}")]
    Json(String),
}

impl EngineError {
    pub fn json(msg: impl Into<String>) -> Self {
        Self::Json(msg.into())
    }
}

/// One discarded property instruction, reported back to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileWarning {
    pub node: NodeId,
    /// Slot path such as `width` or `fills[0].r`.
    pub path: String,
    pub error: InstructionError,
}

impl fmt::Display for CompileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`: {}", self.node, self.path, self.error)
    }
}
