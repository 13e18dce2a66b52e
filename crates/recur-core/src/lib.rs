pub mod breakpoint;
pub mod config;
pub mod error;
pub mod expr;
pub mod id;
pub mod model;
pub mod ranges;
pub mod tree;

pub use breakpoint::Breakpoint;
pub use config::EngineConfig;
pub use error::{ExpressionError, GraphError};
pub use expr::{Expression, is_operation};
pub use id::NodeId;
pub use model::*;
pub use ranges::{Range, RangeTable};
pub use tree::{Document, DocumentTree};

// Re-export geometry and graph types so downstream crates don't need a direct dependency
pub use kurbo::{Affine, Point};
pub use petgraph::graph::NodeIndex;
