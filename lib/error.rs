//! Errors for the simulation core.
//!
//! Every variant is a local validation failure detected at the point where it
//! occurs; nothing here is retryable.

use thiserror::Error;
use crate::graph::NodeId;

#[derive(Debug, Error)]
pub enum SimError {
    /// Returned when a vector or matrix dimension is not a power of two, or a
    /// declared input width is zero.
    #[error("invalid qubit width: dimension {0} is not a positive power of two")]
    InvalidWidth(usize),

    /// Returned when a basis-vector label contains something other than 0 or
    /// 1.
    #[error("invalid bit value {0}: expected 0 or 1")]
    InvalidBit(u8),

    /// Returned when an operator matrix is not square.
    #[error("operator matrix must be square, got shape ({0}, {1})")]
    NonSquare(usize, usize),

    /// Returned when the combined width of some inputs disagrees with the
    /// width of whatever consumes them.
    #[error("width mismatch: expected {expected} qubit(s), found {found}")]
    WidthMismatch { expected: usize, found: usize },

    /// Returned when state-mode evaluation needs the value of an input node
    /// that the caller did not supply.
    #[error("no initial value supplied for input node {0}")]
    UninitializedInput(NodeId),

    /// Returned when a tensor product is requested over zero operands.
    #[error("cannot take the tensor product of an empty sequence")]
    EmptyInput,

    /// Returned when a graph cannot be totally ordered.
    #[error("graph contains a cycle: scheduled {scheduled} of {total} node(s)")]
    CyclicGraph { scheduled: usize, total: usize },

    /// Returned when an identifier does not name a node in the graph.
    #[error("missing node {0}")]
    MissingNode(NodeId),

    /// Returned when an initial value is supplied for a node that is not an
    /// input.
    #[error("node {0} is not an input node")]
    NotInput(NodeId),

    /// Returned when a schedule reaches a node before one of its inputs.
    #[error("node {node} reached before its input {input} was evaluated")]
    UnevaluatedInput { node: NodeId, input: NodeId },

    #[error("error constructing GraphViz representation: {0}")]
    GraphVizError(String),

    #[error("I/O error: {0}")]
    IOError(#[from] std::io::Error),
}
pub type SimResult<T> = Result<T, SimError>;
