//! Error taxonomy for the visualization engine.
//!
//! Every fallible engine operation returns [`GraphError`]. Input problems are
//! rejected before the scene is touched, so a failed call always leaves the
//! previous scene in place.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised by the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// The dataset is missing its node or edge collection, or is not valid JSON.
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    /// A commit date could not be parsed into a timestamp.
    #[error("malformed date {value:?} on node {node}")]
    MalformedDate { node: String, value: String },

    /// A layout that needs at least one node was given none.
    #[error("{layout} layout requires at least one node")]
    EmptyDataset { layout: &'static str },

    /// A required host resource (container element, document) is absent.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// No node with this key exists in the scene.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// A node was removed while edges still referenced it.
    #[error("node {0} still has attached edges")]
    NodeStillConnected(String),

    /// A layout parameter name was not recognised.
    #[error("unknown layout parameter: {0}")]
    UnknownParameter(String),

    /// A view mode name was not recognised.
    #[error("unknown view mode: {0}")]
    UnknownViewMode(String),

    /// A diff or analysis request failed on the host side.
    #[error("network request failed: {0}")]
    TransientNetworkFailure(String),

    /// Any other failure raised while handling an interaction or frame.
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl GraphError {
    /// Short classification used when recording diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            GraphError::InvalidDataset(_) | GraphError::MalformedDate { .. } => "input",
            GraphError::EmptyDataset { .. } => "empty-dataset",
            GraphError::ResourceNotFound(_) => "resource-not-found",
            GraphError::TransientNetworkFailure(_) => "network",
            GraphError::UnknownNode(_)
            | GraphError::NodeStillConnected(_)
            | GraphError::UnknownParameter(_)
            | GraphError::UnknownViewMode(_)
            | GraphError::Runtime(_) => "runtime",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GraphError::EmptyDataset { layout: "timeline" };
        assert_eq!(err.to_string(), "timeline layout requires at least one node");

        let err = GraphError::MalformedDate {
            node: "abc".into(),
            value: "yesterday".into(),
        };
        assert_eq!(err.to_string(), "malformed date \"yesterday\" on node abc");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(GraphError::InvalidDataset("x".into()).kind(), "input");
        assert_eq!(GraphError::TransientNetworkFailure("x".into()).kind(), "network");
        assert_eq!(GraphError::NodeStillConnected("x".into()).kind(), "runtime");
    }
}
