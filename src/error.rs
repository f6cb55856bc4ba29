//! Error types for polyslot.

use thiserror::Error;

use crate::graph::node::{NodeId, ParamKind};

/// Result type alias for synth operations.
pub type Result<T> = std::result::Result<T, SynthError>;

/// Failures reported by an audio graph backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// The handle does not refer to a live node (never created, or released).
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// The node exists but has no parameter of this kind.
    #[error("node {node} has no {param:?} parameter")]
    NoSuchParam { node: NodeId, param: ParamKind },

    /// Start/stop was requested on a node that is not a source.
    #[error("node {0} is not a source node")]
    NotASource(NodeId),

    /// The engine could not be constructed at this sample rate.
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(f32),
}

/// Errors surfaced by the synth core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthError {
    /// No audio engine is attached; the operation was not performed.
    #[error("audio engine unavailable")]
    EngineUnavailable,

    /// Invalid configuration parameter.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Structural failure inside the audio graph.
    #[error("audio graph error: {0}")]
    Graph(#[from] GraphError),
}
