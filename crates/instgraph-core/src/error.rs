//! Error types for instrument graph construction and lookup.

use thiserror::Error;

use crate::types::PutKind;

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised by construction, lookup, and stimulus against an unfinished graph.
///
/// Propagation itself never fails once the graph is structurally valid.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// No node with this name
    #[error("unknown node \"{0}\"")]
    NodeNotFound(String),

    /// No beam with this name
    #[error("unknown beam \"{0}\"")]
    BeamNotFound(String),

    /// The node has no input with this name
    #[error("node \"{node}\" has no input \"{name}\"")]
    InputNotFound { node: String, name: String },

    /// The node has no output with this name
    #[error("node \"{node}\" has no output \"{name}\"")]
    OutputNotFound { node: String, name: String },

    /// The beam exists but this endpoint was never connected
    #[error("beam \"{beam}\" has no {end} set")]
    EndpointNotSet { beam: String, end: &'static str },

    /// The put exists but no beam is attached to it
    #[error("put \"{0}\" has no beam attached")]
    BeamNotSet(String),

    /// A direction-specific operation was applied to the wrong direction
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A second output claims to be the source of a beam
    #[error("beam \"{beam}\" already has a source")]
    SourceConflict { beam: String },

    /// A second input claims to be the destination of a beam
    #[error("beam \"{beam}\" already has a dest")]
    DestConflict { beam: String },

    /// A put is already attached to a different beam
    #[error("put \"{put}\" is already attached to beam \"{beam}\"")]
    PutBeamConflict { put: String, beam: String },

    /// The two endpoints of a beam carry different kinds
    #[error("beam \"{beam}\" connects a {source_kind} output to a {dest_kind} input")]
    KindMismatch {
        beam: String,
        source_kind: PutKind,
        dest_kind: PutKind,
    },

    /// An output or off link names an output the node does not have
    #[error("input \"{input}\" on node \"{node}\" links to missing output \"{target}\"")]
    LinkTargetMissing {
        node: String,
        input: String,
        target: String,
    },

    /// A put and a beam disagree about being connected
    #[error("put \"{put}\" and beam \"{beam}\" do not reference each other")]
    Inconsistent { put: String, beam: String },

    /// Stimulus issued against a node whose links were never finalized
    #[error("node \"{0}\" has not been finalized")]
    NotFinalized(String),

    /// The propagation topology loops back on itself
    #[error("propagation cycle through \"{at}\"")]
    Cycle { at: String },

    /// A textual state, kind or direction could not be parsed
    #[error("parse error: {0}")]
    Parse(String),
}

impl GraphError {
    /// True for the "name not found" family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NodeNotFound(_)
                | Self::BeamNotFound(_)
                | Self::InputNotFound { .. }
                | Self::OutputNotFound { .. }
        )
    }
}
