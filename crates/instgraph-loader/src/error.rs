//! Loader error types.

use instgraph_core::GraphError;
use thiserror::Error;

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoadError>;

/// Errors raised while reading a graph description or writing a diagram.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Graph construction rejected the description
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A diagram cell id does not follow the entity grammar
    #[error("invalid cell id \"{id}\": {reason}")]
    InvalidCellId { id: String, reason: String },

    /// A record lacks a required field
    #[error("{entity} has no {field}")]
    MissingField { entity: String, field: &'static str },

    /// A link edge joins puts on two different nodes
    #[error("link \"{link}\" joins input on \"{input_node}\" to output on \"{output_node}\"")]
    LinkAcrossNodes {
        link: String,
        input_node: String,
        output_node: String,
    },

    /// The document has no `mxGraphModel/root`
    #[error("no mxGraphModel root found in document")]
    NoDiagramRoot,

    /// A palette color is not six hex digits
    #[error("invalid color \"{0}\": expected six hex digits")]
    InvalidColor(String),

    /// The file format could not be determined
    #[error("unknown graph format \"{0}\"")]
    UnknownFormat(String),
}

impl LoadError {
    pub(crate) fn cell(id: &str, reason: impl Into<String>) -> Self {
        Self::InvalidCellId {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}
