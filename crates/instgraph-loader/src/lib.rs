//! Instrument Graph Loaders
//!
//! Front-ends that build an [`instgraph_core::Graph`] from a description
//! file, using only the core's public construction API.
//!
//! - **TOML**: `[[nodes]]` records listing each node's inputs and outputs
//! - **drawio**: diagram documents whose cell ids encode the entities
//!   ([`CellId`])
//!
//! A drawio load also returns a [`Diagram`] recording which cell draws each
//! put and beam, so a [`DiagramAnnotator`] can write the graph's state back
//! into the document as colors.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use instgraph_core::Graph;

mod annotate;
mod cell_id;
mod config;
mod drawio;
mod error;
mod toml_format;

pub use annotate::{recolor_style, DiagramAnnotator};
pub use cell_id::CellId;
pub use config::{LoaderConfig, Palette};
pub use drawio::{load_drawio, parse_drawio, Diagram};
pub use error::{LoadError, Result};
pub use toml_format::{load_toml, parse_toml};

/// Description file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Drawio,
}

impl Format {
    /// Guess the format from a file extension (`.toml`, `.drawio`, `.xml`).
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "drawio" | "xml" => Some(Self::Drawio),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Drawio => "drawio",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = LoadError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "toml" => Ok(Self::Toml),
            "drawio" | "xml" => Ok(Self::Drawio),
            _ => Err(LoadError::UnknownFormat(s.to_string())),
        }
    }
}

/// A graph loaded from a file, with its diagram when the file was drawio.
#[derive(Debug)]
pub struct Loaded {
    pub graph: Graph,
    pub diagram: Option<Diagram>,
}

/// Load a graph file, inferring the format from the extension unless given.
pub fn load_file(
    path: impl AsRef<Path>,
    format: Option<Format>,
    config: &LoaderConfig,
) -> Result<Loaded> {
    let path = path.as_ref();
    let format = match format.or_else(|| Format::from_path(path)) {
        Some(format) => format,
        None => return Err(LoadError::UnknownFormat(path.display().to_string())),
    };

    match format {
        Format::Toml => Ok(Loaded {
            graph: load_toml(path, config)?,
            diagram: None,
        }),
        Format::Drawio => {
            let (graph, diagram) = load_drawio(path, config)?;
            Ok(Loaded {
                graph,
                diagram: Some(diagram),
            })
        }
    }
}
