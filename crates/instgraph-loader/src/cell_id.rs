//! Entity grammar encoded in diagram cell ids.
//!
//! ```text
//! n:<node>                       node            (long form node:)
//! i[.<kind>]:<node>:<put>        input           (long form input:)
//! o[.<kind>]:<node>:<put>        output          (long form output:)
//! b:<beam>                       beam edge       (long form beam:)
//! l:<link>                       output link edge (long form link:)
//! of:<link>                      off-link edge
//! ```
//!
//! `<kind>` is a single character (`l`, `d`, `p`, `m`, `f`) or the full kind
//! name; it defaults to light. Ids without a `:` belong to the diagram itself
//! (drawio's `0` and `1` layers, decorations) and are not entities.

use std::fmt;

use instgraph_core::{Direction, PutKind};

use crate::error::{LoadError, Result};

/// A graph entity named by a cell id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellId {
    Node {
        name: String,
    },
    Put {
        direction: Direction,
        kind: PutKind,
        node: String,
        name: String,
    },
    Beam {
        name: String,
    },
    Link {
        name: String,
    },
    OffLink {
        name: String,
    },
}

impl CellId {
    /// Parse a cell id. Returns `Ok(None)` for ids that carry no entity.
    pub fn parse(id: &str) -> Result<Option<Self>> {
        let Some((head, rest)) = id.split_once(':') else {
            return Ok(None);
        };
        if head.is_empty() || rest.is_empty() {
            return Err(LoadError::cell(id, "starts or ends with ':'"));
        }

        let (tag, kind) = match head.split_once('.') {
            Some((tag, kind)) => (tag, Some(kind)),
            None => (head, None),
        };

        let direction = match tag {
            "i" | "input" => Some(Direction::Input),
            "o" | "output" => Some(Direction::Output),
            _ => None,
        };
        if let Some(direction) = direction {
            return parse_put(id, direction, kind, rest).map(Some);
        }

        if kind.is_some() {
            return Err(LoadError::cell(id, "only inputs and outputs take a kind"));
        }
        let name = rest.to_string();
        let cell = match tag {
            "n" | "node" => Self::Node { name },
            "b" | "beam" => Self::Beam { name },
            "l" | "link" => Self::Link { name },
            "of" => Self::OffLink { name },
            _ => return Err(LoadError::cell(id, format!("unknown entity \"{tag}\""))),
        };
        Ok(Some(cell))
    }

    /// Parse an id that must name a put, as found in edge endpoints.
    pub fn parse_put(id: &str) -> Result<(Direction, PutKind, String, String)> {
        match Self::parse(id)? {
            Some(Self::Put {
                direction,
                kind,
                node,
                name,
            }) => Ok((direction, kind, node, name)),
            _ => Err(LoadError::cell(id, "not an input or output")),
        }
    }

    /// True for entities drawn as edges.
    pub fn is_edge(&self) -> bool {
        matches!(self, Self::Beam { .. } | Self::Link { .. } | Self::OffLink { .. })
    }
}

fn parse_put(id: &str, direction: Direction, kind: Option<&str>, rest: &str) -> Result<CellId> {
    let kind = match kind {
        None => PutKind::Light,
        Some(k) => k
            .parse()
            .map_err(|_| LoadError::cell(id, format!("unknown kind \"{k}\"")))?,
    };

    let Some((node, name)) = rest.split_once(':') else {
        return Err(LoadError::cell(id, "put without second ':'"));
    };
    if node.is_empty() {
        return Err(LoadError::cell(id, "put without node name"));
    }
    if name.is_empty() {
        return Err(LoadError::cell(id, "put without put name"));
    }

    Ok(CellId::Put {
        direction,
        kind,
        node: node.to_string(),
        name: name.to_string(),
    })
}

impl fmt::Display for CellId {
    /// Short form, with the kind suffix omitted for light puts.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node { name } => write!(f, "n:{name}"),
            Self::Put {
                direction,
                kind,
                node,
                name,
            } => {
                write!(f, "{}", direction.as_char())?;
                if *kind != PutKind::Light {
                    write!(f, ".{}", kind.as_char())?;
                }
                write!(f, ":{node}:{name}")
            }
            Self::Beam { name } => write!(f, "b:{name}"),
            Self::Link { name } => write!(f, "l:{name}"),
            Self::OffLink { name } => write!(f, "of:{name}"),
        }
    }
}
