//! The tri-state vocabulary shared by puts and beams.
//!
//! Puts carry a [`PutState`], beams carry a [`BeamState`]. Every put also has
//! a [`Direction`] and a [`PutKind`]; the kind is a classification only and
//! plays no role in propagation beyond the matching check made when a beam
//! is connected.

use std::fmt;
use std::str::FromStr;

use crate::error::GraphError;

/// State of a single input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PutState {
    /// The put is off
    #[default]
    Off,
    /// The put would be on, but nothing upstream is supplying it yet
    Waiting,
    /// The put is on
    On,
}

impl PutState {
    /// All states, in ascending order of "energy".
    pub const ALL: [Self; 3] = [Self::Off, Self::Waiting, Self::On];

    /// Lowercase name of the state.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Waiting => "waiting",
            Self::On => "on",
        }
    }
}

impl fmt::Display for PutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PutState {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "0" => Ok(Self::Off),
            "waiting" | "wait" | "w" => Ok(Self::Waiting),
            "on" | "1" => Ok(Self::On),
            _ => Err(GraphError::Parse(format!("unknown put state \"{s}\""))),
        }
    }
}

/// State of a beam, derived from the states of its two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BeamState {
    /// The beam is off
    #[default]
    Off,
    /// The source is on but the destination cannot accept it yet
    Intermediate,
    /// The beam is on end to end
    On,
}

impl BeamState {
    /// Short name of the state, as used in status listings.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Intermediate => "int",
            Self::On => "on",
        }
    }
}

impl fmt::Display for BeamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a put is an input or an output of its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }

    /// Single character form: `i` or `o`.
    pub const fn as_char(&self) -> char {
        match self {
            Self::Input => 'i',
            Self::Output => 'o',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "i" | "input" => Ok(Self::Input),
            "o" | "output" => Ok(Self::Output),
            _ => Err(GraphError::Parse(format!("unknown direction \"{s}\""))),
        }
    }
}

/// What a put carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PutKind {
    #[default]
    Light,
    Data,
    Power,
    Mechanical,
    Fluid,
}

impl PutKind {
    /// All kinds.
    pub const ALL: [Self; 5] = [
        Self::Light,
        Self::Data,
        Self::Power,
        Self::Mechanical,
        Self::Fluid,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Data => "data",
            Self::Power => "power",
            Self::Mechanical => "mechanical",
            Self::Fluid => "fluid",
        }
    }

    /// Single character form used in compact identifiers: `l`, `d`, `p`, `m` or `f`.
    pub const fn as_char(&self) -> char {
        match self {
            Self::Light => 'l',
            Self::Data => 'd',
            Self::Power => 'p',
            Self::Mechanical => 'm',
            Self::Fluid => 'f',
        }
    }

    /// Look up a kind by its single character form.
    pub fn from_char(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_char() == c)
    }
}

impl fmt::Display for PutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PutKind {
    type Err = GraphError;

    /// Accepts either the full name (`power`) or the single character (`p`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(kind) = Self::from_char(c) {
                return Ok(kind);
            }
        }
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| GraphError::Parse(format!("unknown put kind \"{s}\"")))
    }
}
