//! Beams: directed edges from one output to one input.
//!
//! A beam's state is a pure function of its endpoints' states. The stored
//! value is only a cache of the last evaluation, used to stop the cascade
//! once nothing changes.
//!
//! # Rules
//!
//! Evaluated in order:
//!
//! 1. No source: `Off`, and an `On` destination is starved to `Waiting`.
//! 2. Source but no destination: `Intermediate` if the source is `On`,
//!    otherwise `Off`.
//! 3. Source `Waiting`: `Off`, starving an `On` destination.
//! 4. Source `On`: `On` if the destination is `On` or `Waiting` (and the
//!    destination is energized to `On`), `Intermediate` if it is `Off`.
//! 5. Source `Off`: `Off`, starving an `On` destination.
//!
//! Starving never forces a destination fully `Off`.

use std::fmt;

use crate::error::{GraphError, Result};
use crate::put::PutId;
use crate::types::{BeamState, PutState};

/// Stable handle to a beam inside a [`Graph`](crate::Graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BeamId(pub(crate) usize);

impl BeamId {
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for BeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "beam#{}", self.0)
    }
}

/// What a beam evaluation asks of its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestEffect {
    /// Leave the destination alone
    Keep,
    /// Downgrade an `On` destination to `Waiting`
    Starve,
    /// Force the destination `On`
    Energize,
}

/// Result of evaluating the beam rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub state: BeamState,
    pub dest: DestEffect,
}

impl Evaluation {
    const fn new(state: BeamState, dest: DestEffect) -> Self {
        Self { state, dest }
    }
}

/// Evaluate the beam rules for the given endpoint states.
///
/// `None` means the endpoint is not connected.
pub fn evaluate(source: Option<PutState>, dest: Option<PutState>) -> Evaluation {
    let starve = |dest: Option<PutState>| {
        if dest == Some(PutState::On) {
            DestEffect::Starve
        } else {
            DestEffect::Keep
        }
    };

    let Some(source) = source else {
        return Evaluation::new(BeamState::Off, starve(dest));
    };

    let Some(dest_state) = dest else {
        let state = if source == PutState::On {
            BeamState::Intermediate
        } else {
            BeamState::Off
        };
        return Evaluation::new(state, DestEffect::Keep);
    };

    match source {
        PutState::On => match dest_state {
            PutState::On | PutState::Waiting => {
                Evaluation::new(BeamState::On, DestEffect::Energize)
            }
            PutState::Off => Evaluation::new(BeamState::Intermediate, DestEffect::Keep),
        },
        PutState::Waiting | PutState::Off => Evaluation::new(BeamState::Off, starve(dest)),
    }
}

/// A directed edge from an output (source) to an input (dest).
#[derive(Debug, Clone)]
pub struct Beam {
    name: String,
    source: Option<PutId>,
    dest: Option<PutId>,
    state: BeamState,
}

impl Beam {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: None,
            dest: None,
            state: BeamState::Off,
        }
    }

    /// Unique name of the beam.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key of the beam in the graph registry.
    pub fn key(&self) -> &str {
        &self.name
    }

    /// Last computed state.
    pub fn state(&self) -> BeamState {
        self.state
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn has_dest(&self) -> bool {
        self.dest.is_some()
    }

    /// The source output.
    ///
    /// Fails with [`GraphError::EndpointNotSet`] if no output has been
    /// connected yet; probe with [`has_source`](Self::has_source) first.
    pub fn source(&self) -> Result<PutId> {
        self.source.ok_or_else(|| GraphError::EndpointNotSet {
            beam: self.name.clone(),
            end: "source",
        })
    }

    /// The destination input.
    pub fn dest(&self) -> Result<PutId> {
        self.dest.ok_or_else(|| GraphError::EndpointNotSet {
            beam: self.name.clone(),
            end: "dest",
        })
    }

    pub(crate) fn source_opt(&self) -> Option<PutId> {
        self.source
    }

    pub(crate) fn dest_opt(&self) -> Option<PutId> {
        self.dest
    }

    pub(crate) fn set_source(&mut self, put: PutId) {
        self.source = Some(put);
    }

    pub(crate) fn set_dest(&mut self, put: PutId) {
        self.dest = Some(put);
    }

    /// Store a newly evaluated state. Returns the previous state if it changed.
    pub(crate) fn store(&mut self, state: BeamState) -> Option<BeamState> {
        if self.state == state {
            return None;
        }
        let previous = self.state;
        self.state = state;
        Some(previous)
    }
}
