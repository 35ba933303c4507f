//! Point-in-time capture of every put and beam state.

use crate::graph::Graph;
use crate::types::{BeamState, Direction, PutKind, PutState};

/// State of one put in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PutSnapshot {
    pub node: String,
    pub direction: Direction,
    pub name: String,
    pub kind: PutKind,
    pub state: PutState,
}

/// State of one beam in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BeamSnapshot {
    pub name: String,
    /// Qualified name of the source output, if connected
    pub source: Option<String>,
    /// Qualified name of the dest input, if connected
    pub dest: Option<String>,
    pub state: BeamState,
}

/// Every put and beam state, in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GraphSnapshot {
    pub puts: Vec<PutSnapshot>,
    pub beams: Vec<BeamSnapshot>,
}

impl GraphSnapshot {
    /// Capture the current state of a graph.
    pub fn capture(graph: &Graph) -> Self {
        let mut puts = Vec::with_capacity(graph.put_count());
        for (_, node) in graph.nodes() {
            for id in node.puts() {
                let put = graph.put(id);
                puts.push(PutSnapshot {
                    node: node.name().to_string(),
                    direction: put.direction(),
                    name: put.name().to_string(),
                    kind: put.kind(),
                    state: put.state(),
                });
            }
        }

        let beams = graph
            .beams()
            .map(|(_, beam)| BeamSnapshot {
                name: beam.name().to_string(),
                source: beam.source().ok().map(|p| graph.put(p).qualified_name()),
                dest: beam.dest().ok().map(|p| graph.put(p).qualified_name()),
                state: beam.state(),
            })
            .collect();

        Self { puts, beams }
    }

    /// State of a put by node, direction and name.
    pub fn put_state(&self, node: &str, direction: Direction, name: &str) -> Option<PutState> {
        self.puts
            .iter()
            .find(|p| p.node == node && p.direction == direction && p.name == name)
            .map(|p| p.state)
    }

    /// State of a beam by name.
    pub fn beam_state(&self, name: &str) -> Option<BeamState> {
        self.beams.iter().find(|b| b.name == name).map(|b| b.state)
    }

    /// Number of puts currently on.
    pub fn puts_on(&self) -> usize {
        self.puts.iter().filter(|p| p.state == PutState::On).count()
    }

    /// Number of beams currently on.
    pub fn beams_on(&self) -> usize {
        self.beams.iter().filter(|b| b.state == BeamState::On).count()
    }
}

impl Graph {
    /// Capture the current state of every put and beam.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::capture(self)
    }
}
