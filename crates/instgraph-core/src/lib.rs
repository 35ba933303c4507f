//! Instrument Graph Core
//!
//! Models the connectivity of a physical instrument as a directed graph and
//! keeps every on/off/waiting state consistent after any single change.
//!
//! # Entities
//!
//! - **Put**: an input or output terminal on a node, holding a [`PutState`]
//! - **Beam**: a directed edge from one output to one input, whose
//!   [`BeamState`] is a function of its two endpoints
//! - **Node**: a named container of puts, plus intra-node forwarding
//!   (output links and off-links)
//! - **Graph**: the arena and name registry for all of the above
//!
//! # Propagation
//!
//! Setting a put recurses through its beam and its node's links until no
//! value changes. Observers registered with [`Graph::observe`] see each
//! committed change once, in cascade order.
//!
//! ```
//! use instgraph_core::{Direction, Graph, PutKind, PutState, BeamState};
//!
//! let mut graph = Graph::new();
//! let laser = graph.add_node("laser");
//! let camera = graph.add_node("camera");
//! let beam = graph.add_beam("laser2camera");
//! graph.add_put(laser, Direction::Output, "out", PutKind::Light, Some(beam))?;
//! graph.add_put(camera, Direction::Input, "in", PutKind::Light, Some(beam))?;
//! graph.finalize()?;
//!
//! graph.set_output("laser", "out", PutState::On)?;
//! assert_eq!(graph.beam("laser2camera")?.state(), BeamState::Intermediate);
//!
//! graph.set_input("camera", "in", PutState::On)?;
//! assert_eq!(graph.beam("laser2camera")?.state(), BeamState::On);
//! # Ok::<(), instgraph_core::GraphError>(())
//! ```
//!
//! # Topology
//!
//! The cascade assumes the beams and links form no loop;
//! [`Graph::finalize`] rejects cyclic graphs.

mod beam;
mod error;
mod graph;
mod node;
mod observer;
mod propagate;
mod put;
mod snapshot;
mod types;

pub use beam::{evaluate, Beam, BeamId, DestEffect, Evaluation};
pub use error::{GraphError, Result};
pub use graph::Graph;
pub use node::{aggregate, Node, NodeId};
pub use observer::{ChangeLog, StateChange, StateObserver};
pub use put::{Put, PutId};
pub use snapshot::{BeamSnapshot, GraphSnapshot, PutSnapshot};
pub use types::{BeamState, Direction, PutKind, PutState};
