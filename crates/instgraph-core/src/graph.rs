//! The graph: registry and arena of nodes, puts and beams.
//!
//! Entities are stored in arenas and addressed by stable handles
//! ([`NodeId`], [`PutId`], [`BeamId`]). Nothing is ever removed while the
//! graph lives, so a handle handed out by a graph stays valid for that
//! graph. Names resolve to handles through ordered registries, and every
//! name lookup fails explicitly on a miss.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use crate::beam::{Beam, BeamId};
use crate::error::{GraphError, Result};
use crate::node::{Node, NodeId};
use crate::observer::{StateChange, StateObserver};
use crate::put::{Put, PutId};
use crate::types::{BeamState, Direction, PutKind, PutState};

/// An instrument graph.
#[derive(Default)]
pub struct Graph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) puts: Vec<Put>,
    pub(crate) beams: Vec<Beam>,
    node_index: BTreeMap<String, NodeId>,
    beam_index: BTreeMap<String, BeamId>,
    observers: Vec<Box<dyn StateObserver>>,
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes.len())
            .field("puts", &self.puts.len())
            .field("beams", &self.beams.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== OBSERVATION ====================

    /// Register an observer for every committed state change.
    pub fn observe<O>(&mut self, observer: O)
    where
        O: StateObserver + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn notify(&mut self, change: StateChange) {
        for observer in &mut self.observers {
            observer.on_state_change(&change);
        }
    }

    // ==================== CONSTRUCTION ====================

    /// Look up a node by name, creating it if it does not exist.
    pub fn add_node(&mut self, name: &str) -> NodeId {
        if let Some(&id) = self.node_index.get(name) {
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(name));
        self.node_index.insert(name.to_string(), id);
        debug!(node = name, "created node");
        id
    }

    /// Look up a beam by name, creating it if it does not exist.
    pub fn add_beam(&mut self, name: &str) -> BeamId {
        if let Some(&id) = self.beam_index.get(name) {
            return id;
        }
        let id = BeamId(self.beams.len());
        self.beams.push(Beam::new(name));
        self.beam_index.insert(name.to_string(), id);
        debug!(beam = name, "created beam");
        id
    }

    /// Add an input or output to a node, optionally attached to a beam.
    ///
    /// If the node already has a put of this direction and name, the first
    /// one wins: a warning is logged and its handle is returned unchanged.
    /// If a beam is given, the put completes the beam's missing endpoint
    /// (outputs become the source, inputs the dest); a beam that already has
    /// that endpoint is a construction conflict.
    ///
    /// # Panics
    ///
    /// Panics if a handle was not issued by this graph.
    pub fn add_put(
        &mut self,
        node: NodeId,
        direction: Direction,
        name: &str,
        kind: PutKind,
        beam: Option<BeamId>,
    ) -> Result<PutId> {
        let owner = &self.nodes[node.0];
        if let Ok(existing) = owner.put(direction, name) {
            warn!(
                node = owner.name(),
                put = name,
                %direction,
                "put already exists, keeping the first"
            );
            return Ok(existing);
        }

        if let Some(beam) = beam {
            self.check_endpoint_free(beam, direction, kind)?;
        }

        let id = PutId(self.puts.len());
        let node_name = owner.name().to_string();
        self.puts
            .push(Put::new(node, &node_name, direction, name, kind));
        let inserted = self.nodes[node.0].insert(direction, name, id);
        debug_assert!(inserted.is_ok());

        debug!(node = %node_name, put = name, %direction, %kind, "added put");

        if let Some(beam) = beam {
            self.bind(id, beam);
        }
        Ok(id)
    }

    /// Attach an existing put to a beam, completing the matching endpoint.
    ///
    /// Attaching a put to the beam it is already attached to is a no-op.
    /// Otherwise the put's node must be finalized again before the next
    /// stimulus.
    ///
    /// # Panics
    ///
    /// Panics if a handle was not issued by this graph.
    pub fn attach(&mut self, put: PutId, beam: BeamId) -> Result<()> {
        if self.check_attach(put, beam)? {
            self.bind(put, beam);
        }
        Ok(())
    }

    /// Attach `source` and `dest` to `beam` in one step.
    ///
    /// Both attachments are checked before either is made.
    ///
    /// # Panics
    ///
    /// Panics if a handle was not issued by this graph.
    pub fn connect(&mut self, beam: BeamId, source: PutId, dest: PutId) -> Result<()> {
        if !self.puts[source.0].is_output() {
            return Err(GraphError::InvalidOperation(format!(
                "beam source {} is not an output",
                self.puts[source.0].qualified_name()
            )));
        }
        if !self.puts[dest.0].is_input() {
            return Err(GraphError::InvalidOperation(format!(
                "beam dest {} is not an input",
                self.puts[dest.0].qualified_name()
            )));
        }
        let bind_source = self.check_attach(source, beam)?;
        let bind_dest = self.check_attach(dest, beam)?;

        let (source_kind, dest_kind) = (self.puts[source.0].kind(), self.puts[dest.0].kind());
        if source_kind != dest_kind {
            return Err(GraphError::KindMismatch {
                beam: self.beams[beam.0].name().to_string(),
                source_kind,
                dest_kind,
            });
        }

        if bind_source {
            self.bind(source, beam);
        }
        if bind_dest {
            self.bind(dest, beam);
        }
        Ok(())
    }

    /// Returns `Ok(false)` if the put is already attached to this beam.
    fn check_attach(&self, put: PutId, beam: BeamId) -> Result<bool> {
        let p = &self.puts[put.0];
        match p.beam_opt() {
            Some(current) if current == beam => return Ok(false),
            Some(current) => {
                return Err(GraphError::PutBeamConflict {
                    put: p.qualified_name(),
                    beam: self.beams[current.0].name().to_string(),
                })
            }
            None => {}
        }
        self.check_endpoint_free(beam, p.direction(), p.kind())?;
        Ok(true)
    }

    /// Check that `beam` can take a put of this direction and kind.
    fn check_endpoint_free(&self, beam: BeamId, direction: Direction, kind: PutKind) -> Result<()> {
        let b = &self.beams[beam.0];
        let (taken, other) = match direction {
            Direction::Output => (b.source_opt(), b.dest_opt()),
            Direction::Input => (b.dest_opt(), b.source_opt()),
        };
        if taken.is_some() {
            let beam = b.name().to_string();
            return Err(match direction {
                Direction::Output => GraphError::SourceConflict { beam },
                Direction::Input => GraphError::DestConflict { beam },
            });
        }
        if let Some(other) = other {
            let other_kind = self.puts[other.0].kind();
            if other_kind != kind {
                let (source_kind, dest_kind) = match direction {
                    Direction::Output => (kind, other_kind),
                    Direction::Input => (other_kind, kind),
                };
                return Err(GraphError::KindMismatch {
                    beam: b.name().to_string(),
                    source_kind,
                    dest_kind,
                });
            }
        }
        Ok(())
    }

    /// Wire `put` to `beam`. The owning node must be finalized again before
    /// the next stimulus.
    fn bind(&mut self, put: PutId, beam: BeamId) {
        let p = &mut self.puts[put.0];
        p.set_beam(beam);
        self.nodes[p.node().0].set_finalized(false);
        let b = &mut self.beams[beam.0];
        match p.direction() {
            Direction::Output => b.set_source(put),
            Direction::Input => b.set_dest(put),
        }
        debug!(beam = b.name(), put = %p.qualified_name(), "connected beam endpoint");
    }

    /// Declare that input `put` forwards into the sibling output `target`.
    ///
    /// Fails with [`GraphError::InvalidOperation`] on outputs. The target
    /// need not exist yet; it is checked by
    /// [`update_output_links`](Self::update_output_links).
    pub fn add_output_link(&mut self, put: PutId, target: &str) -> Result<()> {
        let p = &mut self.puts[put.0];
        p.add_output_link(target)?;
        let node = p.node();
        self.nodes[node.0].set_finalized(false);
        Ok(())
    }

    /// Declare that input `put` holds the sibling output `target` off while on.
    pub fn add_off_link(&mut self, put: PutId, target: &str) -> Result<()> {
        let p = &mut self.puts[put.0];
        p.add_off_link(target)?;
        let node = p.node();
        self.nodes[node.0].set_finalized(false);
        Ok(())
    }

    /// Compute the link flags of every output on a node.
    ///
    /// Must run once after all puts and links of the node exist, before the
    /// node takes part in propagation. Sets `forwarded_into` on each output
    /// some input output-links to, and `off_linked` on each output some input
    /// off-links to, clearing both elsewhere. Safe to call repeatedly.
    pub fn update_output_links(&mut self, node: NodeId) -> Result<()> {
        let n = &self.nodes[node.0];

        for (input_name, &input) in n.inputs() {
            let put = &self.puts[input.0];
            for target in put.output_links().iter().chain(put.off_links()) {
                if !n.has_output(target) {
                    return Err(GraphError::LinkTargetMissing {
                        node: n.name().to_string(),
                        input: input_name.clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        let flags: Vec<(PutId, bool, bool)> = n
            .outputs()
            .iter()
            .map(|(name, &output)| {
                let mut forwarded = false;
                let mut off_linked = false;
                for &input in n.inputs().values() {
                    forwarded |= self.puts[input.0].links_to(name);
                    off_linked |= self.puts[input.0].off_links_to(name);
                }
                (output, forwarded, off_linked)
            })
            .collect();

        for (output, forwarded, off_linked) in flags {
            self.puts[output.0].set_link_flags(forwarded, off_linked);
        }
        let n = &mut self.nodes[node.0];
        n.set_finalized(true);
        debug!(node = n.name(), "updated output links");
        Ok(())
    }

    /// Finalize every node, validate the whole graph, then settle every
    /// beam against its endpoints.
    ///
    /// If validation fails every node is left unfinalized, so the graph
    /// keeps refusing stimuli until it is fixed and finalized again.
    ///
    /// On a freshly built graph settling changes nothing. After wiring a
    /// beam between puts that already carry state, it brings the beam (and
    /// anything downstream) up to date, notifying observers as usual.
    pub fn finalize(&mut self) -> Result<()> {
        for index in 0..self.nodes.len() {
            self.update_output_links(NodeId(index))?;
        }
        if let Err(err) = self.validate() {
            for node in &mut self.nodes {
                node.set_finalized(false);
            }
            return Err(err);
        }
        let beams: Vec<BeamId> = self.beam_index.values().copied().collect();
        for beam in beams {
            self.cascade_beam(beam);
        }
        Ok(())
    }

    // ==================== VALIDATION ====================

    /// Check the structural invariants of a fully built graph.
    ///
    /// - every put attached to a beam is that beam's matching endpoint, and
    ///   every beam endpoint is attached back to the beam
    /// - both endpoints of a beam carry the same kind
    /// - the propagation topology (beams plus output and off links) is acyclic
    pub fn validate(&self) -> Result<()> {
        for (index, put) in self.puts.iter().enumerate() {
            let Some(beam) = put.beam_opt() else { continue };
            let b = &self.beams[beam.0];
            let endpoint = match put.direction() {
                Direction::Output => b.source_opt(),
                Direction::Input => b.dest_opt(),
            };
            if endpoint != Some(PutId(index)) {
                return Err(GraphError::Inconsistent {
                    put: put.qualified_name(),
                    beam: b.name().to_string(),
                });
            }
        }

        for (index, beam) in self.beams.iter().enumerate() {
            for (end, direction) in [
                (beam.source_opt(), Direction::Output),
                (beam.dest_opt(), Direction::Input),
            ] {
                let Some(end) = end else { continue };
                let put = &self.puts[end.0];
                if put.beam_opt() != Some(BeamId(index)) || put.direction() != direction {
                    return Err(GraphError::Inconsistent {
                        put: put.qualified_name(),
                        beam: beam.name().to_string(),
                    });
                }
            }
            if let (Some(source), Some(dest)) = (beam.source_opt(), beam.dest_opt()) {
                let (source_kind, dest_kind) = (self.puts[source.0].kind(), self.puts[dest.0].kind());
                if source_kind != dest_kind {
                    return Err(GraphError::KindMismatch {
                        beam: beam.name().to_string(),
                        source_kind,
                        dest_kind,
                    });
                }
            }
        }

        self.check_acyclic()
    }

    /// Downstream puts of each put: output to beam dest, input to linked outputs.
    fn successors(&self) -> Vec<Vec<usize>> {
        self.puts
            .iter()
            .map(|put| match put.direction() {
                Direction::Output => put
                    .beam_opt()
                    .and_then(|b| self.beams[b.0].dest_opt())
                    .map(|d| vec![d.0])
                    .unwrap_or_default(),
                Direction::Input => {
                    let node = &self.nodes[put.node().0];
                    put.output_links()
                        .iter()
                        .chain(put.off_links())
                        .filter_map(|name| node.outputs().get(name))
                        .map(|id| id.0)
                        .collect()
                }
            })
            .collect()
    }

    fn check_acyclic(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Open,
            Done,
        }

        let next = self.successors();
        let mut marks = vec![Mark::New; self.puts.len()];

        for start in 0..self.puts.len() {
            if marks[start] != Mark::New {
                continue;
            }
            marks[start] = Mark::Open;
            let mut stack = vec![(start, 0usize)];

            while let Some(top) = stack.last_mut() {
                let put = top.0;
                if let Some(&succ) = next[put].get(top.1) {
                    top.1 += 1;
                    match marks[succ] {
                        Mark::Open => {
                            return Err(GraphError::Cycle {
                                at: self.puts[succ].qualified_name(),
                            })
                        }
                        Mark::New => {
                            marks[succ] = Mark::Open;
                            stack.push((succ, 0));
                        }
                        Mark::Done => {}
                    }
                } else {
                    marks[put] = Mark::Done;
                    stack.pop();
                }
            }
        }
        Ok(())
    }

    // ==================== LOOKUP ====================

    pub fn has_node(&self, name: &str) -> bool {
        self.node_index.contains_key(name)
    }

    pub fn has_beam(&self, name: &str) -> bool {
        self.beam_index.contains_key(name)
    }

    /// Handle of the node with this name.
    pub fn node_id(&self, name: &str) -> Result<NodeId> {
        self.node_index
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::NodeNotFound(name.to_string()))
    }

    /// Handle of the beam with this name.
    pub fn beam_id(&self, name: &str) -> Result<BeamId> {
        self.beam_index
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::BeamNotFound(name.to_string()))
    }

    /// The node with this name.
    pub fn node(&self, name: &str) -> Result<&Node> {
        self.node_id(name).map(|id| &self.nodes[id.0])
    }

    /// The beam with this name.
    pub fn beam(&self, name: &str) -> Result<&Beam> {
        self.beam_id(name).map(|id| &self.beams[id.0])
    }

    /// Resolve a node handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not issued by this graph.
    pub fn node_at(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Resolve a beam handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not issued by this graph.
    pub fn beam_at(&self, id: BeamId) -> &Beam {
        &self.beams[id.0]
    }

    /// Resolve a put handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not issued by this graph.
    pub fn put(&self, id: PutId) -> &Put {
        &self.puts[id.0]
    }

    /// Handle of `node`'s input `name`.
    pub fn input(&self, node: &str, name: &str) -> Result<PutId> {
        self.node(node)?.input(name)
    }

    /// Handle of `node`'s output `name`.
    pub fn output(&self, node: &str, name: &str) -> Result<PutId> {
        self.node(node)?.output(name)
    }

    /// Current state of a put.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not issued by this graph.
    pub fn put_state(&self, id: PutId) -> PutState {
        self.puts[id.0].state()
    }

    /// Current state of a beam.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not issued by this graph.
    pub fn beam_state(&self, id: BeamId) -> BeamState {
        self.beams[id.0].state()
    }

    /// Nodes in name order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.node_index.values().map(|&id| (id, &self.nodes[id.0]))
    }

    /// Beams in name order.
    pub fn beams(&self) -> impl Iterator<Item = (BeamId, &Beam)> + '_ {
        self.beam_index.values().map(|&id| (id, &self.beams[id.0]))
    }

    /// Every put, in creation order.
    pub fn puts(&self) -> impl Iterator<Item = (PutId, &Put)> + '_ {
        self.puts.iter().enumerate().map(|(i, p)| (PutId(i), p))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn beam_count(&self) -> usize {
        self.beams.len()
    }

    pub fn put_count(&self) -> usize {
        self.puts.len()
    }
}
