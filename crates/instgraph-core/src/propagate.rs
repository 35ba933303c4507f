//! The cascading update.
//!
//! A stimulus on one put recurses synchronously through beams and node links
//! until nothing changes:
//!
//! ```text
//! put.set ──► (changed?) ──► observers
//!                       ├──► node: recompute each linked output ──► put.set ...
//!                       └──► beam: re-evaluate ──► (changed?) ──► dest put.set ...
//! ```
//!
//! Every mutator stops as soon as the value it would store equals the value
//! already stored. That gate is what terminates the recursion on an acyclic
//! topology, and what keeps a repeated stimulus from firing observers twice.

use tracing::{trace, warn};

use crate::beam::{self, BeamId, DestEffect};
use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::node::{aggregate, NodeId};
use crate::observer::StateChange;
use crate::put::PutId;
use crate::types::PutState;

/// Where an assignment comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// A caller outside the cascade
    External,
    /// The put's own beam pushing into its dest; must not re-enter the beam
    Beam,
    /// The owning node's link forwarding
    Link,
}

impl Graph {
    /// Set the state of a put and propagate the change through the graph.
    ///
    /// The stored value may differ from `state`: an input turned on while its
    /// beam is off becomes `Waiting`, an off-linked output held off by a
    /// sibling input stays `Off`, and a forwarded output ignores the call
    /// entirely.
    ///
    /// Fails with [`GraphError::NotFinalized`] if any node has puts or links
    /// added since its last [`update_output_links`](Graph::update_output_links).
    ///
    /// # Panics
    ///
    /// Panics if the handle was not issued by this graph.
    pub fn set_state(&mut self, put: PutId, state: PutState) -> Result<()> {
        self.require_finalized()?;
        self.assign(put, state, Origin::External);
        Ok(())
    }

    /// Set `node`'s input `name`. See [`set_state`](Self::set_state).
    pub fn set_input(&mut self, node: &str, name: &str, state: PutState) -> Result<()> {
        let put = self.input(node, name)?;
        self.set_state(put, state)
    }

    /// Set `node`'s output `name`. See [`set_state`](Self::set_state).
    pub fn set_output(&mut self, node: &str, name: &str, state: PutState) -> Result<()> {
        let put = self.output(node, name)?;
        self.set_state(put, state)
    }

    /// Re-evaluate a beam from its endpoints and propagate any change.
    ///
    /// Idempotent: on a settled graph this does nothing.
    pub fn recompute_beam(&mut self, beam: BeamId) -> Result<()> {
        self.require_finalized()?;
        self.cascade_beam(beam);
        Ok(())
    }

    /// Recompute a forwarded output from the inputs linked to it.
    pub fn recompute_forwarded_output(&mut self, node: NodeId, output: &str) -> Result<()> {
        self.require_finalized()?;
        self.node_at(node).output(output)?;
        self.cascade_link(node, output);
        Ok(())
    }

    fn require_finalized(&self) -> Result<()> {
        match self.nodes.iter().find(|n| !n.is_finalized()) {
            Some(node) => Err(GraphError::NotFinalized(node.name().to_string())),
            None => Ok(()),
        }
    }

    /// True while an input off-linked to `output` is on.
    fn is_suppressed(&self, node: NodeId, output: &str) -> bool {
        self.nodes[node.0]
            .inputs()
            .values()
            .map(|&id| &self.puts[id.0])
            .any(|input| input.off_links_to(output) && input.state() == PutState::On)
    }

    fn assign(&mut self, put: PutId, requested: PutState, origin: Origin) {
        let p = &self.puts[put.0];
        let beam = p.beam_opt();
        let beam_state = beam.map(|b| self.beams[b.0].state());
        let suppressed = p.is_off_linked() && self.is_suppressed(p.node(), p.name());

        let Some(state) = p.admit(requested, beam_state, origin == Origin::Link, suppressed) else {
            trace!(put = %p.qualified_name(), requested = %requested, "forwarded output ignores direct set");
            return;
        };

        let Some(from) = self.puts[put.0].store(state) else {
            return;
        };

        let p = &self.puts[put.0];
        trace!(put = %p.qualified_name(), %from, to = %state, "put state");
        self.notify(StateChange::Put {
            put,
            from,
            to: state,
        });

        let p = &self.puts[put.0];
        if p.is_input() {
            let node = p.node();
            let mut targets: Vec<String> = p
                .output_links()
                .iter()
                .chain(p.off_links())
                .cloned()
                .collect();
            targets.sort();
            targets.dedup();
            for target in targets {
                self.cascade_link(node, &target);
            }
        }

        if origin != Origin::Beam {
            if let Some(beam) = beam {
                self.cascade_beam(beam);
            }
        }
    }

    fn cascade_link(&mut self, node: NodeId, output: &str) {
        let n = &self.nodes[node.0];
        let Some(&target) = n.outputs().get(output) else {
            warn!(node = n.name(), output, "link names a missing output");
            return;
        };

        let suppressed = self.is_suppressed(node, output);
        let forwarded = self.puts[target.0].is_forwarded_into();

        let state = if suppressed {
            PutState::Off
        } else if forwarded {
            aggregate(
                n.inputs()
                    .values()
                    .map(|&id| &self.puts[id.0])
                    .filter(|input| input.links_to(output))
                    .map(|input| input.state()),
            )
        } else {
            // Plain output no longer held off: keeps whatever it has.
            return;
        };

        self.assign(target, state, Origin::Link);
    }

    pub(crate) fn cascade_beam(&mut self, id: BeamId) {
        let b = &self.beams[id.0];
        let source = b.source_opt().map(|p| self.puts[p.0].state());
        let dest = b.dest_opt();
        let evaluation = beam::evaluate(source, dest.map(|p| self.puts[p.0].state()));

        let Some(from) = self.beams[id.0].store(evaluation.state) else {
            return;
        };

        trace!(beam = self.beams[id.0].name(), %from, to = %evaluation.state, "beam state");
        self.notify(StateChange::Beam {
            beam: id,
            from,
            to: evaluation.state,
        });

        let Some(dest) = dest else { return };
        match evaluation.dest {
            DestEffect::Keep => {}
            DestEffect::Starve => self.assign(dest, PutState::Waiting, Origin::Beam),
            DestEffect::Energize => self.assign(dest, PutState::On, Origin::Beam),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BeamState, Direction, PutKind};

    fn pair() -> (Graph, PutId, PutId, BeamId) {
        let mut graph = Graph::new();
        let a = graph.add_node("a");
        let b = graph.add_node("b");
        let beam = graph.add_beam("ab");
        let out = graph
            .add_put(a, Direction::Output, "out", PutKind::Light, Some(beam))
            .unwrap();
        let inp = graph
            .add_put(b, Direction::Input, "in", PutKind::Light, Some(beam))
            .unwrap();
        graph.finalize().unwrap();
        (graph, out, inp, beam)
    }

    #[test]
    fn stimulus_requires_finalized_graph() {
        let mut graph = Graph::new();
        let n = graph.add_node("n");
        let p = graph
            .add_put(n, Direction::Input, "in", PutKind::Light, None)
            .unwrap();
        assert_eq!(
            graph.set_state(p, PutState::On),
            Err(GraphError::NotFinalized("n".into()))
        );
        graph.finalize().unwrap();
        graph.set_state(p, PutState::On).unwrap();
        assert_eq!(graph.put_state(p), PutState::On);
    }

    #[test]
    fn source_on_with_dest_off_is_intermediate() {
        let (mut graph, out, inp, beam) = pair();
        graph.set_state(out, PutState::On).unwrap();
        assert_eq!(graph.beam_state(beam), BeamState::Intermediate);
        assert_eq!(graph.put_state(inp), PutState::Off);
    }

    #[test]
    fn dest_waits_then_energizes() {
        let (mut graph, out, inp, beam) = pair();
        graph.set_state(inp, PutState::On).unwrap();
        assert_eq!(graph.put_state(inp), PutState::Waiting);
        assert_eq!(graph.beam_state(beam), BeamState::Off);

        graph.set_state(out, PutState::On).unwrap();
        assert_eq!(graph.beam_state(beam), BeamState::On);
        assert_eq!(graph.put_state(inp), PutState::On);
    }

    #[test]
    fn source_off_starves_dest() {
        let (mut graph, out, inp, beam) = pair();
        graph.set_state(out, PutState::On).unwrap();
        graph.set_state(inp, PutState::On).unwrap();
        assert_eq!(graph.beam_state(beam), BeamState::On);

        graph.set_state(out, PutState::Off).unwrap();
        assert_eq!(graph.beam_state(beam), BeamState::Off);
        assert_eq!(graph.put_state(inp), PutState::Waiting);

        graph.set_state(out, PutState::Waiting).unwrap();
        assert_eq!(graph.put_state(inp), PutState::Waiting);
    }

    #[test]
    fn dest_off_drops_beam_to_intermediate() {
        let (mut graph, out, inp, beam) = pair();
        graph.set_state(out, PutState::On).unwrap();
        graph.set_state(inp, PutState::On).unwrap();
        graph.set_state(inp, PutState::Off).unwrap();
        assert_eq!(graph.beam_state(beam), BeamState::Intermediate);
        assert_eq!(graph.put_state(out), PutState::On);
    }

    #[test]
    fn recompute_on_settled_graph_is_noop() {
        let (mut graph, out, _, beam) = pair();
        graph.set_state(out, PutState::On).unwrap();
        let log = crate::ChangeLog::new();
        graph.observe(log.clone());
        graph.recompute_beam(beam).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn recompute_forwarded_output_checks_name() {
        let (mut graph, _, _, _) = pair();
        let b = graph.node_id("b").unwrap();
        assert!(matches!(
            graph.recompute_forwarded_output(b, "nope"),
            Err(GraphError::OutputNotFound { .. })
        ));
    }
}
