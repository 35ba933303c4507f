//! Inputs and outputs ("puts") of a node.
//!
//! A put is one terminal on a node. It holds a [`PutState`], knows the beam
//! attached to it (if any), and, for inputs, the names of the sibling outputs
//! it forwards into. Puts live in the graph's arena and are addressed by
//! [`PutId`]; every cross reference (put to beam, put to node) is a handle,
//! never a pointer.

use std::collections::BTreeSet;
use std::fmt;

use crate::beam::BeamId;
use crate::error::{GraphError, Result};
use crate::node::NodeId;
use crate::types::{BeamState, Direction, PutKind, PutState};

/// Stable handle to a put inside a [`Graph`](crate::Graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PutId(pub(crate) usize);

impl PutId {
    /// Position of the put in the graph's arena.
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for PutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "put#{}", self.0)
    }
}

/// An input or output terminal on a node.
#[derive(Debug, Clone)]
pub struct Put {
    node: NodeId,
    node_name: String,
    direction: Direction,
    name: String,
    kind: PutKind,
    state: PutState,
    beam: Option<BeamId>,
    /// Sibling outputs this input mirrors into (inputs only)
    output_links: BTreeSet<String>,
    /// Sibling outputs this input holds off while it is on (inputs only)
    off_links: BTreeSet<String>,
    /// Set on outputs that at least one sibling input links into
    forwarded_into: bool,
    /// Set on outputs that at least one sibling input off-links into
    off_linked: bool,
}

impl Put {
    pub(crate) fn new(
        node: NodeId,
        node_name: &str,
        direction: Direction,
        name: &str,
        kind: PutKind,
    ) -> Self {
        Self {
            node,
            node_name: node_name.to_string(),
            direction,
            name: name.to_string(),
            kind,
            state: PutState::Off,
            beam: None,
            output_links: BTreeSet::new(),
            off_links: BTreeSet::new(),
            forwarded_into: false,
            off_linked: false,
        }
    }

    /// The owning node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Name of the owning node.
    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_input(&self) -> bool {
        self.direction == Direction::Input
    }

    pub fn is_output(&self) -> bool {
        self.direction == Direction::Output
    }

    /// Local name, unique within the node for this direction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key of the put within its node's input or output collection.
    pub fn key(&self) -> &str {
        &self.name
    }

    /// Fully qualified name in compact identifier form, e.g. `i:relay:in`.
    pub fn qualified_name(&self) -> String {
        format!("{}:{}:{}", self.direction.as_char(), self.node_name, self.name)
    }

    pub fn kind(&self) -> PutKind {
        self.kind
    }

    /// Current state.
    pub fn state(&self) -> PutState {
        self.state
    }

    /// True if a beam is attached.
    pub fn has_beam(&self) -> bool {
        self.beam.is_some()
    }

    /// The attached beam, or [`GraphError::BeamNotSet`] if none is attached.
    pub fn beam(&self) -> Result<BeamId> {
        self.beam
            .ok_or_else(|| GraphError::BeamNotSet(self.qualified_name()))
    }

    pub(crate) fn beam_opt(&self) -> Option<BeamId> {
        self.beam
    }

    pub(crate) fn set_beam(&mut self, beam: BeamId) {
        self.beam = Some(beam);
    }

    /// Outputs on the same node this input forwards into.
    pub fn output_links(&self) -> &BTreeSet<String> {
        &self.output_links
    }

    /// Outputs on the same node this input suppresses while on.
    pub fn off_links(&self) -> &BTreeSet<String> {
        &self.off_links
    }

    /// True if this input forwards into `output`.
    pub fn links_to(&self, output: &str) -> bool {
        self.output_links.contains(output)
    }

    /// True if this input off-links into `output`.
    pub fn off_links_to(&self, output: &str) -> bool {
        self.off_links.contains(output)
    }

    /// True on outputs driven by the node's link forwarding.
    pub fn is_forwarded_into(&self) -> bool {
        self.forwarded_into
    }

    /// True on outputs that an off-link can hold off.
    pub fn is_off_linked(&self) -> bool {
        self.off_linked
    }

    pub(crate) fn set_link_flags(&mut self, forwarded_into: bool, off_linked: bool) {
        self.forwarded_into = forwarded_into;
        self.off_linked = off_linked;
    }

    /// Declare that this input forwards into the sibling output `target`.
    pub(crate) fn add_output_link(&mut self, target: &str) -> Result<()> {
        self.require_input("output link", target)?;
        self.output_links.insert(target.to_string());
        Ok(())
    }

    /// Declare that this input holds the sibling output `target` off.
    pub(crate) fn add_off_link(&mut self, target: &str) -> Result<()> {
        self.require_input("off link", target)?;
        self.off_links.insert(target.to_string());
        Ok(())
    }

    fn require_input(&self, what: &str, target: &str) -> Result<()> {
        if self.direction != Direction::Input {
            return Err(GraphError::InvalidOperation(format!(
                "attempt to add {what} \"{target}\" to output {}",
                self.qualified_name()
            )));
        }
        Ok(())
    }

    /// Decide what a requested state becomes once stored on this put.
    ///
    /// `beam` is the current state of the attached beam, `suppressed` is
    /// true while an off-link holds this output off. Returns `None` when the
    /// request must be ignored: a forwarded output only moves through its
    /// node's link forwarding.
    pub fn admit(
        &self,
        requested: PutState,
        beam: Option<BeamState>,
        via_link: bool,
        suppressed: bool,
    ) -> Option<PutState> {
        match self.direction {
            Direction::Input => {
                // An input cannot be on when nothing feeds it.
                if requested == PutState::On && beam == Some(BeamState::Off) {
                    Some(PutState::Waiting)
                } else {
                    Some(requested)
                }
            }
            Direction::Output => {
                if self.forwarded_into && !via_link {
                    None
                } else if suppressed {
                    Some(PutState::Off)
                } else {
                    Some(requested)
                }
            }
        }
    }

    /// Store a state. Returns the previous state if the value changed.
    pub(crate) fn store(&mut self, state: PutState) -> Option<PutState> {
        if self.state == state {
            return None;
        }
        let previous = self.state;
        self.state = state;
        Some(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> Put {
        Put::new(NodeId(0), "relay", Direction::Input, "in", PutKind::Light)
    }

    fn output() -> Put {
        Put::new(NodeId(0), "relay", Direction::Output, "out", PutKind::Light)
    }

    #[test]
    fn new_put_is_off_and_unattached() {
        let put = input();
        assert_eq!(put.state(), PutState::Off);
        assert!(!put.has_beam());
        assert!(matches!(put.beam(), Err(GraphError::BeamNotSet(_))));
        assert_eq!(put.qualified_name(), "i:relay:in");
        assert_eq!(put.key(), "in");
    }

    #[test]
    fn input_on_downgrades_to_waiting_when_beam_off() {
        let put = input();
        assert_eq!(
            put.admit(PutState::On, Some(BeamState::Off), false, false),
            Some(PutState::Waiting)
        );
        assert_eq!(
            put.admit(PutState::On, Some(BeamState::Intermediate), false, false),
            Some(PutState::On)
        );
        // No beam at all: nothing to starve it.
        assert_eq!(put.admit(PutState::On, None, false, false), Some(PutState::On));
    }

    #[test]
    fn forwarded_output_ignores_external_set() {
        let mut put = output();
        put.set_link_flags(true, false);
        assert_eq!(put.admit(PutState::On, None, false, false), None);
        assert_eq!(put.admit(PutState::On, None, true, false), Some(PutState::On));
    }

    #[test]
    fn suppressed_output_is_forced_off() {
        let mut put = output();
        put.set_link_flags(false, true);
        assert_eq!(put.admit(PutState::On, None, false, true), Some(PutState::Off));
        assert_eq!(put.admit(PutState::On, None, false, false), Some(PutState::On));
    }

    #[test]
    fn links_only_on_inputs() {
        let mut put = input();
        put.add_output_link("out").unwrap();
        put.add_off_link("aux").unwrap();
        assert!(put.links_to("out"));
        assert!(put.off_links_to("aux"));

        let mut out = output();
        assert!(matches!(
            out.add_output_link("x"),
            Err(GraphError::InvalidOperation(_))
        ));
        assert!(matches!(
            out.add_off_link("x"),
            Err(GraphError::InvalidOperation(_))
        ));
    }

    #[test]
    fn store_reports_changes_only() {
        let mut put = input();
        assert_eq!(put.store(PutState::Off), None);
        assert_eq!(put.store(PutState::On), Some(PutState::Off));
        assert_eq!(put.store(PutState::On), None);
    }
}
