//! Nodes: named containers of inputs and outputs.
//!
//! A node owns its puts (through the graph arena) and the intra-node
//! forwarding declared on them. An input may *output-link* into sibling
//! outputs, in which case those outputs follow the combined state of every
//! input linked to them; or it may *off-link* into sibling outputs, holding
//! them off while it is on.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{GraphError, Result};
use crate::put::PutId;
use crate::types::{Direction, PutState};

/// Stable handle to a node inside a [`Graph`](crate::Graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Combine the states of every input linked into one output.
///
/// `On` if any linked input is `On`, else `Waiting` if any is `Waiting`,
/// else `Off`. A later input turning off therefore never stomps an earlier
/// one that is still on. No linked inputs yields `Off`.
pub fn aggregate<I>(linked: I) -> PutState
where
    I: IntoIterator<Item = PutState>,
{
    linked.into_iter().max().unwrap_or(PutState::Off)
}

/// A named container of puts.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    inputs: BTreeMap<String, PutId>,
    outputs: BTreeMap<String, PutId>,
    finalized: bool,
}

impl Node {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            finalized: false,
        }
    }

    /// Unique name of the node.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &str {
        &self.name
    }

    /// Inputs keyed by local name.
    pub fn inputs(&self) -> &BTreeMap<String, PutId> {
        &self.inputs
    }

    /// Outputs keyed by local name.
    pub fn outputs(&self) -> &BTreeMap<String, PutId> {
        &self.outputs
    }

    /// Every put on the node, inputs first.
    pub fn puts(&self) -> impl Iterator<Item = PutId> + '_ {
        self.inputs.values().chain(self.outputs.values()).copied()
    }

    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.contains_key(name)
    }

    pub fn has_output(&self, name: &str) -> bool {
        self.outputs.contains_key(name)
    }

    /// Look up an input by name.
    pub fn input(&self, name: &str) -> Result<PutId> {
        self.inputs
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::InputNotFound {
                node: self.name.clone(),
                name: name.to_string(),
            })
    }

    /// Look up an output by name.
    pub fn output(&self, name: &str) -> Result<PutId> {
        self.outputs
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::OutputNotFound {
                node: self.name.clone(),
                name: name.to_string(),
            })
    }

    /// Look up a put by direction and name.
    pub fn put(&self, direction: Direction, name: &str) -> Result<PutId> {
        match direction {
            Direction::Input => self.input(name),
            Direction::Output => self.output(name),
        }
    }

    /// True once link flags have been computed and the node may propagate.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub(crate) fn set_finalized(&mut self, finalized: bool) {
        self.finalized = finalized;
    }

    /// Insert a put under its local name.
    ///
    /// Returns `Err` with the existing handle if the key is taken; the first
    /// insertion wins.
    pub(crate) fn insert(
        &mut self,
        direction: Direction,
        name: &str,
        put: PutId,
    ) -> std::result::Result<(), PutId> {
        let map = match direction {
            Direction::Input => &mut self.inputs,
            Direction::Output => &mut self.outputs,
        };
        if let Some(&existing) = map.get(name) {
            return Err(existing);
        }
        map.insert(name.to_string(), put);
        // New puts may carry or receive links.
        self.finalized = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use PutState::{Off, On, Waiting};

    #[test]
    fn aggregate_prefers_on_then_waiting() {
        assert_eq!(aggregate([On, Off]), On);
        assert_eq!(aggregate([Off, On]), On);
        assert_eq!(aggregate([Off, Waiting]), Waiting);
        assert_eq!(aggregate([Waiting, On, Off]), On);
        assert_eq!(aggregate([Off, Off]), Off);
        assert_eq!(aggregate(std::iter::empty()), Off);
    }

    #[test]
    fn lookup_is_explicit() {
        let mut node = Node::new("relay");
        node.insert(Direction::Input, "in", PutId(0)).unwrap();
        node.insert(Direction::Output, "in", PutId(1)).unwrap();

        assert_eq!(node.input("in").unwrap(), PutId(0));
        assert_eq!(node.output("in").unwrap(), PutId(1));
        assert!(matches!(
            node.input("out"),
            Err(GraphError::InputNotFound { .. })
        ));
        assert!(matches!(
            node.put(Direction::Output, "x"),
            Err(GraphError::OutputNotFound { .. })
        ));
    }

    #[test]
    fn duplicate_insert_keeps_first() {
        let mut node = Node::new("relay");
        node.insert(Direction::Input, "in", PutId(0)).unwrap();
        assert_eq!(node.insert(Direction::Input, "in", PutId(5)), Err(PutId(0)));
        assert_eq!(node.input("in").unwrap(), PutId(0));
        assert_eq!(node.inputs().len(), 1);
    }
}
