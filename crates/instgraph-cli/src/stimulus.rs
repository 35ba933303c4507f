//! Command-line stimuli: `<put>=<state>`, e.g. `i:relay:in=on`.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context};
use instgraph_core::{Direction, Graph, PutState};
use instgraph_loader::CellId;

/// One external state assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stimulus {
    pub direction: Direction,
    pub node: String,
    pub name: String,
    pub state: PutState,
}

impl Stimulus {
    pub fn apply(&self, graph: &mut Graph) -> instgraph_core::Result<()> {
        match self.direction {
            Direction::Input => graph.set_input(&self.node, &self.name, self.state),
            Direction::Output => graph.set_output(&self.node, &self.name, self.state),
        }
    }
}

impl FromStr for Stimulus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let (target, state) = s
            .rsplit_once('=')
            .ok_or_else(|| anyhow!("expected <put>=<state>, got \"{s}\""))?;
        let (direction, _, node, name) =
            CellId::parse_put(target).with_context(|| format!("in stimulus \"{s}\""))?;
        let state = state
            .parse()
            .with_context(|| format!("in stimulus \"{s}\""))?;
        Ok(Self {
            direction,
            node,
            name,
            state,
        })
    }
}

impl fmt::Display for Stimulus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}={}",
            self.direction.as_char(),
            self.node,
            self.name,
            self.state
        )
    }
}
