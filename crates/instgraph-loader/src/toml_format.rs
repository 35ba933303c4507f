//! TOML graph descriptions.
//!
//! ```toml
//! [[nodes]]
//! name = "source"
//! outputs = [{ name = "out", beam = "source2relay" }]
//!
//! [[nodes]]
//! name = "relay"
//! inputs = [{ name = "in", beam = "source2relay", outputLinks = ["out"] }]
//! outputs = [{ name = "out", beam = "relay2sink", kind = "light" }]
//! ```
//!
//! Beams are created on first mention and completed by their second. Inputs
//! may also carry `offLinks`.

use std::path::Path;

use instgraph_core::{Direction, Graph, NodeId, PutKind};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::LoaderConfig;
use crate::error::{LoadError, Result};

#[derive(Debug, Deserialize)]
struct Description {
    #[serde(default)]
    nodes: Vec<NodeRecord>,
}

#[derive(Debug, Deserialize)]
struct NodeRecord {
    name: Option<String>,
    #[serde(default)]
    outputs: Vec<PutRecord>,
    #[serde(default)]
    inputs: Vec<PutRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PutRecord {
    name: Option<String>,
    beam: Option<String>,
    kind: Option<String>,
    #[serde(default)]
    output_links: Vec<String>,
    #[serde(default)]
    off_links: Vec<String>,
}

/// Build a graph from a TOML description.
pub fn parse_toml(input: &str, config: &LoaderConfig) -> Result<Graph> {
    let description: Description = toml::from_str(input)?;
    let mut graph = Graph::new();

    for (index, record) in description.nodes.iter().enumerate() {
        let Some(name) = record.name.as_deref() else {
            warn!(index, "node has no name, skipping");
            continue;
        };
        let node = graph.add_node(name);
        debug!(
            node = name,
            outputs = record.outputs.len(),
            inputs = record.inputs.len(),
            "loading node"
        );

        for (i, put) in record.outputs.iter().enumerate() {
            add_put(&mut graph, node, name, Direction::Output, i, put, config)?;
        }
        for (i, put) in record.inputs.iter().enumerate() {
            add_put(&mut graph, node, name, Direction::Input, i, put, config)?;
        }
    }

    if config.finalize {
        graph.finalize()?;
    }
    info!(
        nodes = graph.node_count(),
        beams = graph.beam_count(),
        puts = graph.put_count(),
        "loaded TOML graph"
    );
    Ok(graph)
}

/// Read and build a graph from a TOML file.
pub fn load_toml(path: impl AsRef<Path>, config: &LoaderConfig) -> Result<Graph> {
    let input = std::fs::read_to_string(path.as_ref())?;
    parse_toml(&input, config)
}

fn add_put(
    graph: &mut Graph,
    node: NodeId,
    node_name: &str,
    direction: Direction,
    index: usize,
    record: &PutRecord,
    config: &LoaderConfig,
) -> Result<()> {
    let missing = |field| LoadError::MissingField {
        entity: format!("{direction} #{index} of node \"{node_name}\""),
        field,
    };
    let name = record.name.as_deref().ok_or_else(|| missing("name"))?;
    let beam = record.beam.as_deref().ok_or_else(|| missing("beam"))?;
    let kind = match record.kind.as_deref() {
        Some(kind) => kind.parse::<PutKind>()?,
        None => config.default_kind,
    };

    let beam = graph.add_beam(beam);
    let put = graph.add_put(node, direction, name, kind, Some(beam))?;

    for target in &record.output_links {
        graph.add_output_link(put, target)?;
    }
    for target in &record.off_links {
        graph.add_off_link(put, target)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use instgraph_core::{BeamState, GraphError, PutState};

    const RELAY: &str = r#"
        [[nodes]]
        name = "source"
        outputs = [{ name = "out", beam = "source2relay" }]

        [[nodes]]
        name = "relay"
        inputs = [{ name = "in", beam = "source2relay", outputLinks = ["out"] }]
        outputs = [{ name = "out", beam = "relay2sink" }]

        [[nodes]]
        name = "sink"
        inputs = [{ name = "in", beam = "relay2sink" }]
    "#;

    #[test]
    fn loads_relay_chain() {
        let mut graph = parse_toml(RELAY, &LoaderConfig::default()).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.beam_count(), 2);

        graph.set_output("source", "out", PutState::On).unwrap();
        graph.set_input("relay", "in", PutState::On).unwrap();
        assert_eq!(graph.beam("relay2sink").unwrap().state(), BeamState::Intermediate);
    }

    #[test]
    fn unnamed_nodes_are_skipped() {
        let input = r#"
            [[nodes]]
            outputs = [{ name = "out", beam = "b" }]

            [[nodes]]
            name = "kept"
        "#;
        let graph = parse_toml(input, &LoaderConfig::default()).unwrap();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.beam_count(), 0);
    }

    #[test]
    fn put_without_beam_is_an_error() {
        let input = r#"
            [[nodes]]
            name = "a"
            inputs = [{ name = "in" }]
        "#;
        let err = parse_toml(input, &LoaderConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::MissingField { field: "beam", .. }));
        assert_eq!(err.to_string(), "input #0 of node \"a\" has no beam");
    }

    #[test]
    fn put_without_name_is_an_error() {
        let input = r#"
            [[nodes]]
            name = "a"
            outputs = [{ beam = "b" }]
        "#;
        assert!(matches!(
            parse_toml(input, &LoaderConfig::default()),
            Err(LoadError::MissingField { field: "name", .. })
        ));
    }

    #[test]
    fn second_source_names_the_beam() {
        let input = r#"
            [[nodes]]
            name = "a"
            outputs = [{ name = "out", beam = "shared" }]

            [[nodes]]
            name = "b"
            outputs = [{ name = "out", beam = "shared" }]
        "#;
        assert!(matches!(
            parse_toml(input, &LoaderConfig::default()),
            Err(LoadError::Graph(GraphError::SourceConflict { beam })) if beam == "shared"
        ));
    }

    #[test]
    fn kinds_and_defaults() {
        let input = r#"
            [[nodes]]
            name = "psu"
            outputs = [{ name = "v12", beam = "mains", kind = "p" }]

            [[nodes]]
            name = "pump"
            inputs = [{ name = "power", beam = "mains" }]
        "#;
        let config = LoaderConfig::default().with_default_kind(PutKind::Power);
        let graph = parse_toml(input, &config).unwrap();
        let pump = graph.input("pump", "power").unwrap();
        assert_eq!(graph.put(pump).kind(), PutKind::Power);

        assert!(matches!(
            parse_toml(input, &LoaderConfig::default()),
            Err(LoadError::Graph(GraphError::KindMismatch { .. }))
        ));
    }

    #[test]
    fn off_links_and_deferred_finalize() {
        let input = r#"
            [[nodes]]
            name = "shutter"
            inputs = [
                { name = "light", beam = "in", outputLinks = ["out"] },
                { name = "close", beam = "ctl", offLinks = ["out"] },
            ]
            outputs = [{ name = "out", beam = "exit" }]
        "#;
        let mut graph = parse_toml(input, &LoaderConfig::default().without_finalize()).unwrap();
        assert!(matches!(
            graph.set_input("shutter", "light", PutState::On),
            Err(GraphError::NotFinalized(_))
        ));
        graph.finalize().unwrap();
        let out = graph.output("shutter", "out").unwrap();
        assert!(graph.put(out).is_off_linked());
        assert!(graph.put(out).is_forwarded_into());
    }

    #[test]
    fn malformed_toml() {
        assert!(matches!(
            parse_toml("[[nodes]\nname=", &LoaderConfig::default()),
            Err(LoadError::Toml(_))
        ));
    }
}
