//! instgraph command line
//!
//! Load a graph, apply stimuli, report the settled states.

mod cli;
mod stimulus;

use std::collections::HashMap;
use std::fmt::Write as _;

use anyhow::{bail, Context, Result};
use clap::Parser;
use instgraph_core::{Graph, StateChange};
use instgraph_loader::{load_file, DiagramAnnotator, LoaderConfig, Palette};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "instgraph=info,instgraph_core=info,instgraph_loader=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run(Cli::parse())
}

fn run(cli: Cli) -> Result<()> {
    let palette = Palette::new(&cli.off_color, &cli.on_color, &cli.intermediate_color)
        .context("invalid color option")?;

    let loaded = load_file(&cli.file, cli.format.map(Into::into), &LoaderConfig::default())
        .with_context(|| format!("failed to load {}", cli.file.display()))?;
    let mut graph = loaded.graph;

    let annotator = match (cli.annotate.is_some(), loaded.diagram) {
        (true, Some(diagram)) => Some(DiagramAnnotator::new(diagram, palette)),
        (true, None) => bail!("--annotate needs a drawio input"),
        (false, _) => None,
    };

    if cli.trace {
        let names = NameTable::new(&graph);
        graph.observe(move |change: &StateChange| println!("{}", names.describe(change)));
    }

    for stimulus in &cli.stimuli {
        info!(%stimulus, "applying stimulus");
        stimulus
            .apply(&mut graph)
            .with_context(|| format!("failed to apply {stimulus}"))?;
    }

    if cli.json {
        let snapshot = graph.snapshot();
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", report(&graph));
    }

    if let (Some(annotator), Some(path)) = (annotator, cli.annotate.as_ref()) {
        annotator
            .write(&graph, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "wrote annotated diagram");
    }

    Ok(())
}

/// Handle-to-name lookup for printing change events without the graph.
struct NameTable {
    puts: HashMap<instgraph_core::PutId, String>,
    beams: HashMap<instgraph_core::BeamId, String>,
}

impl NameTable {
    fn new(graph: &Graph) -> Self {
        Self {
            puts: graph
                .puts()
                .map(|(id, put)| (id, put.qualified_name()))
                .collect(),
            beams: graph
                .beams()
                .map(|(id, beam)| (id, beam.name().to_string()))
                .collect(),
        }
    }

    fn describe(&self, change: &StateChange) -> String {
        match change {
            StateChange::Put { put, from, to } => {
                let name = self.puts.get(put).map_or("?", String::as_str);
                format!("put  {name}: {from} -> {to}")
            }
            StateChange::Beam { beam, from, to } => {
                let name = self.beams.get(beam).map_or("?", String::as_str);
                format!("beam {name}: {from} -> {to}")
            }
        }
    }
}

/// Plain-text state listing: beams, then puts, each in name order.
fn report(graph: &Graph) -> String {
    let mut out = String::new();
    for (_, beam) in graph.beams() {
        let _ = writeln!(out, "beam {:<24} {}", beam.name(), beam.state());
    }
    for (_, node) in graph.nodes() {
        for id in node.puts() {
            let put = graph.put(id);
            let _ = writeln!(out, "put  {:<24} {}", put.qualified_name(), put.state());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use instgraph_core::{Direction, PutKind, PutState};

    fn pair() -> Graph {
        let mut graph = Graph::new();
        let a = graph.add_node("a");
        let b = graph.add_node("b");
        let beam = graph.add_beam("ab");
        graph
            .add_put(a, Direction::Output, "out", PutKind::Light, Some(beam))
            .unwrap();
        graph
            .add_put(b, Direction::Input, "in", PutKind::Light, Some(beam))
            .unwrap();
        graph.finalize().unwrap();
        graph
    }

    #[test]
    fn report_lists_beams_then_puts() {
        let mut graph = pair();
        graph.set_output("a", "out", PutState::On).unwrap();
        let text = report(&graph);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("beam ab"));
        assert!(lines[0].ends_with("int"));
        assert!(lines[1].starts_with("put  o:a:out"));
        assert!(lines[1].ends_with("on"));
        assert!(lines[2].ends_with("off"));
    }

    #[test]
    fn names_describe_changes() {
        let graph = pair();
        let names = NameTable::new(&graph);
        let out = graph.output("a", "out").unwrap();
        let change = StateChange::Put {
            put: out,
            from: PutState::Off,
            to: PutState::On,
        };
        assert_eq!(names.describe(&change), "put  o:a:out: off -> on");
    }
}
