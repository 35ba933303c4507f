//! drawio (mxGraph) diagrams as graph descriptions.
//!
//! Every `mxCell` directly under `mxGraphModel/root` whose id follows the
//! [`CellId`] grammar becomes a graph entity. Vertices (nodes and puts) are
//! applied before edges (beams and links), so a beam may appear in the file
//! before the puts it joins. Beam edges run from an output cell to an input
//! cell; link edges run from an input cell to an output cell on the same node.

use std::collections::BTreeMap;
use std::path::Path;

use instgraph_core::{BeamId, Direction, Graph, PutId};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, info};

use crate::cell_id::CellId;
use crate::config::LoaderConfig;
use crate::error::{LoadError, Result};

/// A loaded diagram: the document text and the cell drawing each put and beam.
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    pub(crate) xml: String,
    pub(crate) put_cells: BTreeMap<PutId, String>,
    pub(crate) beam_cells: BTreeMap<BeamId, String>,
}

impl Diagram {
    /// The document as loaded.
    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// Id of the cell drawing a put, if the diagram has one.
    pub fn put_cell(&self, put: PutId) -> Option<&str> {
        self.put_cells.get(&put).map(String::as_str)
    }

    /// Id of the edge drawing a beam.
    pub fn beam_cell(&self, beam: BeamId) -> Option<&str> {
        self.beam_cells.get(&beam).map(String::as_str)
    }

    pub fn put_cells(&self) -> impl Iterator<Item = (PutId, &str)> + '_ {
        self.put_cells.iter().map(|(&id, cell)| (id, cell.as_str()))
    }

    pub fn beam_cells(&self) -> impl Iterator<Item = (BeamId, &str)> + '_ {
        self.beam_cells.iter().map(|(&id, cell)| (id, cell.as_str()))
    }
}

#[derive(Debug)]
struct RawCell {
    id: String,
    source: Option<String>,
    target: Option<String>,
}

/// Build a graph from a drawio document.
pub fn parse_drawio(input: &str, config: &LoaderConfig) -> Result<(Graph, Diagram)> {
    let cells = read_cells(input)?;
    let mut graph = Graph::new();
    let mut diagram = Diagram {
        xml: input.to_string(),
        ..Diagram::default()
    };

    let mut edges = Vec::new();
    for cell in &cells {
        let Some(entity) = CellId::parse(&cell.id)? else {
            continue;
        };
        match entity {
            CellId::Node { name } => {
                graph.add_node(&name);
            }
            CellId::Put {
                direction,
                kind,
                node,
                name,
            } => {
                let node = graph.add_node(&node);
                let put = graph.add_put(node, direction, &name, kind, None)?;
                diagram.put_cells.insert(put, cell.id.clone());
            }
            edge => edges.push((cell, edge)),
        }
    }

    for (cell, entity) in edges {
        match entity {
            CellId::Beam { name } => {
                let source = endpoint(&graph, cell, "source", Direction::Output)?;
                let dest = endpoint(&graph, cell, "target", Direction::Input)?;
                let beam = graph.add_beam(&name);
                graph.connect(beam, source, dest)?;
                diagram.beam_cells.insert(beam, cell.id.clone());
            }
            CellId::Link { .. } => {
                let (input, output) = link_ends(&graph, cell)?;
                graph.add_output_link(input, &output)?;
            }
            CellId::OffLink { .. } => {
                let (input, output) = link_ends(&graph, cell)?;
                graph.add_off_link(input, &output)?;
            }
            CellId::Node { .. } | CellId::Put { .. } => {}
        }
    }

    if config.finalize {
        graph.finalize()?;
    }
    info!(
        nodes = graph.node_count(),
        beams = graph.beam_count(),
        puts = graph.put_count(),
        "loaded drawio graph"
    );
    Ok((graph, diagram))
}

/// Read and build a graph from a drawio file.
pub fn load_drawio(path: impl AsRef<Path>, config: &LoaderConfig) -> Result<(Graph, Diagram)> {
    let input = std::fs::read_to_string(path.as_ref())?;
    parse_drawio(&input, config)
}

/// Collect the cells under `mxGraphModel/root`, in document order.
fn read_cells(input: &str) -> Result<Vec<RawCell>> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(true);

    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut found_root = false;
    let mut cells = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                visit(&e, &path, &mut found_root, &mut cells)?;
                path.push(e.name().as_ref().to_vec());
            }
            Event::Empty(e) => visit(&e, &path, &mut found_root, &mut cells)?,
            Event::End(_) => {
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !found_root {
        return Err(LoadError::NoDiagramRoot);
    }
    debug!(cells = cells.len(), "read diagram cells");
    Ok(cells)
}

fn visit(
    e: &BytesStart<'_>,
    path: &[Vec<u8>],
    found_root: &mut bool,
    cells: &mut Vec<RawCell>,
) -> Result<()> {
    let name = e.name();
    match path {
        [.., parent] if parent == b"mxGraphModel" && name.as_ref() == b"root" => {
            *found_root = true;
        }
        [.., model, root]
            if model == b"mxGraphModel" && root == b"root" && name.as_ref() == b"mxCell" =>
        {
            if let Some(cell) = raw_cell(e)? {
                cells.push(cell);
            }
        }
        _ => {}
    }
    Ok(())
}

fn raw_cell(e: &BytesStart<'_>) -> Result<Option<RawCell>> {
    let mut id = None;
    let mut source = None;
    let mut target = None;
    for attr in e.attributes() {
        let attr = attr?;
        let slot = match attr.key.as_ref() {
            b"id" => &mut id,
            b"source" => &mut source,
            b"target" => &mut target,
            _ => continue,
        };
        *slot = Some(attr.unescape_value()?.into_owned());
    }

    Ok(id.map(|id| RawCell { id, source, target }))
}

/// Resolve the put referenced by an edge's `source` or `target` attribute.
fn endpoint(
    graph: &Graph,
    cell: &RawCell,
    attr: &'static str,
    expected: Direction,
) -> Result<PutId> {
    let reference = match attr {
        "source" => cell.source.as_deref(),
        _ => cell.target.as_deref(),
    }
    .ok_or_else(|| LoadError::MissingField {
        entity: format!("edge \"{}\"", cell.id),
        field: attr,
    })?;

    let (direction, _, node, name) = CellId::parse_put(reference)?;
    if direction != expected {
        return Err(LoadError::cell(
            &cell.id,
            format!("{attr} \"{reference}\" is not an {expected}"),
        ));
    }
    Ok(graph.node(&node)?.put(direction, &name)?)
}

/// Input handle and output name for a link edge.
fn link_ends(graph: &Graph, cell: &RawCell) -> Result<(PutId, String)> {
    let handle = endpoint(graph, cell, "source", Direction::Input)?;
    let output = endpoint(graph, cell, "target", Direction::Output)?;
    let (input, output) = (graph.put(handle), graph.put(output));

    if input.node() != output.node() {
        return Err(LoadError::LinkAcrossNodes {
            link: cell.id.clone(),
            input_node: input.node_name().to_string(),
            output_node: output.node_name().to_string(),
        });
    }
    Ok((handle, output.name().to_string()))
}
