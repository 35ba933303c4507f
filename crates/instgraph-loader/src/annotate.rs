//! Recoloring a diagram to mirror graph state.
//!
//! Each put and beam cell gets its `strokeColor` and `fontColor` set from the
//! [`Palette`]; every other byte of the document passes through unchanged.

use std::collections::HashMap;
use std::path::Path;

use instgraph_core::Graph;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use tracing::debug;

use crate::config::Palette;
use crate::drawio::Diagram;
use crate::error::Result;

/// Writes the current state of a graph into the diagram it was loaded from.
#[derive(Debug, Clone)]
pub struct DiagramAnnotator {
    diagram: Diagram,
    palette: Palette,
}

impl DiagramAnnotator {
    pub fn new(diagram: Diagram, palette: Palette) -> Self {
        Self { diagram, palette }
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Color of every mapped cell for the graph's current state, keyed by cell id.
    pub fn colors(&self, graph: &Graph) -> HashMap<&str, &str> {
        let puts = self
            .diagram
            .put_cells()
            .map(|(put, cell)| (cell, self.palette.put_color(graph.put_state(put))));
        let beams = self
            .diagram
            .beam_cells()
            .map(|(beam, cell)| (cell, self.palette.beam_color(graph.beam_state(beam))));
        puts.chain(beams).collect()
    }

    /// The diagram document with every mapped cell recolored.
    pub fn render(&self, graph: &Graph) -> Result<String> {
        let colors = self.colors(graph);
        let mut reader = Reader::from_str(self.diagram.xml());
        let mut writer = Writer::new(Vec::new());
        let mut recolored = 0usize;

        loop {
            match reader.read_event()? {
                Event::Eof => break,
                Event::Start(e) => match recolor(&e, &colors)? {
                    Some(cell) => {
                        recolored += 1;
                        writer.write_event(Event::Start(cell))?;
                    }
                    None => writer.write_event(Event::Start(e))?,
                },
                Event::Empty(e) => match recolor(&e, &colors)? {
                    Some(cell) => {
                        recolored += 1;
                        writer.write_event(Event::Empty(cell))?;
                    }
                    None => writer.write_event(Event::Empty(e))?,
                },
                event => writer.write_event(event)?,
            }
        }

        debug!(cells = recolored, "recolored diagram");
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }

    /// Render and write the diagram to `path`.
    pub fn write(&self, graph: &Graph, path: impl AsRef<Path>) -> Result<()> {
        let xml = self.render(graph)?;
        std::fs::write(path.as_ref(), xml)?;
        Ok(())
    }
}

/// A recolored copy of `e` if it is an `mxCell` with a mapped id.
fn recolor(e: &BytesStart<'_>, colors: &HashMap<&str, &str>) -> Result<Option<BytesStart<'static>>> {
    if e.name().as_ref() != b"mxCell" {
        return Ok(None);
    }
    let Some(id) = e.try_get_attribute("id")? else {
        return Ok(None);
    };
    let id = id.unescape_value()?;
    let Some(&color) = colors.get(id.as_ref()) else {
        return Ok(None);
    };

    let mut cell = BytesStart::new("mxCell");
    let mut styled = false;
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"style" {
            let style = recolor_style(&attr.unescape_value()?, color);
            cell.push_attribute(("style", style.as_str()));
            styled = true;
        } else {
            cell.push_attribute(attr);
        }
    }
    if !styled {
        cell.push_attribute(("style", recolor_style("", color).as_str()));
    }
    Ok(Some(cell))
}

/// Set `strokeColor` and `fontColor` in a drawio style string.
///
/// Other entries keep their order; missing color entries are appended.
pub fn recolor_style(style: &str, color: &str) -> String {
    let mut entries = Vec::new();
    let mut stroke = false;
    let mut font = false;

    for entry in style.split(';').filter(|e| !e.is_empty()) {
        match entry.split_once('=') {
            Some(("strokeColor", _)) => {
                entries.push(format!("strokeColor=#{color}"));
                stroke = true;
            }
            Some(("fontColor", _)) => {
                entries.push(format!("fontColor=#{color}"));
                font = true;
            }
            _ => entries.push(entry.to_string()),
        }
    }
    if !stroke {
        entries.push(format!("strokeColor=#{color}"));
    }
    if !font {
        entries.push(format!("fontColor=#{color}"));
    }

    let mut style = entries.join(";");
    style.push(';');
    style
}
