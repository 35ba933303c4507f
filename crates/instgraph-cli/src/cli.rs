use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use instgraph_loader::Format;

use crate::stimulus::Stimulus;

#[derive(Parser, Debug)]
#[command(name = "instgraph")]
#[command(author = "instgraph contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Propagate on/off states through an instrument graph")]
#[command(long_about = r#"
Loads an instrument graph from a TOML description or a drawio diagram,
applies each --set stimulus in order, and prints the resulting put and
beam states.

EXAMPLES:
  # Switch on a source and the relay behind it
  instgraph demos/relay.toml --set o:source:out=on --set i:relay:in=on

  # Same, writing a recolored diagram
  instgraph demos/relay.drawio --set o:source:out=on --annotate out.drawio

ENVIRONMENT VARIABLES:
  RUST_LOG        Log filter (default: info for the instgraph crates)
"#)]
pub struct Cli {
    /// Graph description (.toml, .drawio or .xml)
    pub file: PathBuf,

    /// Stimulus to apply, as <put>=<state> (e.g. i:relay:in=on); repeatable
    #[arg(short, long = "set", value_name = "STIMULUS")]
    pub stimuli: Vec<Stimulus>,

    /// Override the format inferred from the file extension
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Print the final snapshot as JSON
    #[arg(long)]
    pub json: bool,

    /// Print every state change as it happens
    #[arg(long)]
    pub trace: bool,

    /// Write the recolored diagram here (drawio input only)
    #[arg(long, value_name = "PATH")]
    pub annotate: Option<PathBuf>,

    /// Color for off puts and beams
    #[arg(long, default_value = "FF0000")]
    pub off_color: String,

    /// Color for on puts and beams
    #[arg(long, default_value = "00FF00")]
    pub on_color: String,

    /// Color for waiting puts and intermediate beams
    #[arg(long, default_value = "FFFF00")]
    pub intermediate_color: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    Toml,
    Drawio,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Toml => Format::Toml,
            FormatArg::Drawio => Format::Drawio,
        }
    }
}
