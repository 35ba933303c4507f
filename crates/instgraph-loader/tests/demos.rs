//! Loading the bundled demo descriptions from disk.

use std::path::PathBuf;

use instgraph_core::{BeamState, PutState};
use instgraph_loader::{load_file, DiagramAnnotator, Format, LoaderConfig, Palette};

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name)
}

#[test]
fn toml_and_drawio_relays_agree() {
    let config = LoaderConfig::default();
    let mut from_toml = load_file(demo("relay.toml"), None, &config).unwrap();
    let mut from_drawio = load_file(demo("relay.drawio"), None, &config).unwrap();
    assert!(from_toml.diagram.is_none());
    assert!(from_drawio.diagram.is_some());

    for loaded in [&mut from_toml, &mut from_drawio] {
        let graph = &mut loaded.graph;
        graph.set_output("source", "out", PutState::On).unwrap();
        graph.set_input("relay", "in", PutState::On).unwrap();
        graph.set_input("sink", "in", PutState::On).unwrap();
    }

    assert_eq!(from_toml.graph.snapshot(), from_drawio.graph.snapshot());
    assert_eq!(from_toml.graph.snapshot().beams_on(), 2);
}

#[test]
fn format_override() {
    // A TOML file read as drawio is not a diagram.
    let err = load_file(demo("relay.toml"), Some(Format::Drawio), &LoaderConfig::default());
    assert!(err.is_err());
}

#[test]
fn powered_shutter_bench() {
    let mut graph = load_file(demo("bench.toml"), None, &LoaderConfig::default())
        .unwrap()
        .graph;
    let camera = graph.input("camera", "in").unwrap();
    let to_camera = graph.beam_id("shutter2camera").unwrap();

    graph.set_output("psu", "laser", PutState::On).unwrap();
    graph.set_input("laser", "mains", PutState::On).unwrap();
    graph.set_input("shutter", "light", PutState::On).unwrap();
    graph.set_input("camera", "in", PutState::On).unwrap();
    assert_eq!(graph.put_state(camera), PutState::On);

    // Closing the shutter starves the camera.
    graph.set_output("psu", "shutter", PutState::On).unwrap();
    graph.set_input("shutter", "close", PutState::On).unwrap();
    assert_eq!(graph.beam_state(to_camera), BeamState::Off);
    assert_eq!(graph.put_state(camera), PutState::Waiting);

    // Opening it again restores the light path.
    graph.set_input("shutter", "close", PutState::Off).unwrap();
    assert_eq!(graph.beam_state(to_camera), BeamState::On);
    assert_eq!(graph.put_state(camera), PutState::On);

    // Cutting laser power ripples all the way down.
    graph.set_output("psu", "laser", PutState::Off).unwrap();
    assert_eq!(
        graph.put_state(graph.output("laser", "out").unwrap()),
        PutState::Waiting
    );
    assert_eq!(graph.put_state(camera), PutState::Waiting);
    assert_eq!(graph.beam_state(to_camera), BeamState::Off);
}

#[test]
fn annotated_relay_round_trips() {
    let loaded = load_file(demo("relay.drawio"), None, &LoaderConfig::default()).unwrap();
    let mut graph = loaded.graph;
    let annotator = DiagramAnnotator::new(loaded.diagram.unwrap(), Palette::default());

    graph.set_output("source", "out", PutState::On).unwrap();
    let xml = annotator.render(&graph).unwrap();
    assert!(xml.contains(r#"id="b:source2relay" value="" style="endArrow=classic;strokeColor=#FFFF00;fontColor=#FFFF00;""#));
    assert!(xml.contains(r#"id="title" value="relay demo" style="text;""#));

    let out = std::env::temp_dir().join(format!("instgraph-annotated-{}.drawio", std::process::id()));
    annotator.write(&graph, &out).unwrap();
    let reloaded = load_file(&out, None, &LoaderConfig::default()).unwrap();
    std::fs::remove_file(&out).unwrap();
    assert_eq!(reloaded.graph.put_count(), graph.put_count());
}
