//! Benchmarks for instrument graph propagation
//!
//! Measures performance of:
//! - Graph construction and finalization
//! - Energize/starve cascades down a relay chain
//! - Snapshot capture

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use instgraph_core::{Direction, Graph, PutKind, PutState};

/// Build `source -> r0 -> ... -> r{len-1} -> sink`, every relay forwarding in to out.
fn relay_chain(len: usize) -> Graph {
    let mut graph = Graph::new();
    let source = graph.add_node("source");
    let mut upstream = graph.add_beam("source-out");
    graph
        .add_put(source, Direction::Output, "out", PutKind::Light, Some(upstream))
        .unwrap();

    for i in 0..len {
        let relay = graph.add_node(&format!("r{i:05}"));
        let input = graph
            .add_put(relay, Direction::Input, "in", PutKind::Light, Some(upstream))
            .unwrap();
        let next = graph.add_beam(&format!("r{i:05}-out"));
        graph
            .add_put(relay, Direction::Output, "out", PutKind::Light, Some(next))
            .unwrap();
        graph.add_output_link(input, "out").unwrap();
        upstream = next;
    }

    let sink = graph.add_node("sink");
    graph
        .add_put(sink, Direction::Input, "in", PutKind::Light, Some(upstream))
        .unwrap();
    graph.finalize().unwrap();
    graph
}

/// Every input switched on, so the source alone gates the chain.
fn primed_chain(len: usize) -> Graph {
    let mut graph = relay_chain(len);
    let inputs: Vec<_> = graph
        .puts()
        .filter(|(_, p)| p.is_input())
        .map(|(id, _)| id)
        .collect();
    for id in inputs {
        graph.set_state(id, PutState::On).unwrap();
    }
    graph
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_and_finalize");

    for &len in &[10usize, 100, 1000] {
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter(|| relay_chain(black_box(len)))
        });
    }
    group.finish();
}

fn bench_cascade(c: &mut Criterion) {
    let mut group = c.benchmark_group("source_toggle_cascade");

    for &len in &[10usize, 100, 1000] {
        let mut graph = primed_chain(len);
        let source = graph.output("source", "out").unwrap();
        group.throughput(Throughput::Elements(len as u64));
        group.bench_function(BenchmarkId::from_parameter(len), |b| {
            b.iter(|| {
                graph.set_state(source, black_box(PutState::On)).unwrap();
                graph.set_state(source, black_box(PutState::Off)).unwrap();
            })
        });
    }
    group.finish();
}

fn bench_repeated_stimulus(c: &mut Criterion) {
    // Settled graph: the change gate should return immediately.
    let mut graph = primed_chain(1000);
    let source = graph.output("source", "out").unwrap();
    graph.set_state(source, PutState::On).unwrap();

    c.bench_function("repeated_stimulus", |b| {
        b.iter(|| graph.set_state(source, black_box(PutState::On)).unwrap())
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");

    for &len in &[10usize, 100, 1000] {
        let graph = primed_chain(len);
        group.throughput(Throughput::Elements(graph.put_count() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &graph, |b, graph| {
            b.iter(|| black_box(graph.snapshot()))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_cascade,
    bench_repeated_stimulus,
    bench_snapshot,
);
criterion_main!(benches);
