//! Benchmarks for rendering a sounding note through the graph.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polyslot::{graph::OfflineGraph, NoteController, SynthConfig};

use crate::BLOCK_SIZES;

pub fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/render");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Default bank: four voices into the four-filter chain
        let engine = OfflineGraph::new(48_000.0).expect("valid sample rate");
        let mut synth =
            NoteController::with_engine(engine, SynthConfig::default()).expect("valid config");
        synth.note_on(110.0).expect("note on");

        group.bench_with_input(BenchmarkId::new("default_bank", size), &size, |b, _| {
            b.iter(|| synth.render(black_box(&mut buffer)))
        });

        // Bend in flight: automation evaluated every frame
        let engine = OfflineGraph::new(48_000.0).expect("valid sample rate");
        let mut synth =
            NoteController::with_engine(engine, SynthConfig::default()).expect("valid config");
        for index in 0..4 {
            synth.set_bend(index, 1.0).expect("edit");
        }
        synth.note_on(110.0).expect("note on");
        synth.glide_to(220.0).expect("glide");

        group.bench_with_input(BenchmarkId::new("bending", size), &size, |b, _| {
            b.iter(|| synth.render(black_box(&mut buffer)))
        });
    }

    group.finish();
}
