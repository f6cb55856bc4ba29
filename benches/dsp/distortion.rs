//! Benchmarks for the waveshaper curve.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polyslot::dsp::distortion::build_curve;

use crate::BLOCK_SIZES;

pub fn bench_distortion(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/distortion");

    // Built once per voice on every note-on
    group.bench_function("build_curve", |b| {
        b.iter(|| build_curve(black_box(1.0)));
    });

    let curve = build_curve(1.0);
    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("shape", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                curve.shape_buffer(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
