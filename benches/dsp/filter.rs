//! Benchmarks for the chain lowpass.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polyslot::{dsp::filter::SVFilter, graph::RenderCtx};

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");
    let ctx = RenderCtx::at(48_000.0, 0.0);

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| ((i * 7) % 13) as f32 / 6.5 - 1.0).collect();
        let mut buffer = input.clone();
        let mut filter = SVFilter::lowpass(1_000.0);

        group.bench_with_input(BenchmarkId::new("lowpass", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer), black_box(&ctx));
            })
        });
    }

    group.finish();
}
