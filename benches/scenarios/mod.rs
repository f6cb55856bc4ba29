//! Benchmarks for whole-synth scenarios.

mod notes;
mod render;

pub use notes::bench_notes;
pub use render::bench_render;
