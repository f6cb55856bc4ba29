//! Benchmarks for low-level DSP primitives.

mod distortion;
mod filter;

pub use distortion::bench_distortion;
pub use filter::bench_filter;
