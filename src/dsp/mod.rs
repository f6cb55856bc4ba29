//! Low-level DSP primitives used by the graph processors.
//!
//! These components are allocation-free while rendering and stay focused on
//! the signal-processing math; wiring and lifecycle live in `graph` and
//! `synth`.

/// Web-Audio-style parameter timelines (set / linear ramp / cancel).
pub mod automation;
/// Waveshaper transfer curves.
pub mod distortion;
/// State-variable lowpass used by the per-slot filter chain.
pub mod filter;
/// Oscillator waveforms and the phase accumulator.
pub mod oscillator;

pub use oscillator::Waveform;
