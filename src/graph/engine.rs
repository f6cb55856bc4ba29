use crate::{
    dsp::{automation::AudioParam, distortion::WaveshaperCurve, oscillator::Waveform},
    error::GraphError,
    graph::node::{NodeId, ParamKind},
};

/// Boundary to the audio engine that owns the node graph.
///
/// The synth core only builds, rewires and automates nodes through this
/// trait; sample-accurate playback happens on the engine's own clock. Every
/// call returns immediately after recording the change.
///
/// Edges are directed (`from` feeds `to`). A node only ever loses its own
/// outgoing edges through `disconnect`, so one voice tearing down its chain
/// never removes another voice's connection to a shared node.
pub trait AudioEngine {
    fn sample_rate(&self) -> f32;

    /// Engine clock in seconds; the reference point for automation.
    fn current_time(&self) -> f64;

    /// Final output node.
    fn destination(&self) -> NodeId;

    fn create_oscillator(&mut self, waveform: Waveform) -> Result<NodeId, GraphError>;

    fn create_waveshaper(&mut self, curve: WaveshaperCurve) -> Result<NodeId, GraphError>;

    fn create_gain(&mut self, gain: f32) -> Result<NodeId, GraphError>;

    /// Lowpass filter with the given cutoff and resonance.
    fn create_filter(&mut self, cutoff_hz: f32, resonance: f32) -> Result<NodeId, GraphError>;

    /// Add an edge; connecting twice is a no-op.
    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError>;

    /// Remove every outgoing edge of `node`.
    fn disconnect(&mut self, node: NodeId) -> Result<(), GraphError>;

    fn start(&mut self, node: NodeId) -> Result<(), GraphError>;

    fn stop(&mut self, node: NodeId) -> Result<(), GraphError>;

    /// Free a node and every edge that points at it. The handle becomes stale.
    fn release(&mut self, node: NodeId) -> Result<(), GraphError>;

    fn param(&self, node: NodeId, kind: ParamKind) -> Result<&AudioParam, GraphError>;

    fn param_mut(&mut self, node: NodeId, kind: ParamKind) -> Result<&mut AudioParam, GraphError>;
}
