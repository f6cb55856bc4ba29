use std::fmt;

/// Handle to a node inside an audio graph.
///
/// Handles are generational: once a node is released its handle stays
/// invalid even if the engine reuses the storage for a new node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub(crate) fn index(self) -> usize {
        self.index as usize
    }

    pub(crate) fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Automatable parameters exposed by graph nodes.
///
/// Oscillators expose `Frequency` and `Detune`, filters expose `Frequency`
/// (their cutoff), gain nodes expose `Gain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Oscillator pitch or filter cutoff, in Hz
    Frequency,
    /// Oscillator detune, in cents (100 cents = 1 semitone)
    Detune,
    /// Linear amplitude multiplier
    Gain,
}

/// Lifecycle of a source node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Created, not yet started: renders silence
    Pending,
    Playing,
    /// Stopped for good; a stopped source cannot be restarted
    Stopped,
}

/// Context passed to processors while rendering a block
///
/// - sample_rate: Audio sample rate (e.g., 48000.0)
/// - time: engine time of the first frame in the block, in seconds
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub time: f64,
}

impl RenderCtx {
    pub fn at(sample_rate: f32, time: f64) -> Self {
        Self { sample_rate, time }
    }

    /// Engine time of frame `n` within the block.
    #[inline]
    pub fn frame_time(&self, n: usize) -> f64 {
        self.time + n as f64 / self.sample_rate as f64
    }
}
