use tracing::trace;

use crate::{
    error::GraphError,
    graph::{engine::AudioEngine, node::NodeId},
    synth::slot::DEFAULT_CUTOFF_HZ,
};

/// Fixed series of per-slot lowpass filters ending at the engine output.
///
/// ```text
/// voice 0 gain ─→ filter[0] ─→ filter[1] ─→ … ─→ filter[N-1] ─→ destination
///                 voice 1 gain ─┘
/// ```
///
/// The wiring is made once at attach time and never changes; voices only
/// add and remove their own feed into their filter.
#[derive(Debug, Clone)]
pub struct FilterChain {
    filters: Vec<NodeId>,
}

impl FilterChain {
    /// Create `len` filters in series and connect the last one to `output`.
    pub fn build<E: AudioEngine>(
        engine: &mut E,
        len: usize,
        resonance: f32,
        output: NodeId,
    ) -> Result<Self, GraphError> {
        let mut filters = Vec::with_capacity(len);
        for _ in 0..len {
            filters.push(engine.create_filter(DEFAULT_CUTOFF_HZ, resonance)?);
        }

        for pair in filters.windows(2) {
            engine.connect(pair[0], pair[1])?;
        }
        if let Some(&last) = filters.last() {
            engine.connect(last, output)?;
        }

        trace!(len, "filter chain wired");
        Ok(Self { filters })
    }

    /// Filter feeding position `position`; positions past the end share the
    /// last filter.
    pub fn filter_for(&self, position: usize) -> Option<NodeId> {
        self.filters
            .get(position)
            .or_else(|| self.filters.last())
            .copied()
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
