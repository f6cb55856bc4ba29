use tracing::warn;

use crate::{
    dsp::{
        automation::AudioParam,
        distortion::WaveshaperCurve,
        filter::SVFilter,
        oscillator::{OscillatorBlock, Waveform},
    },
    error::GraphError,
    graph::{
        engine::AudioEngine,
        node::{NodeId, ParamKind, PlaybackState, RenderCtx},
    },
    MAX_BLOCK_SIZE,
};

/*
Offline Graph
=============

Reference implementation of `AudioEngine`: a node arena rendered block by
block, used by the terminal front-end (inside the cpal callback) and by the
tests.

Rendering is push-based in topological order:

  1. zero the buffer of every live node
  2. visit nodes so that every node comes after all of its inputs
  3. process the node's buffer in place (its buffer holds the sum of inputs)
  4. add the result into the buffer of every node it feeds

  osc ──→ shaper ──→ gain ──→ filter[0] ──→ filter[1] ──→ destination
                                               ↑
                           other voice gain ───┘

Nodes caught in a cycle never become ready and render silence.

Automation is evaluated per frame for oscillators and gains, and once per
block for filter cutoff. After each block, automation history older than the
engine clock is compacted away.
*/

enum Processor {
    Oscillator {
        block: OscillatorBlock,
        frequency: AudioParam,
        detune: AudioParam,
        state: PlaybackState,
    },
    WaveShaper {
        curve: WaveshaperCurve,
    },
    Gain {
        gain: AudioParam,
    },
    Filter {
        filter: SVFilter,
        frequency: AudioParam,
    },
    Destination,
}

impl Processor {
    fn process(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        match self {
            Processor::Oscillator {
                block,
                frequency,
                detune,
                state,
            } => {
                if *state != PlaybackState::Playing {
                    buffer.fill(0.0);
                    return;
                }
                for (n, sample) in buffer.iter_mut().enumerate() {
                    let t = ctx.frame_time(n);
                    let cents = detune.value_at(t);
                    let hz = frequency.value_at(t) * 2.0_f32.powf(cents / 1200.0);
                    *sample = block.next_sample(hz, ctx.sample_rate);
                }
            }
            Processor::WaveShaper { curve } => curve.shape_buffer(buffer),
            Processor::Gain { gain } => {
                for (n, sample) in buffer.iter_mut().enumerate() {
                    *sample *= gain.value_at(ctx.frame_time(n));
                }
            }
            Processor::Filter { filter, frequency } => {
                filter.set_cutoff(frequency.value_at(ctx.time));
                filter.render(buffer, ctx);
            }
            Processor::Destination => {}
        }
    }

    fn params_mut(&mut self) -> [Option<&mut AudioParam>; 2] {
        match self {
            Processor::Oscillator {
                frequency, detune, ..
            } => [Some(frequency), Some(detune)],
            Processor::Gain { gain } => [Some(gain), None],
            Processor::Filter { frequency, .. } => [Some(frequency), None],
            Processor::WaveShaper { .. } | Processor::Destination => [None, None],
        }
    }
}

struct NodeEntry {
    processor: Processor,
    outputs: Vec<NodeId>,
}

struct Slot {
    generation: u32,
    entry: Option<NodeEntry>,
}

/// In-process audio graph that renders mono blocks on demand.
pub struct OfflineGraph {
    sample_rate: f32,
    frames: u64,
    slots: Vec<Slot>,
    free: Vec<u32>,
    buffers: Vec<Vec<f32>>,
    destination: NodeId,
    // render scratch, reused between blocks
    indegree: Vec<usize>,
    ready: Vec<usize>,
}

impl OfflineGraph {
    pub fn new(sample_rate: f32) -> Result<Self, GraphError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(GraphError::InvalidSampleRate(sample_rate));
        }

        let mut graph = Self {
            sample_rate,
            frames: 0,
            slots: Vec::new(),
            free: Vec::new(),
            buffers: Vec::new(),
            destination: NodeId::new(0, 0),
            indegree: Vec::new(),
            ready: Vec::new(),
        };
        graph.destination = graph.insert(Processor::Destination);
        Ok(graph)
    }

    /// Render the next `out.len()` frames of the destination.
    pub fn render_block(&mut self, out: &mut [f32]) {
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            self.render_chunk(chunk);
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Whether `node` refers to a live node.
    pub fn contains(&self, node: NodeId) -> bool {
        self.entry(node).is_ok()
    }

    /// Number of live nodes, including the destination.
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.entry.is_some()).count()
    }

    pub fn outputs(&self, node: NodeId) -> Result<&[NodeId], GraphError> {
        Ok(&self.entry(node)?.outputs)
    }

    pub fn is_connected(&self, from: NodeId, to: NodeId) -> bool {
        self.entry(from)
            .map(|e| e.outputs.contains(&to))
            .unwrap_or(false)
    }

    pub fn playback_state(&self, node: NodeId) -> Option<PlaybackState> {
        match &self.entry(node).ok()?.processor {
            Processor::Oscillator { state, .. } => Some(*state),
            _ => None,
        }
    }

    pub fn waveform(&self, node: NodeId) -> Option<Waveform> {
        match &self.entry(node).ok()?.processor {
            Processor::Oscillator { block, .. } => Some(block.waveform()),
            _ => None,
        }
    }

    fn entry(&self, node: NodeId) -> Result<&NodeEntry, GraphError> {
        self.slots
            .get(node.index())
            .filter(|slot| slot.generation == node.generation())
            .and_then(|slot| slot.entry.as_ref())
            .ok_or(GraphError::UnknownNode(node))
    }

    fn entry_mut(&mut self, node: NodeId) -> Result<&mut NodeEntry, GraphError> {
        self.slots
            .get_mut(node.index())
            .filter(|slot| slot.generation == node.generation())
            .and_then(|slot| slot.entry.as_mut())
            .ok_or(GraphError::UnknownNode(node))
    }

    fn insert(&mut self, processor: Processor) -> NodeId {
        let entry = NodeEntry {
            processor,
            outputs: Vec::new(),
        };

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return NodeId::new(index, slot.generation);
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        self.buffers.push(vec![0.0; MAX_BLOCK_SIZE]);
        NodeId::new(index, 0)
    }

    fn render_chunk(&mut self, out: &mut [f32]) {
        let len = out.len();
        let ctx = RenderCtx::at(self.sample_rate, self.current_time());
        let count = self.slots.len();

        // In-degree of every live node
        self.indegree.clear();
        self.indegree.resize(count, 0);
        for slot in &self.slots {
            if let Some(entry) = &slot.entry {
                for target in &entry.outputs {
                    self.indegree[target.index()] += 1;
                }
            }
        }

        self.ready.clear();
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.entry.is_some() {
                self.buffers[index][..len].fill(0.0);
                if self.indegree[index] == 0 {
                    self.ready.push(index);
                }
            }
        }

        while let Some(index) = self.ready.pop() {
            let mut buffer = std::mem::take(&mut self.buffers[index]);
            let Some(entry) = self.slots[index].entry.as_mut() else {
                self.buffers[index] = buffer;
                continue;
            };

            entry.processor.process(&mut buffer[..len], &ctx);

            for target in &entry.outputs {
                let t = target.index();
                for (dst, src) in self.buffers[t][..len].iter_mut().zip(&buffer[..len]) {
                    *dst += *src;
                }
                self.indegree[t] -= 1;
                if self.indegree[t] == 0 {
                    self.ready.push(t);
                }
            }

            self.buffers[index] = buffer;
        }

        out.copy_from_slice(&self.buffers[self.destination.index()][..len]);
        self.frames += len as u64;

        let now = self.current_time();
        for slot in &mut self.slots {
            if let Some(entry) = &mut slot.entry {
                for param in entry.processor.params_mut().into_iter().flatten() {
                    param.compact(now);
                }
            }
        }
    }
}

impl AudioEngine for OfflineGraph {
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn current_time(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    fn destination(&self) -> NodeId {
        self.destination
    }

    fn create_oscillator(&mut self, waveform: Waveform) -> Result<NodeId, GraphError> {
        Ok(self.insert(Processor::Oscillator {
            block: OscillatorBlock::new(waveform),
            frequency: AudioParam::new(440.0),
            detune: AudioParam::new(0.0),
            state: PlaybackState::Pending,
        }))
    }

    fn create_waveshaper(&mut self, curve: WaveshaperCurve) -> Result<NodeId, GraphError> {
        Ok(self.insert(Processor::WaveShaper { curve }))
    }

    fn create_gain(&mut self, gain: f32) -> Result<NodeId, GraphError> {
        Ok(self.insert(Processor::Gain {
            gain: AudioParam::new(gain),
        }))
    }

    fn create_filter(&mut self, cutoff_hz: f32, resonance: f32) -> Result<NodeId, GraphError> {
        Ok(self.insert(Processor::Filter {
            filter: SVFilter::lowpass(cutoff_hz).with_resonance(resonance),
            frequency: AudioParam::new(cutoff_hz),
        }))
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        self.entry(to)?;
        let entry = self.entry_mut(from)?;
        if !entry.outputs.contains(&to) {
            entry.outputs.push(to);
        }
        Ok(())
    }

    fn disconnect(&mut self, node: NodeId) -> Result<(), GraphError> {
        self.entry_mut(node)?.outputs.clear();
        Ok(())
    }

    fn start(&mut self, node: NodeId) -> Result<(), GraphError> {
        match &mut self.entry_mut(node)?.processor {
            Processor::Oscillator { state, .. } => {
                match *state {
                    PlaybackState::Pending => *state = PlaybackState::Playing,
                    PlaybackState::Playing => {}
                    PlaybackState::Stopped => warn!(%node, "start ignored on a stopped source"),
                }
                Ok(())
            }
            _ => Err(GraphError::NotASource(node)),
        }
    }

    fn stop(&mut self, node: NodeId) -> Result<(), GraphError> {
        match &mut self.entry_mut(node)?.processor {
            Processor::Oscillator { state, .. } => {
                *state = PlaybackState::Stopped;
                Ok(())
            }
            _ => Err(GraphError::NotASource(node)),
        }
    }

    fn release(&mut self, node: NodeId) -> Result<(), GraphError> {
        self.entry(node)?;
        if node == self.destination {
            warn!(%node, "the destination cannot be released");
            return Ok(());
        }

        let slot = &mut self.slots[node.index()];
        slot.entry = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(node.index() as u32);

        for slot in &mut self.slots {
            if let Some(entry) = &mut slot.entry {
                entry.outputs.retain(|&target| target != node);
            }
        }
        Ok(())
    }

    fn param(&self, node: NodeId, kind: ParamKind) -> Result<&AudioParam, GraphError> {
        let param = match (&self.entry(node)?.processor, kind) {
            (Processor::Oscillator { frequency, .. }, ParamKind::Frequency) => frequency,
            (Processor::Oscillator { detune, .. }, ParamKind::Detune) => detune,
            (Processor::Gain { gain }, ParamKind::Gain) => gain,
            (Processor::Filter { frequency, .. }, ParamKind::Frequency) => frequency,
            _ => return Err(GraphError::NoSuchParam { node, param: kind }),
        };
        Ok(param)
    }

    fn param_mut(&mut self, node: NodeId, kind: ParamKind) -> Result<&mut AudioParam, GraphError> {
        let param = match (&mut self.entry_mut(node)?.processor, kind) {
            (Processor::Oscillator { frequency, .. }, ParamKind::Frequency) => frequency,
            (Processor::Oscillator { detune, .. }, ParamKind::Detune) => detune,
            (Processor::Gain { gain }, ParamKind::Gain) => gain,
            (Processor::Filter { frequency, .. }, ParamKind::Frequency) => frequency,
            _ => return Err(GraphError::NoSuchParam { node, param: kind }),
        };
        Ok(param)
    }
}
