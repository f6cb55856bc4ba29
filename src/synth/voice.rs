use std::fmt;

use crate::{
    dsp::oscillator::Waveform,
    error::GraphError,
    graph::{
        engine::AudioEngine,
        node::{NodeId, ParamKind},
    },
};

/// Registry key of a live voice; allocated in increasing order, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub u64);

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice-{}", self.0)
    }
}

/// One live instance of a slot's signal chain.
///
/// ```text
/// oscillator ─→ waveshaper ─→ gain ─→ filter (shared, from the chain)
///      └──────────────────────────→ bus (shared, optional)
/// ```
///
/// The voice owns the oscillator, the waveshaper and the gain exclusively.
/// The filter and the bus belong to the controller and are only referenced.
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    pub(crate) slot_index: usize,
    pub(crate) position: usize,
    pub(crate) waveform: Waveform,
    pub(crate) oscillator: NodeId,
    pub(crate) distortion: Option<NodeId>,
    pub(crate) gain: NodeId,
    pub(crate) filter: NodeId,
    pub(crate) connected: bool,
}

impl Voice {
    /// Index of the slot this voice is paired with during resync.
    pub fn slot_index(&self) -> usize {
        self.slot_index
    }

    /// Position within the filter chain at build time.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn oscillator(&self) -> NodeId {
        self.oscillator
    }

    /// `None` once the gain stage has been rebuilt without the waveshaper.
    pub fn distortion(&self) -> Option<NodeId> {
        self.distortion
    }

    pub fn gain(&self) -> NodeId {
        self.gain
    }

    pub fn filter(&self) -> NodeId {
        self.filter
    }

    /// Whether the voice currently feeds its filter.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Oscillator frequency at `time`, in Hz.
    pub fn frequency_at<E: AudioEngine>(&self, engine: &E, time: f64) -> Result<f32, GraphError> {
        Ok(engine
            .param(self.oscillator, ParamKind::Frequency)?
            .value_at(time))
    }

    /// Silence the voice without stopping its oscillator.
    ///
    /// Only the voice's own outgoing edges are removed, so the shared filter
    /// and bus keep every other voice's feed.
    pub fn mute<E: AudioEngine>(&mut self, engine: &mut E) -> Result<(), GraphError> {
        engine.disconnect(self.oscillator)?;
        engine.disconnect(self.gain)?;
        if let Some(shaper) = self.distortion {
            engine.disconnect(shaper)?;
        }
        self.connected = false;
        Ok(())
    }

    /// Replace the gain stage with a fresh node held at `volume`.
    ///
    /// The old gain (and the waveshaper, if still present) is disconnected
    /// and released. Afterwards the voice reads
    /// `oscillator → gain → filter`; the previous bus send is dropped.
    /// Returns the new gain node.
    pub fn rebuild_gain_stage<E: AudioEngine>(
        &mut self,
        engine: &mut E,
        volume: f32,
    ) -> Result<NodeId, GraphError> {
        let now = engine.current_time();

        engine.disconnect(self.oscillator)?;
        if let Some(shaper) = self.distortion.take() {
            engine.disconnect(shaper)?;
            engine.release(shaper)?;
        }
        engine.disconnect(self.gain)?;
        engine.release(self.gain)?;

        let gain = engine.create_gain(volume)?;
        engine
            .param_mut(gain, ParamKind::Gain)?
            .set_value_at_time(volume, now);
        engine.connect(self.oscillator, gain)?;
        engine.connect(gain, self.filter)?;

        self.gain = gain;
        self.connected = true;
        Ok(gain)
    }

    /// Stop the oscillator and free every node the voice owns.
    pub fn stop_and_release<E: AudioEngine>(self, engine: &mut E) -> Result<(), GraphError> {
        engine.stop(self.oscillator)?;
        engine.disconnect(self.oscillator)?;
        if let Some(shaper) = self.distortion {
            engine.release(shaper)?;
        }
        engine.release(self.gain)?;
        engine.release(self.oscillator)?;
        Ok(())
    }
}
