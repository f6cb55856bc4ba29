use tracing::{trace, warn};

use crate::{
    dsp::distortion::build_curve,
    error::GraphError,
    finite_or_zero,
    graph::{
        engine::AudioEngine,
        node::{NodeId, ParamKind},
    },
    synth::{filter_chain::FilterChain, slot::SlotConfig, voice::Voice},
};

/// Fade-in time of the voice envelope, in seconds.
pub const ATTACK_SECONDS: f64 = 0.01;

/// Builds voices: oscillator → waveshaper → envelope gain → chain filter.
///
/// The caller starts the oscillator and adds any bus send; the filter chain
/// is already wired to the output.
#[derive(Debug, Clone, Copy)]
pub struct VoiceFactory {
    distortion_amount: f32,
}

impl VoiceFactory {
    pub fn new(distortion_amount: f32) -> Self {
        Self { distortion_amount }
    }

    pub fn distortion_amount(&self) -> f32 {
        self.distortion_amount
    }

    /// Build the voice for `slot` (found at `slot_index` in the bank) at
    /// `position` in the filter chain.
    pub fn build<E: AudioEngine>(
        &self,
        engine: &mut E,
        chain: &FilterChain,
        frequency: f32,
        slot: &SlotConfig,
        slot_index: usize,
        position: usize,
    ) -> Result<Voice, GraphError> {
        let mut created = Vec::with_capacity(3);
        let result = self.assemble(
            engine,
            &mut created,
            chain,
            frequency,
            slot,
            (slot_index, position),
        );

        // A failed build frees whatever it had already created
        if result.is_err() {
            for node in created {
                if let Err(error) = engine.release(node) {
                    warn!(%node, %error, "partly built voice not freed");
                }
            }
        }
        result
    }

    fn assemble<E: AudioEngine>(
        &self,
        engine: &mut E,
        created: &mut Vec<NodeId>,
        chain: &FilterChain,
        frequency: f32,
        slot: &SlotConfig,
        (slot_index, position): (usize, usize),
    ) -> Result<Voice, GraphError> {
        let t0 = engine.current_time();
        let octave = 2.0_f32.powi(slot.octave_offset);
        let actual_frequency = finite_or_zero(frequency) * octave;
        let actual_detune = finite_or_zero(slot.detune_cents) * octave;

        let filter = chain
            .filter_for(position)
            .ok_or(GraphError::UnknownNode(engine.destination()))?;

        let oscillator = engine.create_oscillator(slot.waveform)?;
        created.push(oscillator);
        engine
            .param_mut(oscillator, ParamKind::Frequency)?
            .set_value_at_time(actual_frequency, t0);
        engine
            .param_mut(oscillator, ParamKind::Detune)?
            .set_value_at_time(actual_detune, t0);

        let shaper = engine.create_waveshaper(build_curve(self.distortion_amount))?;
        created.push(shaper);
        engine.connect(oscillator, shaper)?;

        let gain = engine.create_gain(0.0)?;
        created.push(gain);
        engine.connect(shaper, gain)?;

        // Sustain sets both the envelope peak and its total length
        let sustain = finite_or_zero(slot.sustain_percent) / 100.0;
        let volume = finite_or_zero(slot.volume);
        let envelope = engine.param_mut(gain, ParamKind::Gain)?;
        envelope.set_value_at_time(0.0, t0);
        envelope.linear_ramp_to_value_at_time(sustain * volume, t0 + ATTACK_SECONDS);
        envelope.linear_ramp_to_value_at_time(0.0, t0 + sustain as f64);

        engine.connect(gain, filter)?;

        trace!(
            slot = slot_index,
            position,
            waveform = slot.waveform.name(),
            frequency = actual_frequency,
            "voice built"
        );

        Ok(Voice {
            slot_index,
            position,
            waveform: slot.waveform,
            oscillator,
            distortion: Some(shaper),
            gain,
            filter,
            connected: true,
        })
    }
}

impl Default for VoiceFactory {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dsp::{automation::ParamEvent, oscillator::Waveform},
        graph::{node::PlaybackState, offline::OfflineGraph},
    };
    use approx::assert_abs_diff_eq;

    fn setup() -> (OfflineGraph, FilterChain) {
        let mut engine = OfflineGraph::new(48_000.0).unwrap();
        let out = engine.destination();
        let chain = FilterChain::build(&mut engine, 4, 0.5, out).unwrap();
        (engine, chain)
    }

    #[test]
    fn frequency_follows_octave_exactly() {
        let (mut engine, chain) = setup();
        let factory = VoiceFactory::default();

        for octave in -5..=5 {
            let mut slot = SlotConfig::new(1, Waveform::Sine);
            slot.octave_offset = octave;
            let voice = factory
                .build(&mut engine, &chain, 261.63, &slot, 0, 0)
                .unwrap();

            let hz = voice.frequency_at(&engine, 0.0).unwrap();
            assert_eq!(hz, 261.63 * 2.0_f32.powi(octave));
        }
    }

    #[test]
    fn detune_scales_with_octave() {
        let (mut engine, chain) = setup();
        let mut slot = SlotConfig::new(1, Waveform::Square);
        slot.detune_cents = 10.0;
        slot.octave_offset = 2;

        let voice = VoiceFactory::default()
            .build(&mut engine, &chain, 110.0, &slot, 0, 0)
            .unwrap();

        let detune = engine.param(voice.oscillator(), ParamKind::Detune).unwrap();
        assert_abs_diff_eq!(detune.value_at(0.0), 40.0);
    }

    #[test]
    fn chain_is_wired_into_the_slot_filter() {
        let (mut engine, chain) = setup();
        let slot = SlotConfig::new(1, Waveform::Sawtooth);

        let voice = VoiceFactory::default()
            .build(&mut engine, &chain, 220.0, &slot, 2, 1)
            .unwrap();

        let shaper = voice.distortion().unwrap();
        assert_eq!(voice.filter(), chain.nodes()[1]);
        assert_eq!(voice.waveform(), Waveform::Sawtooth);
        assert!(engine.is_connected(voice.oscillator(), shaper));
        assert!(engine.is_connected(shaper, voice.gain()));
        assert!(engine.is_connected(voice.gain(), chain.nodes()[1]));
        assert!(voice.is_connected());
        // starting is the caller's job
        assert_eq!(
            engine.playback_state(voice.oscillator()),
            Some(PlaybackState::Pending)
        );
    }

    #[test]
    fn envelope_fades_in_then_out_over_sustain() {
        let (mut engine, chain) = setup();
        let mut slot = SlotConfig::new(1, Waveform::Sine);
        slot.sustain_percent = 50.0;
        slot.volume = 0.8;

        let voice = VoiceFactory::default()
            .build(&mut engine, &chain, 440.0, &slot, 0, 0)
            .unwrap();

        let gain = engine.param(voice.gain(), ParamKind::Gain).unwrap();
        assert_eq!(
            gain.events(),
            &[
                ParamEvent::SetValue {
                    time: 0.0,
                    value: 0.0
                },
                ParamEvent::LinearRamp {
                    time: 0.01,
                    value: 0.4
                },
                ParamEvent::LinearRamp {
                    time: 0.5,
                    value: 0.0
                },
            ]
        );
        assert_abs_diff_eq!(gain.value_at(0.01), 0.4, epsilon = 1e-6);
        assert_abs_diff_eq!(gain.value_at(1.0), 0.0);
    }

    #[test]
    fn failed_build_frees_its_nodes() {
        let (mut engine, chain) = setup();
        engine.release(chain.nodes()[0]).unwrap();
        let before = engine.node_count();

        let result = VoiceFactory::default().build(
            &mut engine,
            &chain,
            440.0,
            &SlotConfig::new(1, Waveform::Sine),
            0,
            0,
        );

        assert_eq!(result, Err(GraphError::UnknownNode(chain.nodes()[0])));
        assert_eq!(engine.node_count(), before);
    }

    #[test]
    fn non_finite_inputs_become_zero() {
        let (mut engine, chain) = setup();
        let mut slot = SlotConfig::new(1, Waveform::Triangle);
        slot.sustain_percent = f32::NAN;
        slot.volume = f32::INFINITY;
        slot.detune_cents = f32::NAN;

        let voice = VoiceFactory::default()
            .build(&mut engine, &chain, 440.0, &slot, 0, 0)
            .unwrap();

        let gain = engine.param(voice.gain(), ParamKind::Gain).unwrap();
        assert!(gain.events().iter().all(|e| e.value() == 0.0));
        let detune = engine.param(voice.oscillator(), ParamKind::Detune).unwrap();
        assert_eq!(detune.value_at(0.0), 0.0);
    }
}
