/*
Voice Resync
============

Brings live voices in line with the current pitch and slot bank without
restarting their oscillators. Each voice is paired with the slot it was
built from (`Voice::slot_index`).

  slot disabled, missing, or re-typed  →  mute (disconnect, keep registered)
  otherwise                            →  bend, detune, cutoff, new gain

Bend: four points from "now" (t0), with d = bend_seconds:

  freq
  high ┤          ╱╲
       │         ╱  ╲
  low  ┤╲       ╱    ╲___ target
       │ ╲_____╱
       └─┬─────┬─────┬─────┬──→ time
        t0   t0+d  t0+2d  t0+3d
        init  low   high  target

With d = 0 every point lands on t0 and the pitch snaps to the target.
*/

use tracing::{debug, trace};

use crate::{
    error::GraphError,
    finite_or_zero,
    graph::{engine::AudioEngine, node::ParamKind},
    synth::{slot::SlotConfig, voice::Voice},
};

/// What a resync pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResyncSummary {
    /// Voices whose pitch, detune, cutoff and gain were re-applied
    pub retargeted: usize,
    /// Voices silenced because their slot is disabled, gone, or re-typed
    pub muted: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VoiceGraphUpdater;

impl VoiceGraphUpdater {
    /// Reconcile `voices` with `slots` and `pitch` (`None` glides to 0 Hz).
    pub fn resync<'a, E, I>(
        engine: &mut E,
        voices: I,
        slots: &[SlotConfig],
        pitch: Option<f32>,
    ) -> Result<ResyncSummary, GraphError>
    where
        E: AudioEngine,
        I: IntoIterator<Item = &'a mut Voice>,
    {
        let now = engine.current_time();
        let target = pitch.map(finite_or_zero).unwrap_or(0.0);
        let mut summary = ResyncSummary::default();

        for voice in voices {
            let slot = match slots.get(voice.slot_index) {
                Some(slot) if slot.enabled && slot.waveform == voice.waveform => slot,
                _ => {
                    voice.mute(engine)?;
                    summary.muted += 1;
                    continue;
                }
            };

            let bend = finite_or_zero(slot.bend_seconds).max(0.0) as f64;
            let initial = voice.frequency_at(&*engine, now)?;
            let low = initial.min(target);
            let high = initial.max(target);

            let frequency = engine.param_mut(voice.oscillator, ParamKind::Frequency)?;
            frequency.cancel_scheduled_values(now);
            frequency.set_value_at_time(initial, now);
            frequency.linear_ramp_to_value_at_time(low, now + bend);
            frequency.linear_ramp_to_value_at_time(high, now + 2.0 * bend);
            frequency.linear_ramp_to_value_at_time(target, now + 3.0 * bend);

            let detune = engine.param_mut(voice.oscillator, ParamKind::Detune)?;
            detune.cancel_scheduled_values(now);
            detune.set_value_at_time(finite_or_zero(slot.detune_cents), now);

            let cutoff = engine.param_mut(voice.filter, ParamKind::Frequency)?;
            cutoff.cancel_scheduled_values(now);
            cutoff.set_value_at_time(finite_or_zero(slot.filter_cutoff_hz), now);

            voice.rebuild_gain_stage(engine, finite_or_zero(slot.volume))?;

            trace!(slot = voice.slot_index, initial, target, bend, "voice retargeted");
            summary.retargeted += 1;
        }

        debug!(
            retargeted = summary.retargeted,
            muted = summary.muted,
            "resync complete"
        );
        Ok(summary)
    }
}
