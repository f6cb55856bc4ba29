use std::{collections::BTreeMap, ops::RangeBounds};

use tracing::{debug, warn};

use crate::{
    dsp::oscillator::Waveform,
    error::{Result, SynthError},
    graph::{engine::AudioEngine, node::NodeId, offline::OfflineGraph},
    synth::{
        config::{RetriggerMode, SynthConfig},
        factory::VoiceFactory,
        filter_chain::FilterChain,
        message::{MessageReceiver, SynthMessage},
        slot::{SlotConfig, SlotConfigStore, SlotPatch},
        updater::{ResyncSummary, VoiceGraphUpdater},
        voice::{Voice, VoiceId},
    },
};

/// Graph resources shared by every voice of one engine.
struct Attached<E> {
    engine: E,
    chain: FilterChain,
    bus: NodeId,
}

/// Note-on/note-off orchestration over the slot bank.
///
/// Idle while the registry is empty (and the pitch is `None`), sounding
/// otherwise. Every slot edit and pitch change made while sounding is pushed
/// straight into the live voices by a resync.
///
/// Until an engine is attached every note and slot operation fails with
/// [`SynthError::EngineUnavailable`] and changes nothing.
pub struct NoteController<E: AudioEngine> {
    attached: Option<Attached<E>>,
    config: SynthConfig,
    factory: VoiceFactory,
    slots: SlotConfigStore,
    voices: BTreeMap<VoiceId, Voice>,
    next_voice_id: u64,
    current_pitch: Option<f32>,
}

impl<E: AudioEngine> NoteController<E> {
    /// A controller with the default slot bank and no engine.
    pub fn new(config: SynthConfig) -> Self {
        Self {
            attached: None,
            config,
            factory: VoiceFactory::new(config.distortion_amount),
            slots: SlotConfigStore::new(config.slot_count.max(1)),
            voices: BTreeMap::new(),
            next_voice_id: 0,
            current_pitch: None,
        }
    }

    pub fn with_engine(engine: E, config: SynthConfig) -> Result<Self> {
        let mut controller = Self::new(config);
        controller.attach(engine)?;
        Ok(controller)
    }

    /// Wire the master bus and the filter chain into `engine` and start
    /// using it. Voices belonging to a previous engine are dropped.
    pub fn attach(&mut self, mut engine: E) -> Result<()> {
        self.config.validate()?;

        let sample_rate = engine.sample_rate();
        let output = engine.destination();
        let bus = engine.create_gain(self.config.master_gain)?;
        engine.connect(bus, output)?;
        let chain = FilterChain::build(
            &mut engine,
            self.config.slot_count,
            self.config.filter_resonance,
            output,
        )?;

        if !self.voices.is_empty() {
            warn!(voices = self.voices.len(), "dropping voices of the previous engine");
        }
        self.voices.clear();
        self.current_pitch = None;
        self.attached = Some(Attached { engine, chain, bus });

        debug!(
            slots = self.config.slot_count,
            sample_rate,
            "engine attached"
        );
        Ok(())
    }

    /// Give the engine back. The registry is cleared since its nodes live in
    /// the engine.
    pub fn detach(&mut self) -> Option<E> {
        self.voices.clear();
        self.current_pitch = None;
        self.attached.take().map(|a| a.engine)
    }

    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    pub fn engine(&self) -> Option<&E> {
        self.attached.as_ref().map(|a| &a.engine)
    }

    pub fn engine_mut(&mut self) -> Option<&mut E> {
        self.attached.as_mut().map(|a| &mut a.engine)
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Filter chain of the attached engine.
    pub fn filter_chain(&self) -> Option<&FilterChain> {
        self.attached.as_ref().map(|a| &a.chain)
    }

    /// Shared master bus of the attached engine.
    pub fn bus(&self) -> Option<NodeId> {
        self.attached.as_ref().map(|a| a.bus)
    }

    /// Start one voice per enabled slot at `frequency`.
    ///
    /// Returns the number of voices built. A non-positive or non-finite
    /// frequency is ignored.
    pub fn note_on(&mut self, frequency: f32) -> Result<usize> {
        if self.attached.is_none() {
            return Err(SynthError::EngineUnavailable);
        }
        if !frequency.is_finite() || frequency <= 0.0 {
            warn!(frequency, "note on ignored: frequency must be positive");
            return Ok(0);
        }

        if self.config.retrigger == RetriggerMode::Restart && self.is_sounding() {
            self.release_all()?;
        }

        self.current_pitch = Some(frequency);
        let layered = self.is_sounding();
        let first_new = VoiceId(self.next_voice_id);

        let Some(attached) = self.attached.as_mut() else {
            return Err(SynthError::EngineUnavailable);
        };

        let mut built = 0;
        for (slot_index, slot) in self.slots.get_all().iter().enumerate() {
            if !slot.enabled {
                continue;
            }

            let voice = self.factory.build(
                &mut attached.engine,
                &attached.chain,
                frequency,
                slot,
                slot_index,
                built,
            )?;
            attached.engine.connect(voice.oscillator, attached.bus)?;
            attached.engine.start(voice.oscillator)?;

            let id = VoiceId(self.next_voice_id);
            self.next_voice_id += 1;
            self.voices.insert(id, voice);
            built += 1;
        }

        debug!(frequency, built, total = self.voices.len(), "note on");

        // Fresh voices already sit at their build state; only the layers
        // underneath move to the new pitch.
        if layered {
            self.resync_voices(..first_new)?;
        }
        Ok(built)
    }

    /// Stop and free every registered voice. A no-op while idle.
    pub fn note_off(&mut self) -> Result<()> {
        if !self.is_sounding() && self.current_pitch.is_none() {
            return Ok(());
        }
        let released = self.voices.len();
        self.release_all()?;
        debug!(released, "note off");
        Ok(())
    }

    /// Move the sounding pitch; every live voice bends toward it.
    pub fn glide_to(&mut self, frequency: f32) -> Result<()> {
        if self.attached.is_none() {
            return Err(SynthError::EngineUnavailable);
        }
        if !frequency.is_finite() || frequency <= 0.0 {
            warn!(frequency, "glide ignored: frequency must be positive");
            return Ok(());
        }
        if !self.is_sounding() {
            return Ok(());
        }

        self.current_pitch = Some(frequency);
        self.resync()?;
        Ok(())
    }

    /// Merge `patch` into the slot at `index`. Returns `false` when the index
    /// is out of range.
    pub fn update_slot(&mut self, index: usize, patch: &SlotPatch) -> Result<bool> {
        self.edit_slots(|slots| slots.update(index, patch))
    }

    pub fn set_waveform(&mut self, index: usize, waveform: Waveform) -> Result<bool> {
        self.update_slot(index, &SlotPatch::waveform(waveform))
    }

    pub fn set_enabled(&mut self, index: usize, enabled: bool) -> Result<bool> {
        self.update_slot(index, &SlotPatch::enabled(enabled))
    }

    pub fn toggle_enabled(&mut self, index: usize) -> Result<bool> {
        self.edit_slots(|slots| slots.toggle_enabled(index))
    }

    pub fn set_detune(&mut self, index: usize, cents: f32) -> Result<bool> {
        self.update_slot(index, &SlotPatch::detune(cents))
    }

    pub fn set_volume(&mut self, index: usize, volume: f32) -> Result<bool> {
        self.update_slot(index, &SlotPatch::volume(volume))
    }

    pub fn set_octave(&mut self, index: usize, offset: i32) -> Result<bool> {
        self.update_slot(index, &SlotPatch::octave(offset))
    }

    pub fn set_sustain(&mut self, index: usize, percent: f32) -> Result<bool> {
        self.update_slot(index, &SlotPatch::sustain(percent))
    }

    pub fn set_filter_cutoff(&mut self, index: usize, hz: f32) -> Result<bool> {
        self.update_slot(index, &SlotPatch::filter_cutoff(hz))
    }

    pub fn set_bend(&mut self, index: usize, seconds: f32) -> Result<bool> {
        self.update_slot(index, &SlotPatch::bend(seconds))
    }

    /// Replace the slot bank wholesale; an empty list restores the defaults.
    pub fn apply_preset(&mut self, slots: Vec<SlotConfig>) -> Result<()> {
        self.edit_slots(|store| {
            store.replace_all(slots);
            true
        })?;
        Ok(())
    }

    /// Apply one control message.
    pub fn handle_message(&mut self, message: SynthMessage) -> Result<()> {
        match message {
            SynthMessage::NoteOn { frequency } => self.note_on(frequency).map(|_| ()),
            SynthMessage::NoteOff => self.note_off(),
            SynthMessage::Glide { frequency } => self.glide_to(frequency),
            SynthMessage::UpdateSlot { index, patch } => {
                self.update_slot(index, &patch).map(|_| ())
            }
            SynthMessage::ToggleSlot { index } => self.toggle_enabled(index).map(|_| ()),
            SynthMessage::ApplyPreset(slots) => self.apply_preset(slots),
        }
    }

    /// Drain `rx`, applying messages in arrival order. Failures are logged
    /// and the message is dropped.
    pub fn process_messages<R: MessageReceiver>(&mut self, rx: &mut R) {
        while let Some(message) = rx.pop() {
            if let Err(error) = self.handle_message(message) {
                warn!(%error, "control message dropped");
            }
        }
    }

    /// Registered voices in id order.
    pub fn voices(&self) -> impl Iterator<Item = (VoiceId, &Voice)> + '_ {
        self.voices.iter().map(|(id, voice)| (*id, voice))
    }

    /// Current oscillator frequency of every registered voice.
    pub fn voice_frequencies(&self) -> Vec<(VoiceId, f32)> {
        let Some(attached) = self.attached.as_ref() else {
            return Vec::new();
        };
        let now = attached.engine.current_time();
        self.voices
            .iter()
            .filter_map(|(id, voice)| {
                voice
                    .frequency_at(&attached.engine, now)
                    .ok()
                    .map(|hz| (*id, hz))
            })
            .collect()
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn current_pitch(&self) -> Option<f32> {
        self.current_pitch
    }

    pub fn is_sounding(&self) -> bool {
        !self.voices.is_empty()
    }

    pub fn slots(&self) -> &[SlotConfig] {
        self.slots.get_all()
    }

    /// Re-apply the current pitch and slot bank to every live voice.
    pub fn resync(&mut self) -> Result<ResyncSummary> {
        self.resync_voices(..)
    }

    fn resync_voices<R: RangeBounds<VoiceId>>(&mut self, range: R) -> Result<ResyncSummary> {
        let Some(attached) = self.attached.as_mut() else {
            return Err(SynthError::EngineUnavailable);
        };
        let summary = VoiceGraphUpdater::resync(
            &mut attached.engine,
            self.voices.range_mut(range).map(|(_, voice)| voice),
            self.slots.get_all(),
            self.current_pitch,
        )?;
        Ok(summary)
    }

    fn edit_slots<F>(&mut self, edit: F) -> Result<bool>
    where
        F: FnOnce(&mut SlotConfigStore) -> bool,
    {
        if self.attached.is_none() {
            return Err(SynthError::EngineUnavailable);
        }
        let changed = edit(&mut self.slots);
        if changed && self.is_sounding() {
            self.resync()?;
        }
        Ok(changed)
    }

    /// Stop every voice and clear the registry and pitch, even when a voice
    /// fails to tear down. The first failure is returned.
    fn release_all(&mut self) -> Result<()> {
        let voices = std::mem::take(&mut self.voices);
        self.current_pitch = None;

        let Some(attached) = self.attached.as_mut() else {
            return Ok(());
        };

        let mut first_error = None;
        for (id, voice) in voices {
            if let Err(error) = voice.stop_and_release(&mut attached.engine) {
                warn!(%id, %error, "voice teardown failed");
                first_error.get_or_insert(error);
            }
        }

        match first_error {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}

impl NoteController<OfflineGraph> {
    /// Render the next block of the attached graph; silence when detached.
    pub fn render(&mut self, out: &mut [f32]) {
        match self.attached.as_mut() {
            Some(attached) => attached.engine.render_block(out),
            None => out.fill(0.0),
        }
    }
}

impl<E: AudioEngine> Default for NoteController<E> {
    fn default() -> Self {
        Self::new(SynthConfig::default())
    }
}
