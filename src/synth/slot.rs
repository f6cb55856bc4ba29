//! Oscillator slot configuration and the ordered slot bank.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{dsp::oscillator::Waveform, finite_or_zero};

pub const DEFAULT_VOLUME: f32 = 0.1;
pub const DEFAULT_CUTOFF_HZ: f32 = 1_000.0;

/// One configurable oscillator definition in the bank.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotConfig {
    /// Stable ordering key, unique within the bank
    pub sort_index: i32,
    pub waveform: Waveform,
    pub enabled: bool,
    /// Detune in cents, typically -100..100
    pub detune_cents: f32,
    /// Octave shift, typically -5..5
    pub octave_offset: i32,
    /// 0..100; scales the envelope's fade timing and peak
    pub sustain_percent: f32,
    /// 0..1
    pub volume: f32,
    /// Cutoff of this slot's filter in the chain, in Hz
    pub filter_cutoff_hz: f32,
    /// Duration unit of the pitch-glide stages, 0..1 seconds
    pub bend_seconds: f32,
}

impl SlotConfig {
    /// An enabled slot with the bank's neutral settings.
    pub fn new(sort_index: i32, waveform: Waveform) -> Self {
        Self {
            sort_index,
            waveform,
            enabled: true,
            detune_cents: 0.0,
            octave_offset: 0,
            sustain_percent: 0.0,
            volume: DEFAULT_VOLUME,
            filter_cutoff_hz: DEFAULT_CUTOFF_HZ,
            bend_seconds: 0.0,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Coerce non-finite numbers to zero and clamp to the knob ranges.
    pub fn sanitized(mut self) -> Self {
        self.detune_cents = finite_or_zero(self.detune_cents);
        self.sustain_percent = finite_or_zero(self.sustain_percent).clamp(0.0, 100.0);
        self.volume = finite_or_zero(self.volume).clamp(0.0, 1.0);
        self.filter_cutoff_hz = finite_or_zero(self.filter_cutoff_hz).max(0.0);
        self.bend_seconds = finite_or_zero(self.bend_seconds).max(0.0);
        self
    }

    /// Shallow merge: every field present in `patch` overwrites ours.
    pub fn merge(mut self, patch: &SlotPatch) -> Self {
        if let Some(v) = patch.sort_index {
            self.sort_index = v;
        }
        if let Some(v) = patch.waveform {
            self.waveform = v;
        }
        if let Some(v) = patch.enabled {
            self.enabled = v;
        }
        if let Some(v) = patch.detune_cents {
            self.detune_cents = v;
        }
        if let Some(v) = patch.octave_offset {
            self.octave_offset = v;
        }
        if let Some(v) = patch.sustain_percent {
            self.sustain_percent = v;
        }
        if let Some(v) = patch.volume {
            self.volume = v;
        }
        if let Some(v) = patch.filter_cutoff_hz {
            self.filter_cutoff_hz = v;
        }
        if let Some(v) = patch.bend_seconds {
            self.bend_seconds = v;
        }
        self
    }
}

/// Partial slot update; `None` fields are left untouched.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SlotPatch {
    pub sort_index: Option<i32>,
    pub waveform: Option<Waveform>,
    pub enabled: Option<bool>,
    pub detune_cents: Option<f32>,
    pub octave_offset: Option<i32>,
    pub sustain_percent: Option<f32>,
    pub volume: Option<f32>,
    pub filter_cutoff_hz: Option<f32>,
    pub bend_seconds: Option<f32>,
}

impl SlotPatch {
    pub fn waveform(waveform: Waveform) -> Self {
        Self {
            waveform: Some(waveform),
            ..Self::default()
        }
    }

    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }

    pub fn detune(cents: f32) -> Self {
        Self {
            detune_cents: Some(cents),
            ..Self::default()
        }
    }

    pub fn octave(offset: i32) -> Self {
        Self {
            octave_offset: Some(offset),
            ..Self::default()
        }
    }

    pub fn sustain(percent: f32) -> Self {
        Self {
            sustain_percent: Some(percent),
            ..Self::default()
        }
    }

    pub fn volume(volume: f32) -> Self {
        Self {
            volume: Some(volume),
            ..Self::default()
        }
    }

    pub fn filter_cutoff(hz: f32) -> Self {
        Self {
            filter_cutoff_hz: Some(hz),
            ..Self::default()
        }
    }

    pub fn bend(seconds: f32) -> Self {
        Self {
            bend_seconds: Some(seconds),
            ..Self::default()
        }
    }
}

/// The canonical starting bank: sine, sawtooth, square, triangle.
pub fn default_bank() -> Vec<SlotConfig> {
    [
        Waveform::Sine,
        Waveform::Sawtooth,
        Waveform::Square,
        Waveform::Triangle,
    ]
    .into_iter()
    .zip(1..)
    .map(|(waveform, sort_index)| SlotConfig::new(sort_index, waveform))
    .collect()
}

/// Ordered bank of slot configurations.
///
/// Slots are always kept in ascending `sort_index` order with unique keys,
/// never exceed `capacity`, and the bank is never left empty.
#[derive(Debug, Clone)]
pub struct SlotConfigStore {
    slots: Vec<SlotConfig>,
    capacity: usize,
}

impl SlotConfigStore {
    pub fn new(capacity: usize) -> Self {
        let mut store = Self {
            slots: Vec::new(),
            capacity,
        };
        store.reset_to_defaults();
        store
    }

    pub fn get_all(&self) -> &[SlotConfig] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> Option<&SlotConfig> {
        self.slots.get(index)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Position of the slot carrying `sort_index`.
    pub fn position_of(&self, sort_index: i32) -> Option<usize> {
        self.slots.iter().position(|s| s.sort_index == sort_index)
    }

    /// Merge `patch` into the slot at `index`.
    ///
    /// Returns `false` (and changes nothing) when `index` is out of range. A
    /// `sort_index` that would collide with another slot is dropped from the
    /// patch; the remaining fields still apply.
    pub fn update(&mut self, index: usize, patch: &SlotPatch) -> bool {
        let Some(current) = self.slots.get(index).copied() else {
            return false;
        };

        let mut patch = *patch;
        if let Some(key) = patch.sort_index {
            let taken = self
                .slots
                .iter()
                .enumerate()
                .any(|(i, s)| i != index && s.sort_index == key);
            if taken {
                warn!(index, sort_index = key, "sort index already in use, keeping the old one");
                patch.sort_index = None;
            }
        }

        self.slots[index] = current.merge(&patch).sanitized();
        if patch.sort_index.is_some() {
            self.slots.sort_by_key(|s| s.sort_index);
        }
        true
    }

    /// Flip the `enabled` flag of the slot at `index`.
    pub fn toggle_enabled(&mut self, index: usize) -> bool {
        match self.slots.get(index) {
            Some(slot) => {
                let patch = SlotPatch::enabled(!slot.enabled);
                self.update(index, &patch)
            }
            None => false,
        }
    }

    /// Replace the whole bank at once (preset load). An empty list restores
    /// the default bank.
    pub fn replace_all(&mut self, slots: Vec<SlotConfig>) {
        if slots.is_empty() {
            self.reset_to_defaults();
            return;
        }
        self.slots = slots;
        self.normalize();
    }

    pub fn reset_to_defaults(&mut self) {
        self.slots = default_bank();
        self.normalize();
    }

    fn normalize(&mut self) {
        self.slots.sort_by_key(|s| s.sort_index);

        if self.slots.len() > self.capacity {
            warn!(
                slots = self.slots.len(),
                capacity = self.capacity,
                "bank exceeds the filter chain, dropping trailing slots"
            );
            self.slots.truncate(self.capacity);
        }

        // Renumber colliding keys upward so order is kept and keys stay unique
        for i in 1..self.slots.len() {
            let previous = self.slots[i - 1].sort_index;
            if self.slots[i].sort_index > previous {
                continue;
            }
            match previous.checked_add(1) {
                Some(next) => self.slots[i].sort_index = next,
                None => {
                    // No room above i32::MAX; fall back to 1..=n in the current order
                    for (position, slot) in self.slots.iter_mut().enumerate() {
                        slot.sort_index = (position as i32).saturating_add(1);
                    }
                    break;
                }
            }
        }

        for slot in &mut self.slots {
            *slot = slot.sanitized();
        }
    }
}

impl Default for SlotConfigStore {
    fn default() -> Self {
        Self::new(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sort_keys(store: &SlotConfigStore) -> Vec<i32> {
        store.get_all().iter().map(|s| s.sort_index).collect()
    }

    #[test]
    fn default_bank_layout() {
        let store = SlotConfigStore::new(4);
        let waveforms: Vec<Waveform> = store.get_all().iter().map(|s| s.waveform).collect();

        assert_eq!(sort_keys(&store), vec![1, 2, 3, 4]);
        assert_eq!(
            waveforms,
            vec![
                Waveform::Sine,
                Waveform::Sawtooth,
                Waveform::Square,
                Waveform::Triangle
            ]
        );
        for slot in store.get_all() {
            assert!(slot.enabled);
            assert_eq!(slot.volume, 0.1);
            assert_eq!(slot.octave_offset, 0);
            assert_eq!(slot.filter_cutoff_hz, 1_000.0);
            assert_eq!(slot.sustain_percent, 0.0);
            assert_eq!(slot.bend_seconds, 0.0);
            assert_eq!(slot.detune_cents, 0.0);
        }
    }

    #[test]
    fn emptying_restores_defaults() {
        let mut store = SlotConfigStore::new(4);
        store.replace_all(vec![SlotConfig::new(7, Waveform::Square)]);
        assert_eq!(store.len(), 1);

        store.replace_all(Vec::new());

        assert_eq!(store.len(), 4);
        assert_eq!(sort_keys(&store), vec![1, 2, 3, 4]);
        assert_eq!(store.get(0).map(|s| s.waveform), Some(Waveform::Sine));
    }

    #[test]
    fn update_merges_only_present_fields() {
        let mut store = SlotConfigStore::new(4);
        assert!(store.update(1, &SlotPatch::volume(0.8)));

        let slot = store.get(1).copied().unwrap();
        assert_eq!(slot.volume, 0.8);
        assert_eq!(slot.waveform, Waveform::Sawtooth);
        assert!(slot.enabled);
    }

    #[test]
    fn out_of_range_update_is_a_noop() {
        let mut store = SlotConfigStore::new(4);
        let before = store.get_all().to_vec();

        assert!(!store.update(9, &SlotPatch::volume(0.5)));
        assert!(!store.toggle_enabled(4));
        assert_eq!(store.get_all(), &before[..]);
    }

    #[test]
    fn colliding_sort_index_is_rejected() {
        let mut store = SlotConfigStore::new(4);
        let patch = SlotPatch {
            sort_index: Some(3),
            volume: Some(0.4),
            ..SlotPatch::default()
        };

        assert!(store.update(0, &patch));

        assert_eq!(sort_keys(&store), vec![1, 2, 3, 4]);
        assert_eq!(store.get(0).unwrap().volume, 0.4);
    }

    #[test]
    fn moving_a_slot_keeps_order() {
        let mut store = SlotConfigStore::new(4);
        let patch = SlotPatch {
            sort_index: Some(10),
            ..SlotPatch::default()
        };

        store.update(0, &patch);

        assert_eq!(sort_keys(&store), vec![2, 3, 4, 10]);
        assert_eq!(store.position_of(10), Some(3));
        assert_eq!(store.get(3).unwrap().waveform, Waveform::Sine);
    }

    #[test]
    fn non_finite_input_is_coerced() {
        let mut store = SlotConfigStore::new(4);
        let patch = SlotPatch {
            sustain_percent: Some(f32::NAN),
            volume: Some(f32::INFINITY),
            detune_cents: Some(f32::NEG_INFINITY),
            ..SlotPatch::default()
        };

        store.update(2, &patch);

        let slot = store.get(2).unwrap();
        assert_eq!(slot.sustain_percent, 0.0);
        assert_eq!(slot.volume, 0.0);
        assert_eq!(slot.detune_cents, 0.0);
    }

    #[test]
    fn replacement_is_sorted_deduplicated_and_capped() {
        let mut store = SlotConfigStore::new(3);
        store.replace_all(vec![
            SlotConfig::new(5, Waveform::Triangle),
            SlotConfig::new(2, Waveform::Sine),
            SlotConfig::new(2, Waveform::Square),
            SlotConfig::new(9, Waveform::Sawtooth),
        ]);

        assert_eq!(sort_keys(&store), vec![2, 3, 5]);
        assert_eq!(store.get(1).unwrap().waveform, Waveform::Square);
    }

    #[test]
    fn duplicate_max_keys_renumber_without_overflow() {
        let mut store = SlotConfigStore::new(4);
        store.replace_all(vec![
            SlotConfig::new(i32::MAX, Waveform::Sine),
            SlotConfig::new(i32::MAX, Waveform::Square),
            SlotConfig::new(7, Waveform::Triangle),
        ]);

        assert_eq!(sort_keys(&store), vec![1, 2, 3]);
        let waveforms: Vec<Waveform> = store.get_all().iter().map(|s| s.waveform).collect();
        assert_eq!(
            waveforms,
            vec![Waveform::Triangle, Waveform::Sine, Waveform::Square]
        );
    }

    #[test]
    fn toggle_flips_enabled() {
        let mut store = SlotConfigStore::new(4);
        store.toggle_enabled(2);
        assert!(!store.get(2).unwrap().enabled);
        store.toggle_enabled(2);
        assert!(store.get(2).unwrap().enabled);
    }
}
