//! Named slot banks.
//!
//! A preset is just a name and a list of slots; applying one replaces the
//! controller's bank wholesale. Persisting the bank is left to the host.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{dsp::oscillator::Waveform, synth::slot::SlotConfig};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub name: String,
    /// Empty means "the default bank"
    pub data: Vec<SlotConfig>,
}

impl Preset {
    pub fn new(name: impl Into<String>, data: Vec<SlotConfig>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Result of [`PresetBank::delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    NotFound,
    Removed,
    /// The active preset went away; the caller should clear the slot bank,
    /// which restores the defaults.
    RemovedSelected,
}

/// Ordered, name-keyed preset collection with a current selection.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PresetBank {
    presets: Vec<Preset>,
    selected: Option<String>,
}

impl PresetBank {
    pub fn new(presets: Vec<Preset>) -> Self {
        Self {
            presets,
            selected: None,
        }
    }

    /// Bank seeded with the factory presets.
    pub fn builtin() -> Self {
        Self::new(builtin_presets())
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.name == name)
    }

    pub fn selected(&self) -> Option<&Preset> {
        self.selected.as_deref().and_then(|name| self.get(name))
    }

    /// Insert, or overwrite the preset with the same name in place.
    pub fn save(&mut self, preset: Preset) {
        match self.presets.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => self.presets.push(preset),
        }
    }

    pub fn select(&mut self, name: &str) -> Option<&Preset> {
        let index = self.presets.iter().position(|p| p.name == name)?;
        self.selected = Some(name.to_owned());
        debug!(preset = name, "preset selected");
        self.presets.get(index)
    }

    /// Select the preset after the current one, wrapping around.
    pub fn select_next(&mut self) -> Option<&Preset> {
        if self.presets.is_empty() {
            return None;
        }
        let next = match self
            .selected
            .as_deref()
            .and_then(|name| self.presets.iter().position(|p| p.name == name))
        {
            Some(index) => (index + 1) % self.presets.len(),
            None => 0,
        };
        let name = self.presets[next].name.clone();
        self.select(&name)
    }

    pub fn delete(&mut self, name: &str) -> Deletion {
        let before = self.presets.len();
        self.presets.retain(|p| p.name != name);
        if self.presets.len() == before {
            return Deletion::NotFound;
        }

        if self.selected.as_deref() == Some(name) {
            self.selected = None;
            Deletion::RemovedSelected
        } else {
            Deletion::Removed
        }
    }
}

impl Default for PresetBank {
    fn default() -> Self {
        Self::builtin()
    }
}

fn slot(
    sort_index: i32,
    waveform: Waveform,
    enabled: bool,
    detune_cents: f32,
    filter_cutoff_hz: f32,
    volume: f32,
    bend_seconds: f32,
) -> SlotConfig {
    SlotConfig {
        enabled,
        detune_cents,
        filter_cutoff_hz,
        volume,
        bend_seconds,
        ..SlotConfig::new(sort_index, waveform)
    }
}

/// Spare square and triangle slots that the factory presets keep switched off.
fn parked_tail() -> [SlotConfig; 2] {
    [
        SlotConfig::new(3, Waveform::Square).disabled(),
        SlotConfig::new(4, Waveform::Triangle).disabled(),
    ]
}

pub fn builtin_presets() -> Vec<Preset> {
    let with_tail = |head: [SlotConfig; 2]| -> Vec<SlotConfig> {
        head.into_iter().chain(parked_tail()).collect()
    };

    vec![
        Preset::new("Standard", Vec::new()),
        Preset::new(
            "808",
            with_tail([
                slot(1, Waveform::Sine, true, 0.0, 59.0, 1.0, 0.0),
                slot(2, Waveform::Sawtooth, true, -12.0, 10.0, 1.0, 0.0),
            ]),
        ),
        Preset::new(
            "Dubstep Wobble",
            with_tail([
                slot(1, Waveform::Sine, true, 96.0, 442.0, 0.5, 0.0),
                slot(2, Waveform::Square, true, 1.0, 98.0, 0.5, 0.0),
            ]),
        ),
        Preset::new(
            "Laser",
            with_tail([
                slot(1, Waveform::Sine, true, 96.0, 442.0, 0.1, 0.14),
                slot(2, Waveform::Square, false, 1.0, 98.0, 0.1, 0.0),
            ]),
        ),
        Preset::new(
            "Lead",
            with_tail([
                slot(1, Waveform::Sine, true, 0.0, 59.0, 0.1, 0.0),
                slot(2, Waveform::Sawtooth, true, -12.0, 87.0, 0.1, 0.0),
            ]),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_four_slot_banks() {
        let bank = PresetBank::builtin();
        let names: Vec<&str> = bank.presets().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Standard", "808", "Dubstep Wobble", "Laser", "Lead"]);

        for preset in &bank.presets()[1..] {
            let keys: Vec<i32> = preset.data.iter().map(|s| s.sort_index).collect();
            assert_eq!(keys, vec![1, 2, 3, 4], "{}", preset.name);
        }

        let laser = bank.get("Laser").unwrap();
        assert_eq!(laser.data[0].bend_seconds, 0.14);
        assert!(!laser.data[1].enabled);
    }

    #[test]
    fn save_upserts_by_name() {
        let mut bank = PresetBank::builtin();
        let count = bank.presets().len();

        bank.save(Preset::new("Lead", Vec::new()));
        assert_eq!(bank.presets().len(), count);
        assert!(bank.get("Lead").unwrap().data.is_empty());
        assert_eq!(bank.presets()[4].name, "Lead");

        bank.save(Preset::new("Pad", vec![SlotConfig::new(1, Waveform::Triangle)]));
        assert_eq!(bank.presets().len(), count + 1);
    }

    #[test]
    fn deleting_the_selection_asks_for_a_reset() {
        let mut bank = PresetBank::builtin();
        bank.select("808").unwrap();

        assert_eq!(bank.delete("Lead"), Deletion::Removed);
        assert_eq!(bank.selected().map(|p| p.name.as_str()), Some("808"));

        assert_eq!(bank.delete("808"), Deletion::RemovedSelected);
        assert!(bank.selected().is_none());
        assert_eq!(bank.delete("808"), Deletion::NotFound);
    }

    #[test]
    fn select_next_wraps() {
        let mut bank = PresetBank::builtin();
        assert_eq!(bank.select_next().unwrap().name, "Standard");
        bank.select("Lead");
        assert_eq!(bank.select_next().unwrap().name, "Standard");
        assert_eq!(bank.select_next().unwrap().name, "808");
    }

    #[test]
    fn unknown_selection_is_none() {
        let mut bank = PresetBank::builtin();
        assert!(bank.select("Nope").is_none());
        assert!(bank.selected().is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn presets_round_trip_through_json() {
        let bank = PresetBank::builtin();
        let json = serde_json::to_string(bank.presets()).unwrap();
        let back: Vec<Preset> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bank.presets());
        assert!(json.contains("\"waveform\":\"sawtooth\""));
    }
}
