#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};

/// What `note_on` does with voices that are already sounding.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetriggerMode {
    /// Keep existing voices and append a fresh set (growing polyphony)
    #[default]
    Layer,
    /// Stop and release existing voices before building the new set
    Restart,
}

/// Engine-wide synth settings, fixed for the lifetime of an attachment.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthConfig {
    /// Number of slots, and length of the filter chain
    pub slot_count: usize,
    /// Level of the shared master bus
    pub master_gain: f32,
    /// Waveshaper amount used for every voice
    pub distortion_amount: f32,
    pub retrigger: RetriggerMode,
    /// Resonance of every filter in the chain, 0..0.95
    pub filter_resonance: f32,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            slot_count: 4,
            master_gain: 0.1,
            distortion_amount: 1.0,
            retrigger: RetriggerMode::Layer,
            filter_resonance: 0.5,
        }
    }
}

impl SynthConfig {
    pub fn with_slot_count(mut self, slot_count: usize) -> Self {
        self.slot_count = slot_count;
        self
    }

    pub fn with_master_gain(mut self, master_gain: f32) -> Self {
        self.master_gain = master_gain;
        self
    }

    pub fn with_distortion_amount(mut self, amount: f32) -> Self {
        self.distortion_amount = amount;
        self
    }

    pub fn with_retrigger(mut self, retrigger: RetriggerMode) -> Self {
        self.retrigger = retrigger;
        self
    }

    pub fn with_filter_resonance(mut self, resonance: f32) -> Self {
        self.filter_resonance = resonance;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.slot_count == 0 {
            return Err(SynthError::InvalidConfig(
                "slot_count must be at least 1".into(),
            ));
        }
        if !self.master_gain.is_finite() || self.master_gain < 0.0 {
            return Err(SynthError::InvalidConfig(format!(
                "master_gain must be finite and non-negative, got {}",
                self.master_gain
            )));
        }
        if !self.distortion_amount.is_finite() || self.distortion_amount < 0.0 {
            return Err(SynthError::InvalidConfig(format!(
                "distortion_amount must be finite and non-negative, got {}",
                self.distortion_amount
            )));
        }
        if !(0.0..1.0).contains(&self.filter_resonance) {
            return Err(SynthError::InvalidConfig(format!(
                "filter_resonance must be in [0, 1), got {}",
                self.filter_resonance
            )));
        }
        Ok(())
    }
}
