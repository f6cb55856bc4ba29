#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::synth::slot::{SlotConfig, SlotPatch};

/// Control events sent from a UI or MIDI thread to the thread that owns the
/// controller.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthMessage {
    NoteOn { frequency: f32 },
    NoteOff,
    /// Move the sounding pitch; ignored while idle
    Glide { frequency: f32 },
    UpdateSlot { index: usize, patch: SlotPatch },
    ToggleSlot { index: usize },
    /// Replace the whole slot bank; empty restores the defaults
    ApplyPreset(Vec<SlotConfig>),
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<SynthMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        Consumer::pop(self).ok()
    }
}

impl MessageReceiver for std::collections::VecDeque<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        self.pop_front()
    }
}
