pub mod dsp;
pub mod error;
pub mod graph; // Audio-engine boundary and the offline reference engine
pub mod io;
pub mod preset; // Named slot banks
pub mod synth; // Slot bank, voice lifecycle, note control

pub use error::{GraphError, SynthError};
pub use synth::{
    config::{RetriggerMode, SynthConfig},
    controller::NoteController,
    slot::{SlotConfig, SlotConfigStore, SlotPatch},
};

pub const MAX_BLOCK_SIZE: usize = 2048;

/// Replace NaN and infinities with zero.
#[inline]
pub(crate) fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
