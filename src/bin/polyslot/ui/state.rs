//! Status snapshot sent from the audio thread (Copy, allocation-free)

use polyslot::{
    graph::{AudioEngine, OfflineGraph},
    NoteController,
};

#[derive(Clone, Copy, Debug, Default)]
pub struct StatusUpdate {
    /// Registered voices, muted ones included
    pub voice_count: usize,
    /// Voices currently feeding the filter chain
    pub connected_count: usize,
    pub pitch: Option<f32>,
    /// Engine clock in seconds
    pub time: f64,
}

impl StatusUpdate {
    pub fn capture(synth: &NoteController<OfflineGraph>) -> Self {
        Self {
            voice_count: synth.voice_count(),
            connected_count: synth
                .voices()
                .filter(|(_, voice)| voice.is_connected())
                .count(),
            pitch: synth.current_pitch(),
            time: synth.engine().map(|e| e.current_time()).unwrap_or(0.0),
        }
    }
}
