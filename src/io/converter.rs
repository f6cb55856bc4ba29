use tracing::trace;

use crate::{
    io::midi::{MidiEvent, ALL_NOTES_OFF},
    synth::message::SynthMessage,
};

/// Bend range of a full pitch-wheel throw, in semitones.
pub const PITCH_BEND_SEMITONES: f32 = 2.0;

/// Stateless mapping of one MIDI event on `channel_filter`.
///
/// Note-on with velocity 0 counts as note-off. Pitch bend needs the held
/// note, see [`MidiAdapter`].
pub fn midi_to_synth(midi: MidiEvent, channel_filter: u8) -> Option<SynthMessage> {
    match midi {
        MidiEvent::NoteOn {
            channel,
            key,
            velocity,
        } if channel == channel_filter => {
            if velocity == 0 {
                Some(SynthMessage::NoteOff)
            } else {
                Some(SynthMessage::NoteOn {
                    frequency: midi_note_to_freq(key),
                })
            }
        }
        MidiEvent::NoteOff { channel, .. } if channel == channel_filter => {
            Some(SynthMessage::NoteOff)
        }
        MidiEvent::ControlChange {
            channel,
            controller: ALL_NOTES_OFF,
            ..
        } if channel == channel_filter => Some(SynthMessage::NoteOff),
        _ => None,
    }
}

pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

/// Frequency ratio for a 14-bit pitch-wheel position.
pub fn pitch_bend_ratio(value: i16) -> f32 {
    let amount = (value as f32 / 8192.0).clamp(-1.0, 1.0);
    2.0_f32.powf(amount * PITCH_BEND_SEMITONES / 12.0)
}

/// Single-note MIDI front end.
///
/// Tracks the held key so that releasing an older key does not cut the
/// current note, and turns the pitch wheel into glides around it.
#[derive(Debug, Clone)]
pub struct MidiAdapter {
    channel: u8,
    held: Option<u8>,
    bend: i16,
}

impl MidiAdapter {
    pub fn new(channel: u8) -> Self {
        Self {
            channel,
            held: None,
            bend: 0,
        }
    }

    pub fn held_key(&self) -> Option<u8> {
        self.held
    }

    pub fn convert(&mut self, midi: MidiEvent) -> Option<SynthMessage> {
        if midi.channel() != self.channel {
            return None;
        }

        let message = match midi {
            MidiEvent::NoteOn { key, velocity, .. } if velocity > 0 => {
                self.held = Some(key);
                Some(SynthMessage::NoteOn {
                    frequency: self.bent_frequency(key),
                })
            }
            MidiEvent::NoteOn { key, .. } | MidiEvent::NoteOff { key, .. } => {
                if self.held == Some(key) {
                    self.held = None;
                    Some(SynthMessage::NoteOff)
                } else {
                    None
                }
            }
            MidiEvent::PitchBend { value, .. } => {
                self.bend = value;
                self.held.map(|key| SynthMessage::Glide {
                    frequency: self.bent_frequency(key),
                })
            }
            MidiEvent::ControlChange {
                controller: ALL_NOTES_OFF,
                ..
            } => {
                self.held = None;
                Some(SynthMessage::NoteOff)
            }
            _ => None,
        };

        trace!(?midi, ?message, "midi converted");
        message
    }

    fn bent_frequency(&self, key: u8) -> f32 {
        midi_note_to_freq(key) * pitch_bend_ratio(self.bend)
    }
}
