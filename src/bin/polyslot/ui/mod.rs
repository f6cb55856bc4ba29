//! TUI module for polyslot
//!
//! Keyboard play, slot editing and preset switching. The UI keeps a mirror
//! of the slot bank for display and sends every edit to the audio thread.

mod slots;
pub mod state;
mod status;
mod waveform;

use std::time::Duration;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};
use tracing::warn;

use polyslot::{
    io::midi_note_to_freq,
    preset::PresetBank,
    synth::{
        message::SynthMessage,
        slot::{SlotConfig, SlotConfigStore, SlotPatch},
    },
};

use slots::render_slots;
use state::StatusUpdate;
use status::{render_status, AudioStats, StatusView};
use waveform::render_waveform;

/// Audio visualization buffer size
const VIS_BUFFER_SIZE: usize = 1024;

/// Home-row keys mapped to a major scale from the base note
const NOTE_KEYS: [(char, u8); 8] = [
    ('a', 0),
    ('s', 2),
    ('d', 4),
    ('f', 5),
    ('g', 7),
    ('h', 9),
    ('j', 11),
    ('k', 12),
];

const DEFAULT_BASE_NOTE: u8 = 60;

pub struct UiApp {
    control_tx: Producer<SynthMessage>,
    scope_rx: Consumer<f32>,
    status_rx: Consumer<StatusUpdate>,
    status: StatusUpdate,
    audio_buffer: Vec<f32>,
    sample_rate: f32,
    slots: SlotConfigStore,
    presets: PresetBank,
    selected: usize,
    base_note: u8,
    /// Note keys glide the sounding pitch instead of retriggering
    legato: bool,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        control_tx: Producer<SynthMessage>,
        scope_rx: Consumer<f32>,
        status_rx: Consumer<StatusUpdate>,
        sample_rate: f32,
        initial_slots: Vec<SlotConfig>,
    ) -> Self {
        let mut slots = SlotConfigStore::new(initial_slots.len().max(1));
        slots.replace_all(initial_slots);

        Self {
            control_tx,
            scope_rx,
            status_rx,
            status: StatusUpdate::default(),
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            sample_rate,
            slots,
            presets: PresetBank::builtin(),
            selected: 0,
            base_note: DEFAULT_BASE_NOTE,
            legato: false,
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            self.poll_status();

            terminal.draw(|frame| self.render(frame))?;

            // Handle keyboard input (non-blocking, ~60fps)
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        // Leave the device silent on exit
        self.send(SynthMessage::NoteOff);
        Ok(())
    }

    /// Keep the last VIS_BUFFER_SIZE output samples
    fn poll_audio(&mut self) {
        while let Ok(sample) = self.scope_rx.pop() {
            self.audio_buffer.push(sample);
        }
        if self.audio_buffer.len() > VIS_BUFFER_SIZE {
            let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
            self.audio_buffer.drain(0..excess);
        }
    }

    /// Keep only the latest status
    fn poll_status(&mut self) {
        while let Ok(status) = self.status_rx.pop() {
            self.status = status;
        }
    }

    fn send(&mut self, message: SynthMessage) {
        if let Err(err) = self.control_tx.push(message) {
            warn!(?err, "control queue full, message dropped");
        }
    }

    fn play(&mut self, offset: u8) {
        let frequency = midi_note_to_freq(self.base_note.saturating_add(offset).min(127));
        if self.legato && self.status.pitch.is_some() {
            self.send(SynthMessage::Glide { frequency });
        } else {
            self.send(SynthMessage::NoteOn { frequency });
        }
    }

    /// Apply `edit` to the selected slot locally and forward it.
    fn edit_selected(&mut self, edit: impl FnOnce(&SlotConfig) -> SlotPatch) {
        let index = self.selected;
        let Some(slot) = self.slots.get(index) else {
            return;
        };
        let patch = edit(slot);
        if self.slots.update(index, &patch) {
            self.send(SynthMessage::UpdateSlot { index, patch });
        }
    }

    fn next_preset(&mut self) {
        let Some(preset) = self.presets.select_next() else {
            return;
        };
        let data = preset.data.clone();
        self.slots.replace_all(data.clone());
        self.selected = self.selected.min(self.slots.len().saturating_sub(1));
        self.send(SynthMessage::ApplyPreset(data));
    }

    fn handle_key(&mut self, key: KeyCode) {
        if let KeyCode::Char(c) = key {
            if let Some(&(_, offset)) = NOTE_KEYS.iter().find(|(k, _)| *k == c) {
                self.play(offset);
                return;
            }
        }

        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char(' ') => self.send(SynthMessage::NoteOff),
            KeyCode::Char('l') => self.legato = !self.legato,
            KeyCode::Char('z') => self.base_note = self.base_note.saturating_sub(12).max(12),
            KeyCode::Char('x') => self.base_note = (self.base_note + 12).min(108),
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                self.selected = (self.selected + 1).min(self.slots.len().saturating_sub(1))
            }
            KeyCode::Char('e') => {
                let index = self.selected;
                if self.slots.toggle_enabled(index) {
                    self.send(SynthMessage::ToggleSlot { index });
                }
            }
            KeyCode::Char('w') => self.edit_selected(|s| SlotPatch::waveform(s.waveform.next())),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.edit_selected(|s| SlotPatch::volume((s.volume + 0.05).min(1.0)))
            }
            KeyCode::Char('-') => {
                self.edit_selected(|s| SlotPatch::volume((s.volume - 0.05).max(0.0)))
            }
            KeyCode::Char('[') => {
                self.edit_selected(|s| SlotPatch::octave((s.octave_offset - 1).max(-5)))
            }
            KeyCode::Char(']') => {
                self.edit_selected(|s| SlotPatch::octave((s.octave_offset + 1).min(5)))
            }
            KeyCode::Char(',') => {
                self.edit_selected(|s| SlotPatch::detune((s.detune_cents - 5.0).max(-100.0)))
            }
            KeyCode::Char('.') => {
                self.edit_selected(|s| SlotPatch::detune((s.detune_cents + 5.0).min(100.0)))
            }
            KeyCode::Char('c') => self.edit_selected(|s| {
                SlotPatch::filter_cutoff((s.filter_cutoff_hz - 50.0).max(0.0))
            }),
            KeyCode::Char('C') => self.edit_selected(|s| {
                SlotPatch::filter_cutoff((s.filter_cutoff_hz + 50.0).min(20_000.0))
            }),
            KeyCode::Char('b') => {
                self.edit_selected(|s| SlotPatch::bend((s.bend_seconds - 0.05).max(0.0)))
            }
            KeyCode::Char('B') => {
                self.edit_selected(|s| SlotPatch::bend((s.bend_seconds + 0.05).min(1.0)))
            }
            KeyCode::Char('u') => {
                self.edit_selected(|s| SlotPatch::sustain((s.sustain_percent - 5.0).max(0.0)))
            }
            KeyCode::Char('U') => {
                self.edit_selected(|s| SlotPatch::sustain((s.sustain_percent + 5.0).min(100.0)))
            }
            KeyCode::Char('p') => self.next_preset(),
            _ => {}
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Min(7),    // Slot table
                Constraint::Length(8), // Oscilloscope
                Constraint::Length(2), // Help
            ])
            .split(area);

        let view = StatusView {
            status: &self.status,
            preset: self.presets.selected().map(|p| p.name.as_str()),
            sample_rate: self.sample_rate,
            base_note: self.base_note,
            legato: self.legato,
            stats: AudioStats::from_buffer(&self.audio_buffer),
        };
        render_status(frame, chunks[0], &view);
        render_slots(frame, chunks[1], self.slots.get_all(), self.selected);
        render_waveform(frame, chunks[2], &self.audio_buffer);

        let help = Paragraph::new(
            " [a-k] Play  [Space] Stop  [l] Legato  [z/x] Octave  [↑/↓] Slot  [e] On/Off  [w] Wave\n \
             [-/+] Vol  [[/]] Oct  [,/.] Detune  [c/C] Cutoff  [u/U] Sustain  [b/B] Bend  [p] Preset  [q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }
}
