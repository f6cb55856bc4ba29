//! Status bar widget - pitch, voices, preset and output level

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::state::StatusUpdate;

/// Audio statistics for display
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

pub struct StatusView<'a> {
    pub status: &'a StatusUpdate,
    pub preset: Option<&'a str>,
    pub sample_rate: f32,
    pub base_note: u8,
    pub legato: bool,
    pub stats: AudioStats,
}

pub fn render_status(frame: &mut Frame, area: Rect, view: &StatusView<'_>) {
    let block = Block::default().title(" polyslot ").borders(Borders::ALL);
    let status = view.status;

    let pitch = match status.pitch {
        Some(hz) => format!("♪ {hz:7.2} Hz  "),
        None => "♪    idle     ".to_string(),
    };

    let line = Line::from(vec![
        Span::styled(
            pitch,
            Style::default().fg(if status.pitch.is_some() {
                Color::Green
            } else {
                Color::DarkGray
            }),
        ),
        Span::styled(
            format!(
                "Voices: {}/{}  ",
                status.connected_count, status.voice_count
            ),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("Preset: {}  ", view.preset.unwrap_or("-")),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!(
                "Keys from MIDI {}{}  ",
                view.base_note,
                if view.legato { " (legato)" } else { "" }
            ),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            format!("{:.1}kHz {:.1}s  ", view.sample_rate / 1000.0, status.time),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Peak: {:.3}  RMS: {:.3}", view.stats.peak, view.stats.rms),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
