//! Slot table widget - one row per slot, selected row highlighted

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Row, Table, TableState},
    Frame,
};

use polyslot::SlotConfig;

pub fn render_slots(frame: &mut Frame, area: Rect, slots: &[SlotConfig], selected: usize) {
    let header = Row::new([
        "#", "on", "wave", "vol", "oct", "detune", "cutoff", "sustain", "bend",
    ])
    .style(Style::default().fg(Color::DarkGray));

    let rows = slots.iter().map(|slot| {
        let style = if slot.enabled {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Row::new([
            slot.sort_index.to_string(),
            if slot.enabled { "●" } else { "○" }.to_string(),
            slot.waveform.name().to_string(),
            format!("{:.2}", slot.volume),
            format!("{:+}", slot.octave_offset),
            format!("{:+.0}c", slot.detune_cents),
            format!("{:.0}Hz", slot.filter_cutoff_hz),
            format!("{:.0}%", slot.sustain_percent),
            format!("{:.2}s", slot.bend_seconds),
        ])
        .style(style)
    });

    let widths = [
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(9),
        Constraint::Length(5),
        Constraint::Length(4),
        Constraint::Length(7),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(6),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().title(" Slots ").borders(Borders::ALL))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = TableState::default().with_selected(Some(selected));
    frame.render_stateful_widget(table, area, &mut state);
}
