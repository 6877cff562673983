//! Raw telemetry rows, sorted by key.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table},
};
use telemdash::SessionState;

use crate::ui::util::truncate_middle;

pub fn draw_telemetry(f: &mut ratatui::Frame<'_>, area: Rect, s: &SessionState) {
    let value_w = area.width.saturating_sub(22) as usize;
    let rows = s.telemetry.rows.iter().map(|r| {
        let numeric = s.telemetry.numeric_keys.binary_search(&r.key).is_ok();
        let style = if numeric { Style::default().fg(Color::Cyan) } else { Style::default() };
        Row::new(vec![
            Cell::from(r.key.clone()),
            Cell::from(truncate_middle(&r.value, value_w.max(8))).style(style),
        ])
    });
    let header = Row::new(vec!["Key", "Value"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let table = Table::new(rows, [Constraint::Length(18), Constraint::Min(8)])
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(format!(
            "Telemetry (sample #{})",
            s.sample_index
        )));
    f.render_widget(table, area);
}

/// Pretty-printed payload as received, for debugging odd firmware.
pub fn draw_raw_json(f: &mut ratatui::Frame<'_>, area: Rect, s: &SessionState) {
    let p = ratatui::widgets::Paragraph::new(s.telemetry.raw_json())
        .block(Block::default().borders(Borders::ALL).title("Raw payload (j to close)"));
    f.render_widget(p, area);
}
