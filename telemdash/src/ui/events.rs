//! Event log panel, newest line at the bottom.

use ratatui::{
    layout::Rect,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use telemdash::SessionState;

pub fn draw_events(f: &mut ratatui::Frame<'_>, area: Rect, s: &SessionState) {
    let visible = area.height.saturating_sub(2) as usize;
    let skip = s.events.len().saturating_sub(visible);
    let text: Vec<ratatui::text::Line> = s
        .events
        .iter()
        .skip(skip)
        .map(|l| ratatui::text::Line::from(l.as_str()))
        .collect();
    let p = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(format!("Events ({})", s.events.len())));
    f.render_widget(p, area);
}
