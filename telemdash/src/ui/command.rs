//! Last command status badge and response text.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use telemdash::{CommandStatus, SessionState};

pub fn draw_command(f: &mut ratatui::Frame<'_>, area: Rect, s: &SessionState) {
    let c = &s.command;
    let color = match c.status {
        CommandStatus::Idle => Color::DarkGray,
        CommandStatus::Sending => Color::Yellow,
        CommandStatus::Success => Color::Green,
        CommandStatus::Error => Color::Red,
    };
    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!(" {} ", c.status.label()),
            Style::default().fg(Color::Black).bg(color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(if c.last_name.is_empty() {
            String::new()
        } else {
            format!("  {}  ({:.2} ms)", c.last_name, c.latency_ms)
        }),
    ])];
    lines.extend(c.response_text.lines().map(|l| Line::from(l.to_string())));
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Command")),
        area,
    );
}
