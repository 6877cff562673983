//! Top header: connection label, device address, poll health and logging state.

use chrono::Utc;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use telemdash::{ConnectionState, SessionState};

pub fn draw_header(f: &mut ratatui::Frame<'_>, area: Rect, s: &SessionState) {
    let state = s.connection_state();
    let badge_color = match state {
        ConnectionState::Connected => Color::Green,
        ConnectionState::Reconnecting => Color::Yellow,
        ConnectionState::Disconnected => Color::DarkGray,
    };
    let mut status = vec![
        Span::styled(
            format!(" {} ", state.label()),
            Style::default().fg(Color::Black).bg(badge_color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "  {}  every {}  | latency {:.2} ms | failures {} | last seen {} | {}",
            s.device_address(),
            s.config.poll_interval,
            s.latency_ms,
            s.consecutive_failures,
            s.last_seen_text(Utc::now()),
            s.logging_status_label(),
        )),
    ];
    if !s.telemetry.device_version.is_empty() {
        status.push(Span::raw(format!(" | fw {}", s.telemetry.device_version)));
    }
    if !s.telemetry.device_git_hash.is_empty() {
        status.push(Span::raw(format!(" ({})", s.telemetry.device_git_hash)));
    }

    let error_line = if s.last_error.is_empty() {
        Line::from(Span::styled("no errors", Style::default().fg(Color::DarkGray)))
    } else {
        Line::from(Span::styled(
            format!("last error: {}", s.last_error),
            Style::default().fg(Color::Red),
        ))
    };

    let p = Paragraph::new(vec![Line::from(status), error_line])
        .block(Block::default().borders(Borders::BOTTOM).title("telemdash (press 'q' to quit)"));
    f.render_widget(p, area);
}
