//! Summary cards (mode, uptime, temperature, voltage, current) and the fault list.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use telemdash::SessionState;

pub fn draw_summary(f: &mut ratatui::Frame<'_>, area: Rect, s: &SessionState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let d = &s.telemetry.summary;
    let lines = if s.telemetry.is_empty() {
        vec![Line::from("waiting for telemetry...")]
    } else {
        vec![
            Line::from(format!("Mode     {}", d.mode)),
            Line::from(format!("Uptime   {} s", d.uptime_s)),
            Line::from(format!("Temp     {:.2} °C", d.temp_c)),
            Line::from(format!("Voltage  {:.3} V", d.voltage_v)),
            Line::from(format!("Current  {:.3} A", d.current_a)),
        ]
    };
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Device")),
        cols[0],
    );

    let title = format!("Faults ({})", s.fault_count());
    let faults: Vec<Line> = if s.telemetry.faults.is_empty() {
        vec![Line::from(Span::styled("none", Style::default().fg(Color::Green)))]
    } else {
        s.telemetry
            .faults
            .iter()
            .map(|x| Line::from(Span::styled(x.clone(), Style::default().fg(Color::Red))))
            .collect()
    };
    f.render_widget(
        Paragraph::new(faults).block(Block::default().borders(Borders::ALL).title(title)),
        cols[1],
    );
}
