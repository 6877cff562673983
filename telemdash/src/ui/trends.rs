//! Trend key picker and one sparkline per selected key.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Sparkline},
};
use telemdash::trends::MAX_TREND_KEYS;
use telemdash::SessionState;

use crate::ui::util::{fmt_value, scale_series};

const SERIES_COLORS: [Color; MAX_TREND_KEYS] = [Color::Cyan, Color::Green, Color::Magenta, Color::Yellow];

pub fn draw_trend_keys(f: &mut ratatui::Frame<'_>, area: Rect, s: &SessionState, cursor: usize) {
    let t = &s.trends;
    let visible = area.height.saturating_sub(2) as usize;
    let start = cursor.saturating_sub(visible.saturating_sub(1));
    let lines: Vec<Line> = t
        .filtered_keys()
        .iter()
        .enumerate()
        .skip(start)
        .take(visible)
        .map(|(i, k)| {
            let mark = if t.is_selected(k) { "[x]" } else { "[ ]" };
            let mut style = Style::default();
            if i == cursor {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Line::from(Span::styled(format!("{mark} {k}"), style))
        })
        .collect();
    let title = format!(
        "Trend keys {}/{} filter: '{}' ({} shown)",
        t.selected().len(),
        MAX_TREND_KEYS,
        t.filter_text(),
        t.filtered_keys().len()
    );
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title)),
        area,
    );
}

pub fn draw_trends(f: &mut ratatui::Frame<'_>, area: Rect, s: &SessionState) {
    let selected = s.trends.selected();
    // selected series plus latency
    let n = selected.len() + 1;
    let constraints: Vec<Constraint> = (0..n).map(|_| Constraint::Ratio(1, n as u32)).collect();
    let slots = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let max_points = area.width.saturating_sub(2) as usize;
    for (i, key) in selected.iter().enumerate() {
        let series = s.history.series(key);
        let title = match series.last() {
            Some(v) => format!("{key} — now: {}", fmt_value(*v)),
            None => format!("{key} — no data"),
        };
        draw_spark(f, slots[i], &title, &scale_series(&series, max_points), SERIES_COLORS[i % SERIES_COLORS.len()]);
    }

    let latency = s.history.latency_series();
    let title = format!(
        "latency_ms — now: {:.2} ({} / {} points)",
        s.latency_ms,
        s.history_points(),
        s.history.capacity()
    );
    draw_spark(f, slots[n - 1], &title, &scale_series(&latency, max_points), Color::Blue);
}

fn draw_spark(f: &mut ratatui::Frame<'_>, area: Rect, title: &str, data: &[u64], color: Color) {
    let spark = Sparkline::default()
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .data(data)
        .max(100)
        .style(Style::default().fg(color));
    f.render_widget(spark, area);
}
