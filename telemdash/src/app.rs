//! App state and main loop: input handling, snapshotting the session, and drawing.

use std::{io, time::Duration};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Terminal,
};
use telemdash::{Dashboard, SessionState};
use tracing::debug;

use crate::ui::{
    command::draw_command,
    events::draw_events,
    header::draw_header,
    summary::draw_summary,
    telemetry::{draw_raw_json, draw_telemetry},
    trends::{draw_trend_keys, draw_trends},
};

const TICK: Duration = Duration::from_millis(100);

const HELP: &str = "c connect  d disconnect  p interval  H host  P port  l log  e export  \
r reset  f clear faults  i idle  u run  / filter  space toggle  a select  x clear  : command  j raw  C clear events  q quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Filter,
    Command,
    Host,
    Port,
}

impl InputMode {
    fn prompt(self) -> &'static str {
        match self {
            InputMode::Normal => "",
            InputMode::Filter => "filter> ",
            InputMode::Command => "command (name {args})> ",
            InputMode::Host => "host> ",
            InputMode::Port => "port> ",
        }
    }
}

pub struct App {
    dash: Dashboard,
    mode: InputMode,
    input: String,
    // index into the filtered trend keys
    key_cursor: usize,
    show_raw: bool,
    should_quit: bool,
}

/// Split `reset` / `set_mode {"mode":"RUN"}` into name and args text.
pub fn split_command_line(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (line, ""),
    }
}

impl App {
    pub fn new(dash: Dashboard) -> Self {
        Self {
            dash,
            mode: InputMode::Normal,
            input: String::new(),
            key_cursor: 0,
            show_raw: false,
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        // Terminal setup
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        // Main loop
        let res = self.event_loop(&mut terminal).await;

        // Teardown
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res
    }

    async fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> anyhow::Result<()> {
        loop {
            // Input (non-blocking)
            while event::poll(Duration::from_millis(10))? {
                if let Event::Key(k) = event::read()? {
                    if k.kind == KeyEventKind::Press {
                        self.handle_key(k).await;
                    }
                }
            }
            if self.should_quit {
                break;
            }

            let state = self.dash.snapshot().await;
            let filtered = state.trends.filtered_keys().len();
            self.key_cursor = self.key_cursor.min(filtered.saturating_sub(1));

            terminal.draw(|f| self.draw(f, &state))?;

            tokio::time::sleep(TICK).await;
        }
        self.dash.disconnect().await;
        Ok(())
    }

    async fn handle_key(&mut self, k: KeyEvent) {
        if self.mode != InputMode::Normal {
            self.handle_input_key(k).await;
            return;
        }
        match k.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') => {
                self.dash.connect().await;
            }
            KeyCode::Char('d') => {
                self.dash.disconnect().await;
            }
            KeyCode::Char('p') => {
                let next = self.dash.inspect(|s| s.config.poll_interval.next()).await;
                if let Err(e) = self.dash.set_poll_interval(next).await {
                    debug!(error = %e, "interval change refused");
                }
            }
            KeyCode::Char('H') => self.begin(InputMode::Host).await,
            KeyCode::Char('P') => self.begin(InputMode::Port).await,
            KeyCode::Char('l') => {
                self.dash.toggle_file_logging().await;
            }
            KeyCode::Char('e') => {
                let dash = self.dash.clone();
                tokio::spawn(async move { dash.export_log().await });
            }
            KeyCode::Char('r') => {
                self.dash.cmd_reset();
            }
            KeyCode::Char('f') => {
                self.dash.cmd_clear_faults();
            }
            KeyCode::Char('i') => {
                self.dash.cmd_set_mode_idle();
            }
            KeyCode::Char('u') => {
                self.dash.cmd_set_mode_run();
            }
            KeyCode::Char('/') => self.begin(InputMode::Filter).await,
            KeyCode::Char(':') => self.begin(InputMode::Command).await,
            KeyCode::Char('C') => self.dash.clear_event_log().await,
            KeyCode::Char('j') => self.show_raw = !self.show_raw,
            KeyCode::Char('a') => {
                self.dash.select_filtered_trend_keys().await;
            }
            KeyCode::Char('x') => self.dash.clear_selected_trend_keys().await,
            KeyCode::Up => self.key_cursor = self.key_cursor.saturating_sub(1),
            KeyCode::Down => self.key_cursor += 1,
            KeyCode::Char(' ') => {
                let cursor = self.key_cursor;
                let key = self
                    .dash
                    .inspect(|s| s.trends.filtered_keys().get(cursor).cloned())
                    .await;
                if let Some(key) = key {
                    self.dash.toggle_trend_key(&key).await;
                }
            }
            _ => {}
        }
    }

    /// Enter an editing mode, pre-filled with the current value.
    async fn begin(&mut self, mode: InputMode) {
        self.input = match mode {
            InputMode::Filter => self.dash.inspect(|s| s.trends.filter_text().to_string()).await,
            InputMode::Host => self.dash.inspect(|s| s.config.host.clone()).await,
            InputMode::Port => self.dash.inspect(|s| s.config.port.clone()).await,
            InputMode::Command | InputMode::Normal => String::new(),
        };
        self.mode = mode;
    }

    async fn handle_input_key(&mut self, k: KeyEvent) {
        match k.code {
            KeyCode::Esc => {
                self.mode = InputMode::Normal;
                self.input.clear();
            }
            KeyCode::Enter => {
                self.commit().await;
                self.mode = InputMode::Normal;
                self.input.clear();
            }
            KeyCode::Backspace => {
                self.input.pop();
                if self.mode == InputMode::Filter {
                    self.dash.set_filter_text(&self.input).await;
                }
            }
            KeyCode::Char(ch) => {
                self.input.push(ch);
                if self.mode == InputMode::Filter {
                    // live filtering
                    self.dash.set_filter_text(&self.input).await;
                    self.key_cursor = 0;
                }
            }
            _ => {}
        }
    }

    async fn commit(&mut self) {
        let text = self.input.clone();
        let result = match self.mode {
            InputMode::Normal => Ok(()),
            InputMode::Filter => {
                self.dash.set_filter_text(&text).await;
                Ok(())
            }
            InputMode::Host => self.dash.set_device_host(&text).await,
            InputMode::Port => self.dash.set_device_port(&text).await,
            InputMode::Command => {
                let (name, args) = split_command_line(&text);
                self.dash.set_command_input(name).await;
                self.dash.set_command_args_json(args).await;
                let dash = self.dash.clone();
                tokio::spawn(async move { dash.send_custom_command().await });
                Ok(())
            }
        };
        if let Err(e) = result {
            debug!(error = %e, mode = ?self.mode, "edit rejected");
        }
    }

    fn draw(&self, f: &mut ratatui::Frame<'_>, s: &SessionState) {
        let area = f.area();

        // Root rows: header, main, bottom, footer
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(12),
                Constraint::Length(10),
                Constraint::Length(1),
            ])
            .split(area);

        draw_header(f, rows[0], s);

        let main_lr = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(rows[1]);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(7), Constraint::Min(4)])
            .split(main_lr[0]);
        draw_summary(f, left[0], s);
        if self.show_raw {
            draw_raw_json(f, left[1], s);
        } else {
            draw_telemetry(f, left[1], s);
        }

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(8), Constraint::Min(6)])
            .split(main_lr[1]);
        draw_trend_keys(f, right[0], s, self.key_cursor);
        draw_trends(f, right[1], s);

        let bottom_lr = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[2]);
        draw_events(f, bottom_lr[0], s);
        draw_command(f, bottom_lr[1], s);

        let footer = if self.mode == InputMode::Normal {
            Line::from(Span::styled(HELP, Style::default().fg(Color::DarkGray)))
        } else {
            Line::from(vec![
                Span::styled(self.mode.prompt(), Style::default().fg(Color::Yellow)),
                Span::raw(self.input.as_str()),
                Span::styled("_", Style::default().fg(Color::Yellow)),
            ])
        };
        f.render_widget(Paragraph::new(footer), rows[3]);
    }
}

#[cfg(test)]
mod tests {
    use super::split_command_line;

    #[test]
    fn command_line_split() {
        assert_eq!(split_command_line("reset"), ("reset", ""));
        assert_eq!(
            split_command_line("  set_mode   {\"mode\": \"RUN\"} "),
            ("set_mode", "{\"mode\": \"RUN\"}")
        );
        assert_eq!(split_command_line(""), ("", ""));
    }
}
