//! Session core: connection lifecycle, the poll loop, and every operator action.
//!
//! All shared state lives in one [`SessionState`] behind a single mutex. The
//! lock is never held across network I/O, file writes or the inter-poll sleep.
//! A poll loop
//! is pinned to the generation that started it and stops touching state the
//! moment that generation is no longer current.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::command::CommandState;
use crate::config::{DeviceConfig, PollInterval};
use crate::error::{TransportError, ValidationError};
use crate::events::EventLog;
use crate::filelog::{self, FileLogger, LogRecord, PendingLine};
use crate::history::{HistoryRing, DEFAULT_HISTORY_CAPACITY};
use crate::telemetry::{normalize, TelemetrySnapshot};
use crate::transport::{DeviceReply, DeviceTransport, COMMAND_TIMEOUT, STATUS_TIMEOUT};
use crate::trends::{build_sample, TrendSelector};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub history_capacity: usize,
    pub logs_dir: PathBuf,
    pub status_timeout: Duration,
    pub command_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            logs_dir: PathBuf::from("logs"),
            status_timeout: STATUS_TIMEOUT,
            command_timeout: COMMAND_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Reconnecting,
}

impl ConnectionState {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connected => "Connected",
            ConnectionState::Reconnecting => "Reconnecting",
        }
    }
}

/// Everything the dashboard shows. Readers get it through [`Dashboard::inspect`]
/// or a cloned [`Dashboard::snapshot`].
#[derive(Debug, Clone)]
pub struct SessionState {
    pub config: DeviceConfig,
    pub running: bool,
    pub connected: bool,
    pub generation: u64,
    pub last_error: String,
    pub last_seen: Option<DateTime<Utc>>,
    pub latency_ms: f64,
    pub consecutive_failures: u32,
    pub telemetry: TelemetrySnapshot,
    pub trends: TrendSelector,
    pub history: HistoryRing,
    pub sample_index: u64,
    pub events: EventLog,
    pub file_log: FileLogger,
    pub command: CommandState,
}

impl SessionState {
    pub fn new(config: DeviceConfig, options: &SessionOptions) -> Self {
        Self {
            config,
            running: false,
            connected: false,
            generation: 0,
            last_error: String::new(),
            last_seen: None,
            latency_ms: 0.0,
            consecutive_failures: 0,
            telemetry: TelemetrySnapshot::default(),
            trends: TrendSelector::default(),
            history: HistoryRing::new(options.history_capacity),
            sample_index: 0,
            events: EventLog::default(),
            file_log: FileLogger::new(options.logs_dir.clone()),
            command: CommandState::default(),
        }
    }

    pub fn device_address(&self) -> String {
        self.config.device_address()
    }

    pub fn connection_state(&self) -> ConnectionState {
        match (self.running, self.connected) {
            (true, true) => ConnectionState::Connected,
            (true, false) => ConnectionState::Reconnecting,
            (false, _) => ConnectionState::Disconnected,
        }
    }

    pub fn connection_label(&self) -> &'static str {
        self.connection_state().label()
    }

    pub fn fault_count(&self) -> usize {
        self.telemetry.faults.len()
    }

    pub fn last_seen_text(&self, now: DateTime<Utc>) -> String {
        match self.last_seen {
            None => "Never".into(),
            Some(ts) => format!("{}s ago", (now - ts).num_seconds().max(0)),
        }
    }

    pub fn history_points(&self) -> usize {
        self.history.len()
    }

    pub fn can_export(&self) -> bool {
        self.file_log.path().is_some()
    }

    pub fn logging_status_label(&self) -> &'static str {
        if self.file_log.is_enabled() {
            "Logging ON"
        } else {
            "Logging OFF"
        }
    }

    /// True while `generation` is the live session.
    pub fn is_current(&self, generation: u64) -> bool {
        self.running && self.generation == generation
    }

    fn clear_live(&mut self) {
        self.telemetry = TelemetrySnapshot::default();
        self.history.clear();
        self.sample_index = 0;
        self.trends.reset_session();
    }

    /// Fold a successful poll into the state. Returns the JSONL line to append
    /// when file logging is on; the caller writes it after releasing the lock.
    fn apply_reply(
        &mut self,
        address: &str,
        reply: DeviceReply,
        now: DateTime<Utc>,
    ) -> Option<PendingLine> {
        self.connected = true;
        self.last_error.clear();
        self.last_seen = Some(now);
        self.latency_ms = reply.latency_ms;
        self.consecutive_failures = 0;

        self.telemetry = normalize(reply.payload);
        self.trends.set_numeric_keys(&self.telemetry.numeric_keys);
        if self.trends.auto_select_once() {
            debug!(keys = ?self.trends.selected(), "auto-selected trend keys");
        }

        self.sample_index += 1;
        if let Some(sample) = build_sample(
            self.sample_index,
            self.trends.selected(),
            &self.telemetry,
            self.latency_ms,
        ) {
            self.history.push(sample);
        }

        if !self.file_log.is_enabled() {
            return None;
        }
        let record = LogRecord {
            ts_utc: filelog::utc_stamp(now),
            device_address: address,
            sample_index: self.sample_index,
            latency_ms: self.latency_ms,
            connected: self.connected,
            faults: &self.telemetry.faults,
            telemetry: &self.telemetry.raw_fields,
        };
        match self.file_log.prepare(&record) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "log record not written");
                self.events.push(format!("Log write error: {e}"));
                None
            }
        }
    }

    fn apply_failure(&mut self, err: &TransportError) {
        self.connected = false;
        self.consecutive_failures += 1;
        self.last_error = err.to_string();
        warn!(failures = self.consecutive_failures, error = %err, "poll failed");
        self.events
            .push(format!("Poll error ({}): {err}", self.consecutive_failures));
    }
}

/// Cheap-to-clone handle to one dashboard session.
#[derive(Clone)]
pub struct Dashboard {
    pub(crate) state: Arc<Mutex<SessionState>>,
    pub(crate) transport: Arc<dyn DeviceTransport>,
    pub(crate) options: Arc<SessionOptions>,
    // wakes a sleeping poll loop so it notices disconnect/reconnect at once
    wake: Arc<Notify>,
}

impl Dashboard {
    pub fn new(
        config: DeviceConfig,
        options: SessionOptions,
        transport: Arc<dyn DeviceTransport>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::new(config, &options))),
            transport,
            options: Arc::new(options),
            wake: Arc::new(Notify::new()),
        }
    }

    /// Run `f` against the live state under the lock.
    pub async fn inspect<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        let s = self.state.lock().await;
        f(&s)
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    /// Start polling. A no-op (returns `None`) while already running.
    pub async fn connect(&self) -> Option<JoinHandle<()>> {
        let mut s = self.state.lock().await;
        if s.running {
            return None;
        }
        s.clear_live();
        s.connected = false;
        s.last_error.clear();
        s.last_seen = None;
        s.latency_ms = 0.0;
        s.consecutive_failures = 0;
        s.running = true;
        s.generation += 1;
        let generation = s.generation;
        let address = s.device_address();
        info!(generation, %address, "starting poll loop");
        s.events.push(format!("Starting poll loop for {address}"));
        drop(s);

        self.wake.notify_waiters();
        Some(tokio::spawn(self.clone().poll_loop(generation)))
    }

    /// Stop polling and drop live data. The loop notices on its next check.
    pub async fn disconnect(&self) -> bool {
        let mut s = self.state.lock().await;
        if !s.running {
            return false;
        }
        s.running = false;
        s.connected = false;
        s.clear_live();
        info!(generation = s.generation, "polling stopped");
        s.events.push("Polling stopped by operator");
        drop(s);

        self.wake.notify_waiters();
        true
    }

    async fn poll_loop(self, generation: u64) {
        loop {
            let (address, interval) = {
                let s = self.state.lock().await;
                if !s.is_current(generation) {
                    break;
                }
                (s.device_address(), s.config.poll_interval.duration())
            };

            let result = self
                .transport
                .fetch_status(&address, self.options.status_timeout)
                .await;

            let (wake, log_line) = {
                let mut s = self.state.lock().await;
                if !s.is_current(generation) {
                    break;
                }
                let log_line = match result {
                    Ok(reply) => s.apply_reply(&address, reply, Utc::now()),
                    Err(err) => {
                        s.apply_failure(&err);
                        None
                    }
                };
                // armed before the lock is released so no wakeup slips past
                (self.wake.notified(), log_line)
            };

            if let Some(line) = log_line {
                self.write_log_line(line).await;
            }

            tokio::select! {
                _ = sleep(interval) => {}
                _ = wake => {}
            }
        }
        debug!(generation, "poll loop exited");
    }

    /// Append one JSONL line on the blocking pool, then record the outcome.
    async fn write_log_line(&self, line: PendingLine) {
        let path = line.path().to_path_buf();
        let result = tokio::task::spawn_blocking(move || line.write()).await;

        let mut s = self.state.lock().await;
        match result {
            Ok(Ok(())) => s.file_log.record_written(&path),
            Ok(Err(e)) => {
                warn!(error = %e, "log write failed");
                s.events.push(format!("Log write error: {e}"));
            }
            Err(e) => {
                warn!(error = %e, "log write task failed");
                s.events.push(format!("Log write error: {e}"));
            }
        }
    }

    pub async fn set_device_host(&self, value: &str) -> Result<(), ValidationError> {
        let mut s = self.state.lock().await;
        if s.running {
            return Err(ValidationError::SessionRunning);
        }
        s.config.set_host(value);
        Ok(())
    }

    pub async fn set_device_port(&self, value: &str) -> Result<(), ValidationError> {
        let mut s = self.state.lock().await;
        if s.running {
            return Err(ValidationError::SessionRunning);
        }
        if let Err(e) = s.config.set_port(value) {
            s.last_error = e.to_string();
            return Err(e);
        }
        Ok(())
    }

    pub async fn set_poll_interval(&self, interval: PollInterval) -> Result<(), ValidationError> {
        let mut s = self.state.lock().await;
        if s.running {
            return Err(ValidationError::SessionRunning);
        }
        s.config.poll_interval = interval;
        Ok(())
    }

    pub async fn toggle_trend_key(&self, key: &str) -> bool {
        self.state.lock().await.trends.toggle_key(key)
    }

    pub async fn select_filtered_trend_keys(&self) -> usize {
        self.state.lock().await.trends.select_filtered()
    }

    /// Empty the selection and the trend rows plotted from it.
    pub async fn clear_selected_trend_keys(&self) {
        let mut s = self.state.lock().await;
        s.trends.clear_selection();
        s.history.clear();
    }

    pub async fn set_filter_text(&self, query: &str) {
        self.state.lock().await.trends.set_filter_text(query);
    }

    pub async fn clear_event_log(&self) {
        self.state.lock().await.events.clear();
    }

    /// Flip file logging; returns whether logging is now on.
    pub async fn toggle_file_logging(&self) -> bool {
        let mut s = self.state.lock().await;
        if s.file_log.is_enabled() {
            s.file_log.disable();
            info!("file logging disabled");
            s.events.push("File logging disabled");
            return false;
        }
        let address = s.device_address();
        match s.file_log.enable(&address, Utc::now()) {
            Ok(path) => {
                let line = format!("File logging enabled: {}", path.display());
                info!(path = %path.display(), "file logging enabled");
                s.events.push(line);
                true
            }
            Err(e) => {
                warn!(error = %e, "could not start file logging");
                s.events.push(format!("Log setup failed: {e}"));
                false
            }
        }
    }

    /// Convert the current JSONL log into a sibling JSON document.
    /// File I/O runs off the lock on the blocking pool.
    pub async fn export_log(&self) -> Option<PathBuf> {
        let (source, address) = {
            let mut s = self.state.lock().await;
            match s.file_log.path() {
                Some(p) => (p.to_path_buf(), s.device_address()),
                None => {
                    s.events.push("Export skipped: no log file path available");
                    return None;
                }
            }
        };

        let result = tokio::task::spawn_blocking(move || {
            filelog::export_json(&source, &address, Utc::now())
        })
        .await;

        let mut s = self.state.lock().await;
        match result {
            Ok(Ok(report)) => {
                for w in &report.warnings {
                    s.events.push(w.clone());
                }
                info!(path = %report.path.display(), samples = report.sample_count, "exported log");
                s.events.push(format!(
                    "Exported JSON: {} ({} samples)",
                    report.path.display(),
                    report.sample_count
                ));
                s.file_log.set_last_export(report.path.clone());
                Some(report.path)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "export failed");
                s.events.push(format!("Export failed: {e}"));
                None
            }
            Err(e) => {
                warn!(error = %e, "export task failed");
                s.events.push(format!("Export failed: {e}"));
                None
            }
        }
    }
}
