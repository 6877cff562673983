//! Append-only JSONL sample logging and JSON export.
//!
//! One compact JSON object per line while logging is on; export reads that
//! file back and writes a pretty-printed sibling `.json` document without
//! touching the source.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::LogIoError;
use crate::transport::JsonObject;

/// One line of the sample log.
#[derive(Debug, Serialize)]
pub struct LogRecord<'a> {
    pub ts_utc: String,
    pub device_address: &'a str,
    pub sample_index: u64,
    pub latency_ms: f64,
    pub connected: bool,
    pub faults: &'a [String],
    pub telemetry: &'a JsonObject,
}

#[derive(Debug, Serialize)]
struct ExportDocument<'a> {
    exported_at_utc: String,
    source_jsonl: String,
    sample_count: usize,
    device_address: &'a str,
    samples: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub path: PathBuf,
    pub sample_count: usize,
    pub warnings: Vec<String>,
}

pub fn utc_stamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// `tlm_20260223T193012Z_127_0_0_1_8001.jsonl`
pub fn log_file_name(now: DateTime<Utc>, device_address: &str) -> String {
    let safe: String = device_address
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("tlm_{}_{}.jsonl", now.format("%Y%m%dT%H%M%SZ"), safe)
}

pub fn export_path(source: &Path) -> PathBuf {
    source.with_extension("json")
}

/// One encoded JSONL line and the file it belongs to, ready to be written
/// without holding the session lock.
#[derive(Debug, Clone)]
pub struct PendingLine {
    path: PathBuf,
    line: Vec<u8>,
}

impl PendingLine {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self) -> Result<(), LogIoError> {
        append_line(&self.path, &self.line)
    }
}

fn append_line(path: &Path, line: &[u8]) -> Result<(), LogIoError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| LogIoError::io(parent, e))?;
        }
    }
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LogIoError::io(path, e))?;
    f.write_all(line).map_err(|e| LogIoError::io(path, e))
}

/// Parse every line on its own; bad lines become warnings, not failures.
pub fn read_jsonl(path: &Path) -> Result<(Vec<Value>, Vec<String>), LogIoError> {
    if !path.exists() {
        return Err(LogIoError::MissingFile(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|e| LogIoError::io(path, e))?;
    let mut samples = Vec::new();
    let mut warnings = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(v) => samples.push(v),
            Err(e) => warnings.push(format!("Export warning: bad JSONL line {}: {e}", idx + 1)),
        }
    }
    Ok((samples, warnings))
}

pub fn export_json(
    source: &Path,
    device_address: &str,
    now: DateTime<Utc>,
) -> Result<ExportReport, LogIoError> {
    let (samples, warnings) = read_jsonl(source)?;
    let sample_count = samples.len();
    let doc = ExportDocument {
        exported_at_utc: utc_stamp(now),
        source_jsonl: source.display().to_string(),
        sample_count,
        device_address,
        samples,
    };
    let dst = export_path(source);
    let data = serde_json::to_vec_pretty(&doc)?;
    fs::write(&dst, data).map_err(|e| LogIoError::io(&dst, e))?;
    Ok(ExportReport {
        path: dst,
        sample_count,
        warnings,
    })
}

/// Per-session logging switch plus the active file.
#[derive(Debug, Clone)]
pub struct FileLogger {
    dir: PathBuf,
    enabled: bool,
    path: Option<PathBuf>,
    samples_written: u64,
    last_export: Option<PathBuf>,
}

impl FileLogger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            enabled: false,
            path: None,
            samples_written: 0,
            last_export: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Active (or most recent) log file; kept after logging is turned off.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    pub fn last_export(&self) -> Option<&Path> {
        self.last_export.as_deref()
    }

    /// Start a fresh log file named after `now` and the device address.
    pub fn enable(&mut self, device_address: &str, now: DateTime<Utc>) -> Result<&Path, LogIoError> {
        fs::create_dir_all(&self.dir).map_err(|e| LogIoError::io(&self.dir, e))?;
        let path = self.dir.join(log_file_name(now, device_address));
        self.samples_written = 0;
        self.enabled = true;
        Ok(self.path.insert(path).as_path())
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Encode one record for the active file. `None` while disabled.
    pub fn prepare<T: Serialize>(&self, record: &T) -> Result<Option<PendingLine>, LogIoError> {
        if !self.enabled {
            return Ok(None);
        }
        let path = self.path.clone().ok_or(LogIoError::NoLogFile)?;
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        Ok(Some(PendingLine { path, line }))
    }

    /// Count a line written to `path`. Lines landing in an older file after
    /// logging was restarted are not counted.
    pub fn record_written(&mut self, path: &Path) {
        if self.path.as_deref() == Some(path) {
            self.samples_written += 1;
        }
    }

    pub fn set_last_export(&mut self, path: PathBuf) {
        self.last_export = Some(path);
    }
}
