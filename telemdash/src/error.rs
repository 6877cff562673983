//! Error taxonomy for the dashboard core.
//!
//! Transport and validation errors are turned into visible state by the poll
//! loop and the command dispatcher; log I/O errors are reported and swallowed.

use std::path::PathBuf;
use thiserror::Error;

/// A failed exchange with the device. Never retried at the transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid device address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("could not connect to {url}: {reason}")]
    Connect { url: String, reason: String },
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("response from {url} is not a JSON object")]
    NotJsonObject { url: String },
    #[error("invalid JSON from {url}: {reason}")]
    Decode { url: String, reason: String },
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },
}

/// Operator input that was refused before anything touched the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Port must be a number between 1 and 65535")]
    PortOutOfRange,
    #[error("Invalid args JSON: {0}")]
    InvalidArgsJson(String),
    #[error("Command args must be a JSON object")]
    ArgsNotObject,
    #[error("Command name is required")]
    EmptyCommandName,
    #[error("device settings are locked while polling is running")]
    SessionRunning,
    #[error("unsupported poll interval '{0}' (choose 0.5, 1.0, 2.0 or 5.0)")]
    UnknownPollInterval(String),
}

#[derive(Debug, Error)]
pub enum LogIoError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not encode record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("no log file path available")]
    NoLogFile,
    #[error("log file not found: {}", .0.display())]
    MissingFile(PathBuf),
}

impl LogIoError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LogIoError::Io {
            path: path.into(),
            source,
        }
    }
}
