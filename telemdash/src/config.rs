//! Device connection settings: host, port and poll interval.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: &str = "8001";

/// The poll cadences the operator can pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PollInterval {
    #[serde(rename = "0.5")]
    HalfSecond,
    #[default]
    #[serde(rename = "1.0")]
    OneSecond,
    #[serde(rename = "2.0")]
    TwoSeconds,
    #[serde(rename = "5.0")]
    FiveSeconds,
}

impl PollInterval {
    pub const ALL: [PollInterval; 4] = [
        PollInterval::HalfSecond,
        PollInterval::OneSecond,
        PollInterval::TwoSeconds,
        PollInterval::FiveSeconds,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PollInterval::HalfSecond => "0.5",
            PollInterval::OneSecond => "1.0",
            PollInterval::TwoSeconds => "2.0",
            PollInterval::FiveSeconds => "5.0",
        }
    }

    pub fn as_secs_f64(self) -> f64 {
        match self {
            PollInterval::HalfSecond => 0.5,
            PollInterval::OneSecond => 1.0,
            PollInterval::TwoSeconds => 2.0,
            PollInterval::FiveSeconds => 5.0,
        }
    }

    /// Sleep between polls, never below 100 ms.
    pub fn duration(self) -> Duration {
        Duration::from_secs_f64(self.as_secs_f64().max(0.1))
    }

    /// Accepts the labels and their numeric spellings ("1", "1.0", "2s").
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let t = s.trim().trim_end_matches('s');
        let secs: f64 = t
            .parse()
            .map_err(|_| ValidationError::UnknownPollInterval(s.to_string()))?;
        Self::ALL
            .into_iter()
            .find(|p| (p.as_secs_f64() - secs).abs() < 1e-9)
            .ok_or_else(|| ValidationError::UnknownPollInterval(s.to_string()))
    }

    /// Cycle to the next choice (wraps around).
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for PollInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub host: String,
    /// Kept as text so it can be blank while being edited.
    pub port: String,
    #[serde(default)]
    pub poll_interval: PollInterval,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT.into(),
            poll_interval: PollInterval::default(),
        }
    }
}

impl DeviceConfig {
    /// `host:port`, or just the host while the port is blank.
    pub fn device_address(&self) -> String {
        let host = self.host.trim();
        let port = self.port.trim();
        if port.is_empty() {
            host.to_string()
        } else {
            format!("{host}:{port}")
        }
    }

    pub fn set_host(&mut self, value: &str) {
        self.host = value.trim().to_string();
    }

    /// Blank is allowed; anything else must be 1..=65535 or the old value stays.
    pub fn set_port(&mut self, value: &str) -> Result<(), ValidationError> {
        let v = value.trim();
        if !v.is_empty() {
            validate_port(v)?;
        }
        self.port = v.to_string();
        Ok(())
    }
}

pub fn validate_port(value: &str) -> Result<u16, ValidationError> {
    let v = value.trim();
    if v.is_empty() || !v.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::PortOutOfRange);
    }
    match v.parse::<u32>() {
        Ok(p) if (1..=65535).contains(&p) => Ok(p as u16),
        _ => Err(ValidationError::PortOutOfRange),
    }
}
