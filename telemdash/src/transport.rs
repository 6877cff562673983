//! Minimal HTTP client helpers for the device's status and command endpoints.
//!
//! Each call is a single request with a hard timeout and yields the decoded JSON
//! object plus the wall-clock latency of the exchange. Retry policy belongs to
//! the poll loop, not here.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::TransportError;

pub const STATUS_ENDPOINT: &str = "/status";
pub const COMMAND_ENDPOINT: &str = "/command";

/// Status polls are expected to answer quickly.
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(1);
/// Commands get extra time for on-device processing.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

pub type JsonObject = serde_json::Map<String, Value>;

/// A decoded device answer and how long the exchange took.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReply {
    pub payload: JsonObject,
    pub latency_ms: f64,
}

/// Request/response seam between the session core and the device.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    async fn fetch_status(
        &self,
        address: &str,
        timeout: Duration,
    ) -> Result<DeviceReply, TransportError>;

    async fn send_command(
        &self,
        address: &str,
        command: &str,
        args: &JsonObject,
        timeout: Duration,
    ) -> Result<DeviceReply, TransportError>;
}

#[derive(Serialize)]
struct CommandBody<'a> {
    command: &'a str,
    args: &'a JsonObject,
}

/// Transport over plain HTTP using a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    status_endpoint: String,
    command_endpoint: String,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Request {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            status_endpoint: STATUS_ENDPOINT.to_string(),
            command_endpoint: COMMAND_ENDPOINT.to_string(),
        })
    }

    pub fn with_endpoints(mut self, status: &str, command: &str) -> Self {
        self.status_endpoint = status.to_string();
        self.command_endpoint = command.to_string();
        self
    }
}

#[async_trait]
impl DeviceTransport for HttpTransport {
    async fn fetch_status(
        &self,
        address: &str,
        timeout: Duration,
    ) -> Result<DeviceReply, TransportError> {
        fetch_status(&self.client, address, timeout, &self.status_endpoint).await
    }

    async fn send_command(
        &self,
        address: &str,
        command: &str,
        args: &JsonObject,
        timeout: Duration,
    ) -> Result<DeviceReply, TransportError> {
        send_command(
            &self.client,
            address,
            command,
            args,
            timeout,
            &self.command_endpoint,
        )
        .await
    }
}

/// Build `http://host:port/endpoint`. An address that already carries a scheme
/// is used as given.
pub fn device_url(address: &str, endpoint: &str) -> Result<Url, TransportError> {
    let address = address.trim();
    // host part: whatever follows the scheme, if any
    let host_part = address.split_once("://").map_or(address, |(_, rest)| rest);
    if host_part.is_empty() || host_part.starts_with([':', '/']) {
        return Err(TransportError::InvalidAddress {
            address: address.to_string(),
            reason: "missing host".into(),
        });
    }
    let address = address.trim_end_matches('/');
    let base = if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{address}")
    };
    let endpoint = if endpoint.starts_with('/') {
        endpoint.to_string()
    } else {
        format!("/{endpoint}")
    };
    let url = Url::parse(&format!("{base}{endpoint}")).map_err(|e| {
        TransportError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        }
    })?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(TransportError::InvalidAddress {
            address: address.to_string(),
            reason: "missing host".into(),
        });
    }
    Ok(url)
}

// GET the status endpoint and return (payload, latency)
pub async fn fetch_status(
    client: &reqwest::Client,
    address: &str,
    timeout: Duration,
    endpoint: &str,
) -> Result<DeviceReply, TransportError> {
    let url = device_url(address, endpoint)?;
    let start = Instant::now();
    let resp = client
        .get(url.clone())
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify(&url, e))?;
    let payload = read_object(&url, resp).await?;
    Ok(DeviceReply {
        payload,
        latency_ms: start.elapsed().as_secs_f64() * 1000.0,
    })
}

// POST {"command": .., "args": {..}} and return (response, latency)
pub async fn send_command(
    client: &reqwest::Client,
    address: &str,
    command: &str,
    args: &JsonObject,
    timeout: Duration,
    endpoint: &str,
) -> Result<DeviceReply, TransportError> {
    let url = device_url(address, endpoint)?;
    let body = CommandBody { command, args };
    let start = Instant::now();
    let resp = client
        .post(url.clone())
        .timeout(timeout)
        .json(&body)
        .send()
        .await
        .map_err(|e| classify(&url, e))?;
    let payload = read_object(&url, resp).await?;
    Ok(DeviceReply {
        payload,
        latency_ms: start.elapsed().as_secs_f64() * 1000.0,
    })
}

async fn read_object(url: &Url, resp: reqwest::Response) -> Result<JsonObject, TransportError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(TransportError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let body = resp.bytes().await.map_err(|e| classify(url, e))?;
    match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(TransportError::NotJsonObject {
            url: url.to_string(),
        }),
        Err(e) => Err(TransportError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn classify(url: &Url, err: reqwest::Error) -> TransportError {
    let url = url.to_string();
    if err.is_timeout() {
        TransportError::Timeout { url }
    } else if err.is_connect() {
        TransportError::Connect {
            url,
            reason: err.to_string(),
        }
    } else {
        TransportError::Request {
            url,
            reason: err.to_string(),
        }
    }
}
