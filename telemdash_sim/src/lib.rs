//! Simulated telemetry device for exercising telemdash without hardware.

pub mod device;
pub mod routes;
pub mod state;

pub use device::{CommandRequest, DeviceModel, StatusReport};
pub use routes::router;
pub use state::AppState;

pub const DEFAULT_PORT: u16 = 8001;

/// `--port N`, `-p N` or `--port=N`; anything unparsable falls back to `default_port`.
pub fn parse_port<I: IntoIterator<Item = String>>(args: I, default_port: u16) -> u16 {
    let mut it = args.into_iter();
    let _ = it.next(); // program name
    let mut long: Option<String> = None;
    let mut short: Option<String> = None;
    while let Some(a) = it.next() {
        match a.as_str() {
            "--port" => long = it.next(),
            "-p" => short = it.next(),
            _ if a.starts_with("--port=") => {
                if let Some((_, v)) = a.split_once('=') {
                    long = Some(v.to_string());
                }
            }
            _ => {}
        }
    }
    long.or(short)
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(default_port)
}

/// `--seed N` for a reproducible walk.
pub fn parse_seed<I: IntoIterator<Item = String>>(args: I) -> Option<u64> {
    let mut it = args.into_iter();
    let mut seed = None;
    while let Some(a) = it.next() {
        if a == "--seed" {
            seed = it.next().and_then(|s| s.parse().ok());
        } else if let Some(v) = a.strip_prefix("--seed=") {
            seed = v.parse().ok();
        }
    }
    seed
}
