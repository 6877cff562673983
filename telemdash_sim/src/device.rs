//! Simulated device: a random walk over temperature, supply voltage and
//! current, with latched faults that count down once per sample.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const FAULT_NAMES: [&str; 8] = [
    "TEMP_WARN",
    "TEMP_HIGH",
    "VOLT_LOW",
    "VOLT_HIGH",
    "CURRENT_HIGH",
    "COMM_RETRY",
    "SENSOR_GLITCH",
    "FAN_WARN",
];

pub const SUPPORTED_COMMANDS: [&str; 4] = ["reset", "clear_faults", "set_mode", "inject_fault"];
pub const VALID_MODES: [&str; 3] = ["BOOT", "IDLE", "RUN"];

// boot once, idle once, then mostly running
const MODE_CYCLE: [&str; 6] = ["BOOT", "IDLE", "RUN", "RUN", "RUN", "RUN"];

const NOMINAL_TEMP_C: f64 = 35.0;
const NOMINAL_VIN_MV: i64 = 12_100;
const NOMINAL_CURRENT_A: f64 = 1.5;

/// Body of `GET /status`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusReport {
    pub st: &'static str,
    pub uptime_s: u64,
    pub tmp1: f64,
    pub vin_mv: i64,
    pub current_a: f64,
    pub faults: Vec<&'static str>,
    pub sample_count: u64,
}

/// Body of `POST /command`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

pub struct DeviceModel {
    rng: StdRng,
    started: Instant,
    mode_idx: usize,
    temp_c: f64,
    vin_mv: i64,
    current_a: f64,
    // remaining samples per entry of FAULT_NAMES
    fault_timers: [u32; FAULT_NAMES.len()],
    sample_count: u64,
}

fn round_to(v: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (v * f).round() / f
}

impl DeviceModel {
    /// A fixed `seed` makes the walk reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            started: Instant::now(),
            mode_idx: 0,
            temp_c: NOMINAL_TEMP_C,
            vin_mv: NOMINAL_VIN_MV,
            current_a: NOMINAL_CURRENT_A,
            fault_timers: [0; FAULT_NAMES.len()],
            sample_count: 0,
        }
    }

    pub fn mode(&self) -> &'static str {
        MODE_CYCLE[self.mode_idx]
    }

    pub fn active_faults(&self) -> Vec<&'static str> {
        FAULT_NAMES
            .iter()
            .zip(self.fault_timers)
            .filter(|(_, left)| *left > 0)
            .map(|(name, _)| *name)
            .collect()
    }

    /// Latch `name` for at least `samples` more samples.
    pub fn set_fault(&mut self, name: &str, samples: u32) -> bool {
        match FAULT_NAMES.iter().position(|f| *f == name) {
            Some(i) => {
                self.fault_timers[i] = self.fault_timers[i].max(samples);
                true
            }
            None => false,
        }
    }

    fn clear_faults(&mut self) {
        self.fault_timers = [0; FAULT_NAMES.len()];
    }

    /// Small random response delay so latency trends have something to show.
    pub fn response_delay(&mut self) -> Duration {
        Duration::from_millis(self.rng.gen_range(5..=30))
    }

    /// Advance one step and report it.
    pub fn sample(&mut self) -> StatusReport {
        self.sample_count += 1;
        self.mode_idx = (self.mode_idx + 1) % MODE_CYCLE.len();
        let mode = self.mode();

        self.temp_c += self.rng.gen_range(-0.25..0.35);
        self.vin_mv += self.rng.gen_range(-35..=35);
        self.current_a += match mode {
            "RUN" => self.rng.gen_range(-0.08..0.12),
            "IDLE" => self.rng.gen_range(-0.03..0.03),
            _ => self.rng.gen_range(-0.05..0.07),
        };
        self.temp_c = self.temp_c.clamp(25.0, 95.0);
        self.vin_mv = self.vin_mv.clamp(10_800, 13_250);
        self.current_a = self.current_a.clamp(0.2, 4.5);

        // periodic disturbances so faults show up reliably
        if self.sample_count % 25 == 0 {
            self.temp_c += self.rng.gen_range(4.0..8.0);
        }
        if self.sample_count % 40 == 0 {
            self.vin_mv -= self.rng.gen_range(300..=700);
        }
        if self.sample_count % 55 == 0 {
            self.current_a += self.rng.gen_range(0.8..1.8);
        }
        self.temp_c = self.temp_c.clamp(25.0, 95.0);
        self.vin_mv = self.vin_mv.clamp(9_800, 13_500);
        self.current_a = self.current_a.clamp(0.2, 5.5);

        for t in self.fault_timers.iter_mut() {
            *t = t.saturating_sub(1);
        }

        if self.temp_c >= 70.0 {
            self.set_fault("TEMP_HIGH", 8);
        } else if self.temp_c >= 55.0 {
            self.set_fault("TEMP_WARN", 6);
        }
        if self.vin_mv <= 11_200 {
            self.set_fault("VOLT_LOW", 6);
        } else if self.vin_mv >= 12_800 {
            self.set_fault("VOLT_HIGH", 5);
        }
        if self.current_a >= 3.2 {
            self.set_fault("CURRENT_HIGH", 6);
        }

        if self.rng.gen_bool(0.08) {
            let n = self.rng.gen_range(2..=5);
            self.set_fault("COMM_RETRY", n);
        }
        if self.rng.gen_bool(0.04) {
            let n = self.rng.gen_range(1..=3);
            self.set_fault("SENSOR_GLITCH", n);
        }
        if mode == "RUN" && self.rng.gen_bool(0.03) {
            let n = self.rng.gen_range(3..=7);
            self.set_fault("FAN_WARN", n);
        }

        StatusReport {
            st: mode,
            uptime_s: self.started.elapsed().as_secs(),
            tmp1: round_to(self.temp_c, 2),
            vin_mv: self.vin_mv,
            current_a: round_to(self.current_a, 3),
            faults: self.active_faults(),
            sample_count: self.sample_count,
        }
    }

    /// Execute one command. Unknown or malformed commands answer `ok: false`.
    pub fn apply(&mut self, req: &CommandRequest) -> Value {
        let args = Value::Object(req.args.clone());
        let reply = |ok: bool, message: String| {
            json!({
                "ok": ok,
                "message": message,
                "command": req.command,
                "args": args,
            })
        };

        match req.command.trim().to_ascii_lowercase().as_str() {
            "reset" => {
                self.temp_c = NOMINAL_TEMP_C;
                self.vin_mv = NOMINAL_VIN_MV;
                self.current_a = NOMINAL_CURRENT_A;
                self.clear_faults();
                reply(true, "Device reset simulated".into())
            }
            "clear_faults" => {
                self.clear_faults();
                reply(true, "Faults cleared".into())
            }
            "set_mode" => {
                let mode = req
                    .args
                    .get("mode")
                    .map(text_of)
                    .unwrap_or_default()
                    .to_ascii_uppercase();
                let Some(pos) = MODE_CYCLE.iter().position(|m| *m == mode) else {
                    let mut v = reply(false, "Invalid mode".into());
                    v["valid_modes"] = json!(VALID_MODES);
                    return v;
                };
                // the next sample advances one step, so park just before the chosen mode
                self.mode_idx = (pos + MODE_CYCLE.len() - 1) % MODE_CYCLE.len();
                reply(true, format!("Mode set to {mode}"))
            }
            "inject_fault" => {
                let fault = req
                    .args
                    .get("fault")
                    .map(text_of)
                    .unwrap_or_else(|| "COMM_RETRY".into())
                    .to_ascii_uppercase();
                let duration = req
                    .args
                    .get("duration")
                    .and_then(number_of)
                    .unwrap_or(5);
                if !self.set_fault(&fault, duration.clamp(1, 60) as u32) {
                    let mut v = reply(false, "Unknown fault name".into());
                    v["known_faults"] = json!(FAULT_NAMES);
                    return v;
                }
                reply(true, format!("Injected fault {fault} for {duration} samples"))
            }
            _ => {
                let mut v = reply(false, "Unknown command".into());
                v["supported_commands"] = json!(SUPPORTED_COMMANDS);
                v
            }
        }
    }
}

fn text_of(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn number_of(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(command: &str, args: Value) -> CommandRequest {
        CommandRequest {
            command: command.into(),
            args: args.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn readings_stay_in_range() {
        let mut dev = DeviceModel::new(Some(7));
        for i in 1..=500u64 {
            let r = dev.sample();
            assert_eq!(r.sample_count, i);
            assert!((25.0..=95.0).contains(&r.tmp1));
            assert!((9_800..=13_500).contains(&r.vin_mv));
            assert!((0.2..=5.5).contains(&r.current_a));
            assert!(VALID_MODES.contains(&r.st));
        }
    }

    #[test]
    fn injected_fault_latches_until_cleared() {
        let mut dev = DeviceModel::new(Some(1));
        let v = dev.apply(&cmd("inject_fault", json!({"fault": "fan_warn", "duration": 3})));
        assert_eq!(v["ok"], json!(true));
        assert!(dev.active_faults().contains(&"FAN_WARN"));
        dev.apply(&cmd("clear_faults", json!({})));
        assert!(dev.active_faults().is_empty());
    }

    #[test]
    fn set_mode_shows_on_next_sample() {
        let mut dev = DeviceModel::new(Some(3));
        for mode in ["IDLE", "BOOT", "RUN"] {
            let v = dev.apply(&cmd("set_mode", json!({ "mode": mode.to_lowercase() })));
            assert_eq!(v["ok"], json!(true));
            assert_eq!(dev.sample().st, mode);
        }
        let bad = dev.apply(&cmd("set_mode", json!({"mode": "TURBO"})));
        assert_eq!(bad["ok"], json!(false));
        assert_eq!(bad["valid_modes"], json!(["BOOT", "IDLE", "RUN"]));
    }

    #[test]
    fn reset_restores_nominal_values() {
        let mut dev = DeviceModel::new(Some(9));
        for _ in 0..30 {
            dev.sample();
        }
        dev.set_fault("VOLT_LOW", 10);
        let v = dev.apply(&cmd("RESET", json!({})));
        assert_eq!(v["message"], json!("Device reset simulated"));
        assert!(dev.active_faults().is_empty());
        assert_eq!(dev.vin_mv, NOMINAL_VIN_MV);
    }

    #[test]
    fn unknown_command_lists_supported() {
        let mut dev = DeviceModel::new(Some(0));
        let v = dev.apply(&cmd("selfdestruct", json!({"now": true})));
        assert_eq!(v["ok"], json!(false));
        assert_eq!(v["args"], json!({"now": true}));
        assert_eq!(v["supported_commands"].as_array().map(Vec::len), Some(4));
        let v = dev.apply(&cmd("inject_fault", json!({"fault": "NOPE"})));
        assert_eq!(v["known_faults"].as_array().map(Vec::len), Some(8));
    }
}
