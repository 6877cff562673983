//! Normalizes arbitrary device JSON into a stable snapshot for display and trending.
//!
//! Nothing here fails: missing, renamed or oddly typed fields fall back to
//! defaults.

use serde::Serialize;
use serde_json::Value;

use crate::transport::JsonObject;

const FAULT_KEYS: [&str; 3] = ["faults", "active_faults", "alarms"];
const VERSION_KEYS: [&str; 3] = ["version", "fw_version", "sw_version"];
const GIT_HASH_KEYS: [&str; 4] = ["git_hash", "git", "commit", "commit_hash"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TelemetryRow {
    pub key: String,
    pub value: String,
}

/// Well-known device fields, resolved through their alternate names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSummary {
    pub mode: String,
    pub uptime_s: i64,
    pub temp_c: f64,
    pub voltage_v: f64,
    pub current_a: f64,
}

impl Default for DeviceSummary {
    fn default() -> Self {
        Self {
            mode: "UNKNOWN".into(),
            uptime_s: 0,
            temp_c: 0.0,
            voltage_v: 0.0,
            current_a: 0.0,
        }
    }
}

/// Latest normalized reading. Replaced wholesale on every successful poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub raw_fields: JsonObject,
    pub rows: Vec<TelemetryRow>,
    pub numeric_keys: Vec<String>,
    pub faults: Vec<String>,
    pub device_version: String,
    pub device_git_hash: String,
    pub summary: DeviceSummary,
}

impl TelemetrySnapshot {
    pub fn is_empty(&self) -> bool {
        self.raw_fields.is_empty()
    }

    /// Numeric value of `key`, if present and a JSON number.
    pub fn numeric(&self, key: &str) -> Option<f64> {
        self.raw_fields.get(key).and_then(as_number)
    }

    pub fn raw_json(&self) -> String {
        serde_json::to_string_pretty(&self.raw_fields).unwrap_or_else(|_| "{}".into())
    }
}

pub fn normalize(raw: JsonObject) -> TelemetrySnapshot {
    let mut rows: Vec<TelemetryRow> = raw
        .iter()
        .map(|(k, v)| TelemetryRow {
            key: k.clone(),
            value: as_text(v),
        })
        .collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    // Value::Bool never matches here, so booleans stay out of the trend keys.
    let mut numeric_keys: Vec<String> = raw
        .iter()
        .filter(|(_, v)| v.is_number())
        .map(|(k, _)| k.clone())
        .collect();
    numeric_keys.sort();

    let faults = FAULT_KEYS
        .iter()
        .find_map(|k| raw.get(*k).and_then(as_list))
        .map(|items| items.iter().map(as_text).collect())
        .unwrap_or_default();

    let device_version = first_present(&raw, &VERSION_KEYS)
        .map(as_text)
        .unwrap_or_default();
    let device_git_hash = first_present(&raw, &GIT_HASH_KEYS)
        .map(as_text)
        .unwrap_or_default();

    let summary = summarize(&raw);

    TelemetrySnapshot {
        raw_fields: raw,
        rows,
        numeric_keys,
        faults,
        device_version,
        device_git_hash,
        summary,
    }
}

fn summarize(raw: &JsonObject) -> DeviceSummary {
    let mut s = DeviceSummary::default();
    if let Some(v) = first_present(raw, &["mode", "st"]) {
        s.mode = as_text(v);
    }
    if let Some(n) = first_present(raw, &["uptime_s", "uptime"]).and_then(as_lenient_number) {
        s.uptime_s = n as i64;
    }
    if let Some(n) = first_present(raw, &["temp_c", "temperature_c", "tmp1"])
        .and_then(as_lenient_number)
    {
        s.temp_c = n;
    }
    // voltage_v wins, then millivolts, then a bare "voltage"
    s.voltage_v = if let Some(n) = raw.get("voltage_v").and_then(as_lenient_number) {
        n
    } else if let Some(mv) = raw.get("vin_mv").and_then(as_lenient_number) {
        mv / 1000.0
    } else {
        raw.get("voltage").and_then(as_lenient_number).unwrap_or(0.0)
    };
    if let Some(n) = first_present(raw, &["current_a", "current"]).and_then(as_lenient_number) {
        s.current_a = n;
    }
    s
}

fn first_present<'a>(raw: &'a JsonObject, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .find(|v| !v.is_null())
}

/// Strict: JSON numbers only.
pub fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Numbers, or strings that parse as numbers. Booleans are rejected.
pub fn as_lenient_number(v: &Value) -> Option<f64> {
    match v {
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => as_number(v),
    }
}

/// Display form: strings unquoted, everything else as compact JSON.
pub fn as_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn as_list(v: &Value) -> Option<&Vec<Value>> {
    match v {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> JsonObject {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn simulator_payload() {
        let snap = normalize(obj(json!({
            "st": "RUN",
            "tmp1": 41.2,
            "vin_mv": 12000,
            "faults": ["TEMP_WARN"]
        })));
        assert_eq!(snap.numeric_keys, vec!["tmp1", "vin_mv"]);
        assert_eq!(snap.faults, vec!["TEMP_WARN"]);
        let keys: Vec<&str> = snap.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["faults", "st", "tmp1", "vin_mv"]);
        assert_eq!(snap.rows[0].value, r#"["TEMP_WARN"]"#);
        assert_eq!(snap.rows[1].value, "RUN");
        assert_eq!(snap.summary.mode, "RUN");
        assert!((snap.summary.temp_c - 41.2).abs() < 1e-9);
        assert!((snap.summary.voltage_v - 12.0).abs() < 1e-9);
    }

    #[test]
    fn booleans_are_not_numeric() {
        let snap = normalize(obj(json!({"ok": true, "count": 3, "name": "x"})));
        assert_eq!(snap.numeric_keys, vec!["count"]);
        assert_eq!(snap.numeric("ok"), None);
    }

    #[test]
    fn faults_fall_back_through_aliases() {
        let snap = normalize(obj(json!({"alarms": ["A", 7]})));
        assert_eq!(snap.faults, vec!["A", "7"]);

        let snap = normalize(obj(json!({"faults": "OVERHEAT", "active_faults": ["B"]})));
        assert_eq!(snap.faults, vec!["B"]);
    }

    #[test]
    fn scalar_fault_is_dropped() {
        let snap = normalize(obj(json!({"faults": "OVERHEAT"})));
        assert!(snap.faults.is_empty());
    }

    #[test]
    fn identity_fields() {
        let snap = normalize(obj(json!({"fw_version": 3, "commit": "abc123"})));
        assert_eq!(snap.device_version, "3");
        assert_eq!(snap.device_git_hash, "abc123");

        let snap = normalize(obj(json!({})));
        assert_eq!(snap.device_version, "");
        assert_eq!(snap.device_git_hash, "");
        assert_eq!(snap.summary, DeviceSummary::default());
    }

    #[test]
    fn odd_types_degrade_to_defaults() {
        let snap = normalize(obj(json!({
            "mode": null,
            "st": "IDLE",
            "uptime": "17",
            "temp_c": true,
            "voltage": [1, 2],
            "current": "n/a"
        })));
        assert_eq!(snap.summary.mode, "IDLE");
        assert_eq!(snap.summary.uptime_s, 17);
        assert_eq!(snap.summary.temp_c, 0.0);
        assert_eq!(snap.summary.voltage_v, 0.0);
        assert_eq!(snap.summary.current_a, 0.0);
    }
}
