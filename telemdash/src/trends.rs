//! Trend key selection: which numeric telemetry fields get plotted.

use std::collections::BTreeMap;

use crate::history::HistorySample;
use crate::telemetry::TelemetrySnapshot;

/// Hard cap on plotted series.
pub const MAX_TREND_KEYS: usize = 4;
/// How many keys the first sample of a session picks when nothing is selected.
pub const AUTO_SELECT_KEYS: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct TrendSelector {
    selected: Vec<String>,
    filter_text: String,
    numeric_keys: Vec<String>,
    filtered: Vec<String>,
    auto_selected: bool,
}

impl TrendSelector {
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.selected.iter().any(|k| k == key)
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    pub fn numeric_keys(&self) -> &[String] {
        &self.numeric_keys
    }

    /// Numeric keys matching the current filter, in sorted order.
    pub fn filtered_keys(&self) -> &[String] {
        &self.filtered
    }

    /// Remove `key` if selected, otherwise add it while under the cap.
    /// Returns whether the selection changed.
    pub fn toggle_key(&mut self, key: &str) -> bool {
        if let Some(pos) = self.selected.iter().position(|k| k == key) {
            self.selected.remove(pos);
            return true;
        }
        if self.selected.len() >= MAX_TREND_KEYS {
            return false;
        }
        if !self.numeric_keys.iter().any(|k| k == key) {
            return false;
        }
        self.selected.push(key.to_string());
        true
    }

    /// Fill the remaining slots from the filtered list. Returns how many were added.
    pub fn select_filtered(&mut self) -> usize {
        let mut added = 0;
        for key in &self.filtered {
            if self.selected.len() >= MAX_TREND_KEYS {
                break;
            }
            if !self.selected.contains(key) {
                self.selected.push(key.clone());
                added += 1;
            }
        }
        added
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn set_filter_text(&mut self, query: &str) {
        self.filter_text = query.to_string();
        self.refilter();
    }

    /// Adopt the numeric keys of the newest snapshot.
    pub fn set_numeric_keys(&mut self, keys: &[String]) {
        if self.numeric_keys != keys {
            self.numeric_keys = keys.to_vec();
            self.refilter();
        }
    }

    /// Select the first few numeric keys, once per session, if nothing is selected.
    pub fn auto_select_once(&mut self) -> bool {
        if self.auto_selected {
            return false;
        }
        self.auto_selected = true;
        if !self.selected.is_empty() {
            return false;
        }
        self.selected = self
            .numeric_keys
            .iter()
            .take(AUTO_SELECT_KEYS)
            .cloned()
            .collect();
        !self.selected.is_empty()
    }

    /// Forget session-scoped state; the operator's selection and filter survive.
    pub fn reset_session(&mut self) {
        self.auto_selected = false;
        self.numeric_keys.clear();
        self.filtered.clear();
    }

    fn refilter(&mut self) {
        let needle = self.filter_text.trim().to_lowercase();
        self.filtered = self
            .numeric_keys
            .iter()
            .filter(|k| needle.is_empty() || k.to_lowercase().contains(&needle))
            .cloned()
            .collect();
    }
}

/// Build the trend row for the current poll, or `None` when no selected key
/// has a numeric value in this snapshot.
pub fn build_sample(
    sequence: u64,
    selected: &[String],
    snapshot: &TelemetrySnapshot,
    latency_ms: f64,
) -> Option<HistorySample> {
    let values: BTreeMap<String, f64> = selected
        .iter()
        .filter_map(|k| snapshot.numeric(k).map(|v| (k.clone(), v)))
        .collect();
    if values.is_empty() {
        return None;
    }
    Some(HistorySample {
        sequence,
        values,
        latency_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::normalize;
    use serde_json::json;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn selector_with(names: &[&str]) -> TrendSelector {
        let mut t = TrendSelector::default();
        t.set_numeric_keys(&keys(names));
        t
    }

    #[test]
    fn toggle_is_capped_and_idempotent_at_cap() {
        let mut t = selector_with(&["a", "b", "c", "d", "e"]);
        for k in ["a", "b", "c", "d"] {
            assert!(t.toggle_key(k));
        }
        assert!(!t.toggle_key("e"));
        assert!(!t.toggle_key("e"));
        assert_eq!(t.selected(), keys(&["a", "b", "c", "d"]).as_slice());
        // removing still works at the cap
        assert!(t.toggle_key("b"));
        assert_eq!(t.selected(), keys(&["a", "c", "d"]).as_slice());
    }

    #[test]
    fn toggle_ignores_unknown_keys() {
        let mut t = selector_with(&["a"]);
        assert!(!t.toggle_key("zzz"));
        assert!(t.selected().is_empty());
    }

    #[test]
    fn filter_is_case_insensitive_and_idempotent() {
        let mut t = selector_with(&["Temp_C", "current_a", "temp_board", "vin_mv"]);
        t.set_filter_text("TEMP");
        let first = t.filtered_keys().to_vec();
        t.set_filter_text("TEMP");
        t.set_filter_text("TEMP");
        assert_eq!(t.filtered_keys(), first.as_slice());
        assert_eq!(first, keys(&["Temp_C", "temp_board"]));
        t.set_filter_text("");
        assert_eq!(t.filtered_keys().len(), 4);
    }

    #[test]
    fn select_filtered_fills_remaining_slots_in_order() {
        let mut t = selector_with(&["a1", "a2", "a3", "a4", "b1"]);
        t.toggle_key("a2");
        t.toggle_key("b1");
        t.set_filter_text("a");
        assert_eq!(t.select_filtered(), 2);
        assert_eq!(t.selected(), keys(&["a2", "b1", "a1", "a3"]).as_slice());
        assert_eq!(t.select_filtered(), 0);
    }

    #[test]
    fn auto_select_runs_once_per_session() {
        let mut t = selector_with(&["a", "b", "c", "d"]);
        assert!(t.auto_select_once());
        assert_eq!(t.selected(), keys(&["a", "b", "c"]).as_slice());
        t.clear_selection();
        assert!(!t.auto_select_once());
        assert!(t.selected().is_empty());

        t.reset_session();
        t.set_numeric_keys(&keys(&["x", "y"]));
        assert!(t.auto_select_once());
        assert_eq!(t.selected(), keys(&["x", "y"]).as_slice());
    }

    #[test]
    fn auto_select_keeps_existing_choice() {
        let mut t = selector_with(&["a", "b", "c", "d"]);
        t.toggle_key("d");
        assert!(!t.auto_select_once());
        assert_eq!(t.selected(), keys(&["d"]).as_slice());
    }

    #[test]
    fn sample_needs_one_numeric_selected_value() {
        let snap = match json!({"tmp1": 40.5, "ok": true, "st": "RUN"}) {
            serde_json::Value::Object(m) => normalize(m),
            _ => unreachable!(),
        };
        assert!(build_sample(1, &keys(&["ok", "st"]), &snap, 3.0).is_none());

        let s = build_sample(2, &keys(&["ok", "tmp1"]), &snap, 3.0).unwrap();
        assert_eq!(s.sequence, 2);
        assert_eq!(s.values.len(), 1);
        assert_eq!(s.values["tmp1"], 40.5);
        assert_eq!(s.latency_ms, 3.0);
    }
}
