//! Small utilities to manage bounded history buffers for trend charts.

use std::collections::{BTreeMap, VecDeque};

/// ~50 seconds at the default 1 Hz poll rate.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

pub fn push_capped<T>(dq: &mut VecDeque<T>, v: T, cap: usize) {
    while dq.len() >= cap.max(1) {
        dq.pop_front();
    }
    dq.push_back(v);
}

/// One trend row: the selected keys' values at a given poll.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySample {
    pub sequence: u64,
    pub values: BTreeMap<String, f64>,
    pub latency_ms: f64,
}

// Fixed-capacity FIFO of samples, oldest first
#[derive(Debug, Clone)]
pub struct HistoryRing {
    samples: VecDeque<HistorySample>,
    cap: usize,
}

impl HistoryRing {
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            samples: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn push(&mut self, sample: HistorySample) {
        push_capped(&mut self.samples, sample, self.cap);
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistorySample> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&HistorySample> {
        self.samples.back()
    }

    /// Values recorded for `key`, oldest first; samples without it are skipped.
    pub fn series(&self, key: &str) -> Vec<f64> {
        self.samples
            .iter()
            .filter_map(|s| s.values.get(key).copied())
            .collect()
    }

    pub fn latency_series(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.latency_ms).collect()
    }
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
