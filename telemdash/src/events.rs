//! Operator-facing event log: a capped list of human-readable lines.

use std::collections::VecDeque;

use crate::history::push_capped;

pub const EVENT_LOG_CAPACITY: usize = 200;

#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<String>,
    cap: usize,
    // lifetime count, lets readers spot lines added since they last looked
    total: u64,
}

impl EventLog {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cap: cap.max(1),
            total: 0,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        push_capped(&mut self.entries, line.into(), self.cap);
        self.total += 1;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &String> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    /// Lines pushed after the reader saw `seen_total` lines, limited to what is still retained.
    pub fn since(&self, seen_total: u64) -> impl Iterator<Item = &String> {
        let fresh = self.total.saturating_sub(seen_total) as usize;
        let skip = self.entries.len().saturating_sub(fresh);
        self.entries.iter().skip(skip)
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(EVENT_LOG_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_oldest_past_cap() {
        let mut log = EventLog::default();
        for i in 0..(EVENT_LOG_CAPACITY + 10) {
            log.push(format!("line {i}"));
        }
        assert_eq!(log.len(), EVENT_LOG_CAPACITY);
        assert_eq!(log.iter().next().map(String::as_str), Some("line 10"));
        assert_eq!(log.last(), Some("line 209"));
        assert_eq!(log.total(), 210);
    }

    #[test]
    fn since_returns_only_new_lines() {
        let mut log = EventLog::new(3);
        log.push("a");
        log.push("b");
        let seen = log.total();
        log.push("c");
        log.push("d");
        let fresh: Vec<&String> = log.since(seen).collect();
        assert_eq!(fresh, vec!["c", "d"]);
        assert_eq!(log.since(0).count(), 3);
    }
}
