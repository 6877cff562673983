//! Small UI helpers: truncation, value formatting, sparkline scaling.

pub fn truncate_middle(s: &str, max: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max { return s.to_string(); }
    if max <= 3 { return "...".into(); }
    let keep = max - 3;
    let left = keep / 2;
    let right = keep - left;
    let head: String = chars[..left].iter().collect();
    let tail: String = chars[chars.len() - right..].iter().collect();
    format!("{head}...{tail}")
}

pub fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e12 { format!("{v:.0}") } else { format!("{v:.3}") }
}

/// Map a series onto 0..=100 for a Sparkline, keeping the last `max_points`.
/// A flat series sits at mid-height so it stays visible.
pub fn scale_series(values: &[f64], max_points: usize) -> Vec<u64> {
    let start = values.len().saturating_sub(max_points);
    let window = &values[start..];
    let (lo, hi) = window
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let span = hi - lo;
    window
        .iter()
        .map(|v| {
            if span <= f64::EPSILON { 50 } else { (((v - lo) / span) * 99.0).round() as u64 + 1 }
        })
        .collect()
}
