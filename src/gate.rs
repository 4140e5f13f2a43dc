//! Interval gate: decides at each wake-up whether a new sample is due.

use std::time::Duration;

use chrono::NaiveDateTime;

/// Outcome of one gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// No reading yet, or the last one is at least one interval old.
    CollectNow,
    /// Sleep this long, then check again. Nothing is collected this cycle.
    Wait(Duration),
}

/// Evaluate the gate for the most recent stored reading.
///
/// With `elapsed < interval` the wait is `(interval - elapsed) + margin`.
/// A `last` in the future (clock moved backwards) counts as zero elapsed.
pub fn evaluate(
    last: Option<NaiveDateTime>,
    now: NaiveDateTime,
    interval: Duration,
    margin: Duration,
) -> GateDecision {
    // ---
    let Some(last) = last else {
        return GateDecision::CollectNow;
    };

    let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
    if elapsed >= interval {
        GateDecision::CollectNow
    } else {
        GateDecision::Wait(interval - elapsed + margin)
    }
}

/// `2:24:00` style rendering for log lines.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
