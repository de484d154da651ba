//! Maintainer counters.
//!
//! Retry exhaustion never surfaces as an error; `retries_exhausted` is the
//! signal operators watch for persistent relay trouble.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// A monotonically increasing counter. Relaxed ordering: statistics only.
#[derive(Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Counter").field(&self.get()).finish()
    }
}

/// Live counters, shared between the maintainer task and observers.
#[derive(Debug, Default)]
pub struct MaintainerMetrics {
    /// Completed heartbeat cycles.
    pub cycles: Counter,
    pub resolve_failures: Counter,
    /// Cycles that found the relay connection already up.
    pub already_connected: Counter,
    pub dial_attempts: Counter,
    pub dial_failures: Counter,
    /// Successful (re-)connections.
    pub connects: Counter,
    pub publishes: Counter,
    pub publish_failures: Counter,
    /// Cycles that used up the retry budget without success.
    pub retries_exhausted: Counter,
}

/// Point-in-time copy of [`MaintainerMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub cycles: u64,
    pub resolve_failures: u64,
    pub already_connected: u64,
    pub dial_attempts: u64,
    pub dial_failures: u64,
    pub connects: u64,
    pub publishes: u64,
    pub publish_failures: u64,
    pub retries_exhausted: u64,
}

impl MaintainerMetrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles: self.cycles.get(),
            resolve_failures: self.resolve_failures.get(),
            already_connected: self.already_connected.get(),
            dial_attempts: self.dial_attempts.get(),
            dial_failures: self.dial_failures.get(),
            connects: self.connects.get(),
            publishes: self.publishes.get(),
            publish_failures: self.publish_failures.get(),
            retries_exhausted: self.retries_exhausted.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let m = MaintainerMetrics::default();
        m.dial_attempts.inc();
        m.dial_attempts.inc();
        m.retries_exhausted.inc();
        let snap = m.snapshot();
        assert_eq!(snap.dial_attempts, 2);
        assert_eq!(snap.retries_exhausted, 1);
        assert_eq!(snap.connects, 0);
    }

    #[test]
    fn snapshot_serializes_as_flat_json() {
        let m = MaintainerMetrics::default();
        m.cycles.inc();
        let json = serde_json::to_value(m.snapshot()).unwrap();
        assert_eq!(json["cycles"], 1);
        assert_eq!(json["publish_failures"], 0);
    }
}
