//! Process-wide atomic counters. Trimmed from the teacher's `ServerMetrics`
//! (connection/room/rate-limit/cross-instance counters for a distributed
//! signaling cluster) down to what this single-process core actually
//! produces: connections, rooms, scheduler activity, broadcasts.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    total_connections: AtomicU64,
    active_connections: AtomicU64,
    disconnections: AtomicU64,
    rooms_created: AtomicU64,
    rooms_closed: AtomicU64,
    rooms_joined: AtomicU64,
    broadcasts_sent: AtomicU64,
    scheduler_ticks: AtomicU64,
    handler_errors: AtomicU64,
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connect(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_disconnect(&self) {
        let _ = self
            .active_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                current.checked_sub(1)
            });
        self.disconnections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_room_created(&self) {
        self.rooms_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_room_closed(&self) {
        self.rooms_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_room_joined(&self) {
        self.rooms_joined.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_broadcast(&self) {
        self.broadcasts_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scheduler_tick(&self) {
        self.scheduler_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_handler_error(&self) {
        self.handler_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            disconnections: self.disconnections.load(Ordering::Relaxed),
            rooms_created: self.rooms_created.load(Ordering::Relaxed),
            rooms_closed: self.rooms_closed.load(Ordering::Relaxed),
            rooms_joined: self.rooms_joined.load(Ordering::Relaxed),
            broadcasts_sent: self.broadcasts_sent.load(Ordering::Relaxed),
            scheduler_ticks: self.scheduler_ticks.load(Ordering::Relaxed),
            handler_errors: self.handler_errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub total_connections: u64,
    pub active_connections: u64,
    pub disconnections: u64,
    pub rooms_created: u64,
    pub rooms_closed: u64,
    pub rooms_joined: u64,
    pub broadcasts_sent: u64,
    pub scheduler_ticks: u64,
    pub handler_errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrement_from_zero_does_not_underflow() {
        let metrics = Metrics::new();
        metrics.record_disconnect();
        metrics.record_disconnect();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.active_connections, 0);
        assert_eq!(snapshot.disconnections, 2);
    }

    #[test]
    fn connect_then_disconnect_balances() {
        let metrics = Metrics::new();
        metrics.record_connect();
        metrics.record_connect();
        metrics.record_disconnect();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_connections, 2);
        assert_eq!(snapshot.active_connections, 1);
    }
}
