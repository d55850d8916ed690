//! Switch counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters, updated lock-free from both transport paths.
#[derive(Debug, Default)]
pub struct SwitchStats {
    b_transport_calls: AtomicU64,
    nb_transport_calls: AtomicU64,
    pass_through: AtomicU64,
    unicast: AtomicU64,
    flooded: AtomicU64,
    binding_conflicts: AtomicU64,
    forward_failures: AtomicU64,
    pending: AtomicU64,
}

/// Point-in-time copy of [`SwitchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchStatsSnapshot {
    pub b_transport_calls: u64,
    pub nb_transport_calls: u64,
    /// Non-blocking frames short-circuited by a pass-through marker.
    pub pass_through: u64,
    pub unicast: u64,
    pub flooded: u64,
    pub binding_conflicts: u64,
    /// Blocking forwards that ended with a non-OK response.
    pub forward_failures: u64,
    /// Non-blocking floods stopped by a non-completed egress.
    pub pending: u64,
}

impl SwitchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_b_transport(&self) {
        self.b_transport_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_nb_transport(&self) {
        self.nb_transport_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_pass_through(&self) {
        self.pass_through.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_decision(&self, flood: bool) {
        if flood {
            self.flooded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.unicast.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_binding_conflict(&self) {
        self.binding_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_forward_failure(&self) {
        self.forward_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_pending(&self) {
        self.pending.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SwitchStatsSnapshot {
        SwitchStatsSnapshot {
            b_transport_calls: self.b_transport_calls.load(Ordering::Relaxed),
            nb_transport_calls: self.nb_transport_calls.load(Ordering::Relaxed),
            pass_through: self.pass_through.load(Ordering::Relaxed),
            unicast: self.unicast.load(Ordering::Relaxed),
            flooded: self.flooded.load(Ordering::Relaxed),
            binding_conflicts: self.binding_conflicts.load(Ordering::Relaxed),
            forward_failures: self.forward_failures.load(Ordering::Relaxed),
            pending: self.pending.load(Ordering::Relaxed),
        }
    }
}
