//! Simulated time source.
//!
//! The switch never routes on time. It reads the current simulated time only
//! to stamp monitor banners, so the time base stays owned by the simulation
//! kernel and is reached through [`SimClock`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Current simulated time, in nanoseconds.
pub trait SimClock: Send + Sync {
    fn now_ns(&self) -> u64;
}

/// Clock driven explicitly by the caller.
///
/// Useful when an external scheduler owns the time base and pushes it into
/// the switch, and in tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ns: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ns: u64) -> Self {
        Self {
            now_ns: AtomicU64::new(start_ns),
        }
    }

    pub fn set(&self, now_ns: u64) {
        self.now_ns.store(now_ns, Ordering::Release);
    }

    /// Advances the clock and returns the new time.
    pub fn advance(&self, by: Duration) -> u64 {
        let by_ns = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.now_ns.fetch_add(by_ns, Ordering::AcqRel).saturating_add(by_ns)
    }
}

impl SimClock for ManualClock {
    fn now_ns(&self) -> u64 {
        self.now_ns.load(Ordering::Acquire)
    }
}

/// Clock reporting host time elapsed since it was created.
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    origin: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimClock for WallClock {
    fn now_ns(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.now_ns(), 100);
        assert_eq!(clock.advance(Duration::from_nanos(50)), 150);
        clock.set(10);
        assert_eq!(clock.now_ns(), 10);
    }

    #[test]
    fn test_wall_clock_is_monotonic() {
        let clock = WallClock::new();
        let a = clock.now_ns();
        let b = clock.now_ns();
        assert!(b >= a);
    }
}
