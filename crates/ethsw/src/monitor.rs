//! Monitoring tap for transport diagnostics.
//!
//! When enabled, every frame entering the switch and every copy leaving it is
//! published as a [`MonitorEvent`] to a single external observer. Publishing
//! never blocks the transport path: events go through a bounded channel with
//! `try_send`, and an event that does not fit is dropped and counted.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, trace};

use ethsw_types::PortIndex;

/// Transport discipline an event was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    BTransport,
    NbTransportFw,
}

impl TransportKind {
    /// Tag name as consumed by trace viewers.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransportKind::BTransport => "B_TRANSPORT",
            TransportKind::NbTransportFw => "NB_TRANSPORT_FW",
        }
    }

    /// Name of the entry point, as printed in banners.
    pub const fn method(&self) -> &'static str {
        match self {
            TransportKind::BTransport => "b_transport",
            TransportKind::NbTransportFw => "nb_transport_fw",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the switch an event was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Frame received on an ingress port.
    Rx,
    /// Frame about to be sent on an egress port.
    Tx,
}

/// A copy of one transport event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorEvent {
    pub direction: Direction,
    pub port: PortIndex,
    pub port_name: String,
    pub kind: TransportKind,
    pub time_ns: u64,
    pub banner: String,
    pub data: Vec<u8>,
}

impl MonitorEvent {
    pub fn new(
        switch_name: &str,
        direction: Direction,
        port: PortIndex,
        port_name: &str,
        kind: TransportKind,
        time_ns: u64,
        data: &[u8],
    ) -> Self {
        let banner = match direction {
            Direction::Rx => format!(
                "@{} ns INFO {}::{}() RECEIVED on rxPortId={} name={}",
                time_ns,
                switch_name,
                kind.method(),
                port,
                port_name
            ),
            Direction::Tx => format!(
                "@{} ns INFO {}::{}() SENDING on txPortId={} name={} ...",
                time_ns,
                switch_name,
                kind.method(),
                port,
                port_name
            ),
        };
        Self {
            direction,
            port,
            port_name: port_name.to_string(),
            kind,
            time_ns,
            banner,
            data: data.to_vec(),
        }
    }
}

/// Opt-in, non-blocking publisher of [`MonitorEvent`]s.
#[derive(Debug)]
pub struct MonitorTap {
    enabled: AtomicBool,
    queue_depth: usize,
    sender: Mutex<Option<mpsc::Sender<MonitorEvent>>>,
    published: AtomicU64,
    dropped: AtomicU64,
}

impl MonitorTap {
    pub fn new(enabled: bool, queue_depth: usize) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            queue_depth: queue_depth.max(1),
            sender: Mutex::new(None),
            published: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        debug!(enabled, "monitoring toggled");
    }

    /// Attaches a new observer and returns its receiving end.
    ///
    /// Replaces any previous observer, whose receiver then sees the channel
    /// close once drained.
    pub fn subscribe(&self) -> mpsc::Receiver<MonitorEvent> {
        let (tx, rx) = mpsc::channel(self.queue_depth);
        *self.sender.lock() = Some(tx);
        rx
    }

    /// Detaches the current observer, if any.
    pub fn unsubscribe(&self) {
        self.sender.lock().take();
    }

    /// Publishes the event built by `make` if monitoring is enabled and an
    /// observer is attached.
    ///
    /// `make` is only called when the event will actually be offered to the
    /// observer. Returns true if the event was queued.
    pub fn publish(&self, make: impl FnOnce() -> MonitorEvent) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let guard = self.sender.lock();
        let Some(sender) = guard.as_ref() else {
            trace!("monitoring enabled without an observer");
            return false;
        };
        match sender.try_send(make()) {
            Ok(()) => {
                self.published.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(port = %event.port, kind = %event.kind, "monitor queue full, event dropped");
                false
            }
            Err(TrySendError::Closed(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(port = %event.port, kind = %event.kind, "monitor observer gone, event dropped");
                false
            }
        }
    }

    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rx_event(port: u32) -> MonitorEvent {
        MonitorEvent::new(
            "sw",
            Direction::Rx,
            PortIndex::new(port),
            "sw.rxPort0",
            TransportKind::BTransport,
            42,
            &[1, 2, 3],
        )
    }

    #[test]
    fn test_banner_format() {
        assert_eq!(
            rx_event(0).banner,
            "@42 ns INFO sw::b_transport() RECEIVED on rxPortId=0 name=sw.rxPort0"
        );

        let tx = MonitorEvent::new(
            "sw",
            Direction::Tx,
            PortIndex::new(2),
            "sw.txPort2",
            TransportKind::NbTransportFw,
            7,
            &[],
        );
        assert_eq!(
            tx.banner,
            "@7 ns INFO sw::nb_transport_fw() SENDING on txPortId=2 name=sw.txPort2 ..."
        );
        assert_eq!(tx.kind.to_string(), "NB_TRANSPORT_FW");
    }

    #[test]
    fn test_disabled_tap_does_not_build_events() {
        let tap = MonitorTap::new(false, 4);
        let _rx = tap.subscribe();
        let published = tap.publish(|| panic!("event built while disabled"));
        assert!(!published);
    }

    #[test]
    fn test_publish_and_receive() {
        let tap = MonitorTap::new(true, 4);
        let mut rx = tap.subscribe();

        assert!(tap.publish(|| rx_event(0)));
        assert_eq!(tap.published(), 1);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.data, vec![1, 2, 3]);
        assert_eq!(event.direction, Direction::Rx);
    }

    #[test]
    fn test_full_queue_drops() {
        let tap = MonitorTap::new(true, 1);
        let _rx = tap.subscribe();

        assert!(tap.publish(|| rx_event(0)));
        assert!(!tap.publish(|| rx_event(1)));
        assert_eq!(tap.published(), 1);
        assert_eq!(tap.dropped(), 1);
    }

    #[test]
    fn test_closed_observer_drops() {
        let tap = MonitorTap::new(true, 4);
        drop(tap.subscribe());

        assert!(!tap.publish(|| rx_event(0)));
        assert_eq!(tap.dropped(), 1);
    }

    #[test]
    fn test_unsubscribe_detaches_observer() {
        let tap = MonitorTap::new(true, 4);
        let mut rx = tap.subscribe();
        assert!(tap.publish(|| rx_event(0)));

        tap.unsubscribe();
        assert!(!tap.publish(|| panic!("event built without an observer")));
        assert_eq!(tap.dropped(), 0);

        // Queued events are still delivered, then the channel reports closed.
        assert_eq!(rx.try_recv().unwrap().port, PortIndex::new(0));
        assert_eq!(rx.try_recv().unwrap_err(), mpsc::error::TryRecvError::Disconnected);
    }

    #[test]
    fn test_toggle_at_runtime() {
        let tap = MonitorTap::new(false, 4);
        let mut rx = tap.subscribe();

        assert!(!tap.publish(|| rx_event(0)));
        tap.set_enabled(true);
        assert!(tap.publish(|| rx_event(1)));
        tap.set_enabled(false);
        assert!(!tap.publish(|| rx_event(2)));

        assert_eq!(rx.try_recv().unwrap().port, PortIndex::new(1));
        assert!(rx.try_recv().is_err());
    }
}
