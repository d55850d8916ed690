//! Forwarding engine shared by both transport disciplines.

use crate::error::{Result, SwitchError};
use crate::frame::Frame;
use crate::table::{KeyMode, Learned, LearningTable};
use ethsw_types::{MacAddress, PortIndex};
use tracing::trace;

/// Where a frame goes next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    /// The destination is learned; forward to that port only.
    Unicast(PortIndex),
    /// The destination is unknown; forward to these ports, ascending, which
    /// are all ports except the ingress port.
    Flood(Vec<PortIndex>),
}

impl RoutingDecision {
    /// Returns the egress ports in the order they are visited.
    pub fn targets(&self) -> &[PortIndex] {
        match self {
            RoutingDecision::Unicast(port) => std::slice::from_ref(port),
            RoutingDecision::Flood(ports) => ports,
        }
    }

    pub fn is_flood(&self) -> bool {
        matches!(self, RoutingDecision::Flood(_))
    }
}

/// Learn-then-route decision logic over a [`LearningTable`].
#[derive(Debug)]
pub struct ForwardingEngine {
    table: LearningTable,
    key_mode: KeyMode,
    num_ports: u32,
}

impl ForwardingEngine {
    pub fn new(num_ports: u32, key_mode: KeyMode) -> Self {
        Self {
            table: LearningTable::new(),
            key_mode,
            num_ports,
        }
    }

    pub fn table(&self) -> &LearningTable {
        &self.table
    }

    pub fn key_mode(&self) -> KeyMode {
        self.key_mode
    }

    pub fn num_ports(&self) -> usize {
        self.num_ports as usize
    }

    /// Learns the frame's source against `ingress`, then routes on its
    /// destination.
    ///
    /// Learning always happens first, so a frame addressed to its own
    /// sender is already unicast back to the ingress port. If learning
    /// fails the frame is not routed.
    pub fn decide(&self, frame: &Frame, ingress: PortIndex) -> Result<RoutingDecision> {
        self.check_port(ingress)?;
        let (dest, src) = Self::addresses(frame)?;

        let learned = self.table.learn(self.key_mode.key_of(&src), ingress)?;
        if learned == Learned::New {
            trace!(%src, %ingress, "new source address");
        }

        let decision = match self.table.lookup(&self.key_mode.key_of(&dest)) {
            Some(egress) => RoutingDecision::Unicast(egress),
            None => RoutingDecision::Flood(self.flood_targets(ingress)),
        };
        trace!(%dest, ?decision, "routing decision");
        Ok(decision)
    }

    /// All ports except `ingress`, ascending.
    pub fn flood_targets(&self, ingress: PortIndex) -> Vec<PortIndex> {
        (0..self.num_ports)
            .map(PortIndex::new)
            .filter(|port| *port != ingress)
            .collect()
    }

    pub fn check_port(&self, port: PortIndex) -> Result<()> {
        if port.as_u32() < self.num_ports {
            Ok(())
        } else {
            Err(SwitchError::PortOutOfRange {
                port,
                num_ports: self.num_ports(),
            })
        }
    }

    fn addresses(frame: &Frame) -> Result<(MacAddress, MacAddress)> {
        match (frame.dest_addr(), frame.src_addr()) {
            (Some(dest), Some(src)) => Ok((dest, src)),
            _ => Err(SwitchError::TruncatedFrame { len: frame.len() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frame(dest: &str, src: &str) -> Frame {
        Frame::ethernet(dest.parse().unwrap(), src.parse().unwrap(), 0x0800, &[])
    }

    fn ports(ids: &[u32]) -> Vec<PortIndex> {
        ids.iter().copied().map(PortIndex::new).collect()
    }

    #[test]
    fn test_unknown_destination_floods_all_but_ingress() {
        let engine = ForwardingEngine::new(4, KeyMode::Fingerprint);
        let decision = engine
            .decide(&frame("aa:bb:cc:00:00:02", "aa:bb:cc:00:00:01"), PortIndex::new(2))
            .unwrap();
        assert_eq!(decision, RoutingDecision::Flood(ports(&[0, 1, 3])));
        assert!(decision.is_flood());
    }

    #[test]
    fn test_learned_destination_is_unicast() {
        let engine = ForwardingEngine::new(4, KeyMode::Fingerprint);
        engine
            .decide(&frame("aa:bb:cc:00:00:02", "aa:bb:cc:00:00:01"), PortIndex::new(3))
            .unwrap();

        for ingress in [0u32, 1, 2] {
            let decision = engine
                .decide(
                    &frame("aa:bb:cc:00:00:01", &format!("02:00:00:00:00:1{ingress}")),
                    PortIndex::new(ingress),
                )
                .unwrap();
            assert_eq!(decision, RoutingDecision::Unicast(PortIndex::new(3)));
            assert_eq!(decision.targets(), &[PortIndex::new(3)]);
        }
    }

    #[test]
    fn test_learning_precedes_routing() {
        let engine = ForwardingEngine::new(3, KeyMode::Fingerprint);
        let decision = engine
            .decide(&frame("aa:bb:cc:00:00:01", "aa:bb:cc:00:00:01"), PortIndex::new(1))
            .unwrap();
        assert_eq!(decision, RoutingDecision::Unicast(PortIndex::new(1)));
    }

    #[test]
    fn test_inconsistent_source_is_not_routed() {
        let engine = ForwardingEngine::new(3, KeyMode::Fingerprint);
        engine
            .decide(&frame("aa:bb:cc:00:00:02", "aa:bb:cc:00:00:01"), PortIndex::new(0))
            .unwrap();

        let err = engine
            .decide(&frame("aa:bb:cc:00:00:02", "aa:bb:cc:00:00:01"), PortIndex::new(2))
            .unwrap_err();
        assert!(err.is_protocol_violation());
        assert_eq!(engine.table().len(), 1);
    }

    #[test]
    fn test_truncated_frame() {
        let engine = ForwardingEngine::new(3, KeyMode::Fingerprint);
        let err = engine
            .decide(&Frame::new(vec![0u8; 11]), PortIndex::new(0))
            .unwrap_err();
        assert!(matches!(err, SwitchError::TruncatedFrame { len: 11 }));
        assert!(engine.table().is_empty());
    }

    #[test]
    fn test_ingress_out_of_range() {
        let engine = ForwardingEngine::new(3, KeyMode::Fingerprint);
        let err = engine
            .decide(&frame("aa:bb:cc:00:00:02", "aa:bb:cc:00:00:01"), PortIndex::new(3))
            .unwrap_err();
        assert!(matches!(err, SwitchError::PortOutOfRange { num_ports: 3, .. }));
    }

    #[test]
    fn test_widest_port_range() {
        let engine = ForwardingEngine::new(u32::MAX, KeyMode::Fingerprint);
        assert_eq!(engine.num_ports(), u32::MAX as usize);
        assert!(engine.check_port(PortIndex::new(u32::MAX - 1)).is_ok());
        let err = engine.check_port(PortIndex::new(u32::MAX)).unwrap_err();
        assert!(matches!(err, SwitchError::PortOutOfRange { .. }));
    }

    #[test]
    fn test_single_port_flood_is_empty() {
        let engine = ForwardingEngine::new(1, KeyMode::Fingerprint);
        let decision = engine
            .decide(&frame("aa:bb:cc:00:00:02", "aa:bb:cc:00:00:01"), PortIndex::new(0))
            .unwrap();
        assert_eq!(decision, RoutingDecision::Flood(vec![]));
    }
}
