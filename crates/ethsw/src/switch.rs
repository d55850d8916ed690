//! EthSwitch - the virtual learning switch.

use async_trait::async_trait;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::info;

use crate::clock::{SimClock, WallClock};
use crate::config::SwitchConfig;
use crate::error::{Result, SwitchError};
use crate::forward::{ForwardingEngine, RoutingDecision};
use crate::frame::{Frame, Phase, SyncStatus};
use crate::monitor::{Direction, MonitorEvent, MonitorTap, TransportKind};
use crate::port::{IngressHandler, PortRegistry, RxPort, TransportTarget, TxPort};
use crate::stats::{SwitchStats, SwitchStatsSnapshot};
use crate::table::LearningTable;
use ethsw_types::{MacAddress, PortIndex};

/// State shared by every handle to one switch.
pub(crate) struct SwitchCore {
    pub(crate) name: String,
    pub(crate) engine: ForwardingEngine,
    pub(crate) ports: PortRegistry,
    /// Switch-wide arbitration for blocking transport. Waiters are served in
    /// arrival order.
    pub(crate) b_lock: Mutex<()>,
    pub(crate) tap: MonitorTap,
    pub(crate) clock: Arc<dyn SimClock>,
    pub(crate) stats: SwitchStats,
}

impl SwitchCore {
    pub(crate) fn publish_rx(&self, rx: &RxPort, kind: TransportKind, frame: &Frame) {
        self.tap.publish(|| {
            MonitorEvent::new(
                &self.name,
                Direction::Rx,
                rx.index(),
                rx.name(),
                kind,
                self.clock.now_ns(),
                frame.data(),
            )
        });
    }

    pub(crate) fn publish_tx(&self, tx: &TxPort, kind: TransportKind, frame: &Frame) {
        self.tap.publish(|| {
            MonitorEvent::new(
                &self.name,
                Direction::Tx,
                tx.index(),
                tx.name(),
                kind,
                self.clock.now_ns(),
                frame.data(),
            )
        });
    }

    /// Runs the forwarding engine and keeps the decision counters.
    pub(crate) fn decide(&self, frame: &Frame, ingress: PortIndex) -> Result<RoutingDecision> {
        match self.engine.decide(frame, ingress) {
            Ok(decision) => {
                self.stats.record_decision(decision.is_flood());
                Ok(decision)
            }
            Err(err) => {
                if err.is_protocol_violation() {
                    self.stats.record_binding_conflict();
                }
                Err(err)
            }
        }
    }
}

#[async_trait]
impl IngressHandler for SwitchCore {
    async fn on_b_transport(
        &self,
        port: PortIndex,
        frame: &mut Frame,
        delay: &mut Duration,
    ) -> Result<()> {
        self.b_transport(port, frame, delay).await
    }

    fn on_nb_transport_fw(
        &self,
        port: PortIndex,
        frame: &mut Frame,
        phase: &mut Phase,
        delay: &mut Duration,
    ) -> Result<SyncStatus> {
        self.nb_transport_fw(port, frame, phase, delay)
    }
}

/// A virtual learning Ethernet switch with a fixed number of ports.
///
/// Cloning yields another handle to the same switch.
#[derive(Clone)]
pub struct EthSwitch {
    core: Arc<SwitchCore>,
}

impl EthSwitch {
    /// Creates a switch whose monitor banners are stamped with host time.
    pub fn new(config: SwitchConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(WallClock::new()))
    }

    /// Creates a switch reading simulated time from `clock`.
    ///
    /// Every ingress port is registered with the switch's own transport
    /// handlers. Egress ports start unbound; see [`EthSwitch::bind_tx`].
    pub fn with_clock(config: SwitchConfig, clock: Arc<dyn SimClock>) -> Result<Self> {
        config.validate()?;
        let num_ports = u32::try_from(config.num_ports)
            .map_err(|_| SwitchError::config("num_ports must fit in 32 bits"))?;

        let core = Arc::new_cyclic(|weak: &Weak<SwitchCore>| {
            let handler: Weak<dyn IngressHandler> = weak.clone();
            SwitchCore {
                engine: ForwardingEngine::new(num_ports, config.key_mode),
                ports: PortRegistry::new(&config.name, num_ports, handler),
                b_lock: Mutex::new(()),
                tap: MonitorTap::new(config.monitor.enabled, config.monitor.queue_depth),
                clock,
                stats: SwitchStats::new(),
                name: config.name.clone(),
            }
        });

        info!(
            switch = %config.name,
            num_ports = config.num_ports,
            key_mode = ?config.key_mode,
            monitoring = config.monitor.enabled,
            "switch created"
        );

        Ok(Self { core })
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub fn num_ports(&self) -> usize {
        self.core.ports.len()
    }

    /// Ingress handle of `port`, for binding to an initiator.
    pub fn rx_port(&self, port: PortIndex) -> Result<Arc<RxPort>> {
        self.core.ports.rx(port).cloned()
    }

    pub fn tx_port(&self, port: PortIndex) -> Result<&TxPort> {
        self.core.ports.tx(port)
    }

    /// Binds the endpoint behind egress `port`.
    pub fn bind_tx(&self, port: PortIndex, target: Arc<dyn TransportTarget>) -> Result<()> {
        self.core.ports.tx(port)?.bind(target)?;
        info!(switch = %self.core.name, %port, "egress port bound");
        Ok(())
    }

    /// Blocking transport of `frame` arriving on `ingress`.
    ///
    /// Callers are serialized switch-wide and served in arrival order. On
    /// return the frame carries the response status of the last egress port
    /// it reached.
    pub async fn b_transport(
        &self,
        ingress: PortIndex,
        frame: &mut Frame,
        delay: &mut Duration,
    ) -> Result<()> {
        self.core.b_transport(ingress, frame, delay).await
    }

    /// Non-blocking forward-path transport of `frame` arriving on `ingress`.
    pub fn nb_transport_fw(
        &self,
        ingress: PortIndex,
        frame: &mut Frame,
        phase: &mut Phase,
        delay: &mut Duration,
    ) -> Result<SyncStatus> {
        self.core.nb_transport_fw(ingress, frame, phase, delay)
    }

    /// Learns `frame`'s source against `ingress` and returns where it would
    /// be forwarded, without forwarding it.
    pub fn decide(&self, frame: &Frame, ingress: PortIndex) -> Result<RoutingDecision> {
        self.core.decide(frame, ingress)
    }

    /// Port `mac` is learned on, if any.
    pub fn lookup(&self, mac: &MacAddress) -> Option<PortIndex> {
        let engine = &self.core.engine;
        engine.table().lookup(&engine.key_mode().key_of(mac))
    }

    pub fn learning_table(&self) -> &LearningTable {
        self.core.engine.table()
    }

    pub fn monitor(&self) -> &MonitorTap {
        &self.core.tap
    }

    pub fn set_monitoring(&self, enabled: bool) {
        self.core.tap.set_enabled(enabled);
    }

    /// Attaches a monitoring observer.
    pub fn subscribe_monitor(&self) -> mpsc::Receiver<MonitorEvent> {
        self.core.tap.subscribe()
    }

    pub fn stats(&self) -> SwitchStatsSnapshot {
        self.core.stats.snapshot()
    }
}

impl std::fmt::Debug for EthSwitch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthSwitch")
            .field("name", &self.core.name)
            .field("num_ports", &self.core.ports.len())
            .field("learned", &self.core.engine.table().len())
            .field("monitoring", &self.core.tap.is_enabled())
            .finish()
    }
}
