//! Port registry: the fixed arena of ingress and egress handles.
//!
//! Every port index owns two independent handles:
//!
//! - [`RxPort`] is what initiators call into. It is tagged with its index
//!   and forwards each call to the registered [`IngressHandler`], so the
//!   handler always knows which port a frame arrived on.
//! - [`TxPort`] is what the switch calls out through. It is bound once to
//!   the [`TransportTarget`] sitting on the far side of the link.

use crate::error::{Result, SwitchError};
use crate::frame::{Frame, Phase, ResponseStatus, SyncStatus};
use async_trait::async_trait;
use ethsw_types::PortIndex;
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;
use tracing::warn;

/// Both transport operations of a link endpoint.
///
/// Implemented by whatever sits behind an egress port (virtual nodes, RTL
/// transactors, socket gateways) and by [`RxPort`] itself.
#[async_trait]
pub trait TransportTarget: Send + Sync {
    /// Blocking transport. May advance `delay` and take simulated time.
    async fn b_transport(&self, frame: &mut Frame, delay: &mut Duration);

    /// Non-blocking forward-path transport. Must not suspend.
    fn nb_transport_fw(
        &self,
        frame: &mut Frame,
        phase: &mut Phase,
        delay: &mut Duration,
    ) -> SyncStatus;
}

/// Callback bindings registered on ingress ports.
///
/// Each call carries the index of the port it arrived on.
#[async_trait]
pub trait IngressHandler: Send + Sync {
    async fn on_b_transport(
        &self,
        port: PortIndex,
        frame: &mut Frame,
        delay: &mut Duration,
    ) -> Result<()>;

    fn on_nb_transport_fw(
        &self,
        port: PortIndex,
        frame: &mut Frame,
        phase: &mut Phase,
        delay: &mut Duration,
    ) -> Result<SyncStatus>;
}

/// Ingress handle of one port.
pub struct RxPort {
    index: PortIndex,
    name: String,
    handler: OnceLock<Weak<dyn IngressHandler>>,
}

impl RxPort {
    /// Creates an ingress handle with no handler registered.
    pub fn new(index: PortIndex, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            handler: OnceLock::new(),
        }
    }

    fn with_handler(index: PortIndex, name: String, handler: Weak<dyn IngressHandler>) -> Self {
        Self {
            index,
            name,
            handler: OnceLock::from(handler),
        }
    }

    /// Registers the handler for both transport disciplines.
    pub fn register(&self, handler: Weak<dyn IngressHandler>) -> Result<()> {
        self.handler
            .set(handler)
            .map_err(|_| SwitchError::PortAlreadyBound { port: self.index })
    }

    pub fn index(&self) -> PortIndex {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn handler(&self) -> Option<Arc<dyn IngressHandler>> {
        self.handler.get().and_then(Weak::upgrade)
    }

    /// Blocking transport into this port, with the handler's error surfaced.
    pub async fn call_b_transport(&self, frame: &mut Frame, delay: &mut Duration) -> Result<()> {
        match self.handler() {
            Some(handler) => handler.on_b_transport(self.index, frame, delay).await,
            None => Err(SwitchError::PortUnbound { port: self.index }),
        }
    }

    /// Non-blocking transport into this port, with the handler's error
    /// surfaced.
    pub fn call_nb_transport_fw(
        &self,
        frame: &mut Frame,
        phase: &mut Phase,
        delay: &mut Duration,
    ) -> Result<SyncStatus> {
        match self.handler() {
            Some(handler) => handler.on_nb_transport_fw(self.index, frame, phase, delay),
            None => Err(SwitchError::PortUnbound { port: self.index }),
        }
    }
}

impl std::fmt::Debug for RxPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RxPort")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("registered", &self.handler.get().is_some())
            .finish()
    }
}

/// Adapter for initiators that only speak the plain transport interface.
///
/// Switch errors cannot cross this interface, so they are reported the way
/// a transport target reports failure: as a non-OK response status on the
/// frame. Callers that need the distinct error use
/// [`RxPort::call_b_transport`] and [`RxPort::call_nb_transport_fw`].
#[async_trait]
impl TransportTarget for RxPort {
    async fn b_transport(&self, frame: &mut Frame, delay: &mut Duration) {
        if let Err(err) = self.call_b_transport(frame, delay).await {
            warn!(port = %self.index, name = %self.name, error = %err, "b_transport failed");
            if frame.response_status().is_ok() {
                frame.set_response_status(ResponseStatus::GenericError);
            }
        }
    }

    fn nb_transport_fw(
        &self,
        frame: &mut Frame,
        phase: &mut Phase,
        delay: &mut Duration,
    ) -> SyncStatus {
        match self.call_nb_transport_fw(frame, phase, delay) {
            Ok(status) => status,
            Err(err) => {
                warn!(port = %self.index, name = %self.name, error = %err, "nb_transport_fw failed");
                frame.set_response_status(ResponseStatus::GenericError);
                SyncStatus::Completed
            }
        }
    }
}

/// Egress handle of one port.
pub struct TxPort {
    index: PortIndex,
    name: String,
    target: OnceLock<Arc<dyn TransportTarget>>,
}

impl TxPort {
    pub fn new(index: PortIndex, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            target: OnceLock::new(),
        }
    }

    /// Binds the far-side endpoint. A port can be bound once.
    pub fn bind(&self, target: Arc<dyn TransportTarget>) -> Result<()> {
        self.target
            .set(target)
            .map_err(|_| SwitchError::PortAlreadyBound { port: self.index })
    }

    pub fn is_bound(&self) -> bool {
        self.target.get().is_some()
    }

    pub fn index(&self) -> PortIndex {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn target(&self) -> Result<&Arc<dyn TransportTarget>> {
        self.target
            .get()
            .ok_or(SwitchError::PortUnbound { port: self.index })
    }

    pub async fn b_transport(&self, frame: &mut Frame, delay: &mut Duration) -> Result<()> {
        self.target()?.b_transport(frame, delay).await;
        Ok(())
    }

    pub fn nb_transport_fw(
        &self,
        frame: &mut Frame,
        phase: &mut Phase,
        delay: &mut Duration,
    ) -> Result<SyncStatus> {
        Ok(self.target()?.nb_transport_fw(frame, phase, delay))
    }
}

impl std::fmt::Debug for TxPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxPort")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// Fixed-size collection of port handles, addressed by [`PortIndex`].
#[derive(Debug)]
pub struct PortRegistry {
    rx: Vec<Arc<RxPort>>,
    tx: Vec<TxPort>,
}

impl PortRegistry {
    /// Creates `num_ports` port pairs named `{owner}.rxPort{i}` and
    /// `{owner}.txPort{i}`, registering `handler` on every ingress port.
    pub fn new(owner: &str, num_ports: u32, handler: Weak<dyn IngressHandler>) -> Self {
        let mut rx = Vec::with_capacity(num_ports as usize);
        let mut tx = Vec::with_capacity(num_ports as usize);
        for i in 0..num_ports {
            let index = PortIndex::new(i);
            rx.push(Arc::new(RxPort::with_handler(
                index,
                format!("{owner}.rxPort{i}"),
                handler.clone(),
            )));
            tx.push(TxPort::new(index, format!("{owner}.txPort{i}")));
        }
        Self { rx, tx }
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    pub fn rx(&self, port: PortIndex) -> Result<&Arc<RxPort>> {
        self.rx.get(port.as_usize()).ok_or(SwitchError::PortOutOfRange {
            port,
            num_ports: self.rx.len(),
        })
    }

    pub fn tx(&self, port: PortIndex) -> Result<&TxPort> {
        self.tx.get(port.as_usize()).ok_or(SwitchError::PortOutOfRange {
            port,
            num_ports: self.tx.len(),
        })
    }

    pub fn tx_ports(&self) -> impl Iterator<Item = &TxPort> {
        self.tx.iter()
    }
}
