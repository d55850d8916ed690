//! Recording link endpoint.
//!
//! [`RecordingEndpoint`] is a minimal virtual network node: it keeps a copy
//! of every frame delivered to it and answers with a configurable response.
//! The `ethswd` driver binds one to every egress port, and tests use it to
//! observe forwarding.

use crate::frame::{Frame, Phase, ResponseStatus, SyncStatus};
use crate::monitor::TransportKind;
use crate::port::TransportTarget;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Delivery order shared by several endpoints, as endpoint names.
pub type DeliveryLog = Arc<Mutex<Vec<String>>>;

/// One frame as seen by an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub kind: TransportKind,
    pub data: Vec<u8>,
    pub phase: Option<Phase>,
}

#[derive(Debug)]
pub struct RecordingEndpoint {
    name: String,
    response: Mutex<ResponseStatus>,
    nb_status: Mutex<SyncStatus>,
    latency: Duration,
    deliveries: Mutex<Vec<Delivery>>,
    log: Option<DeliveryLog>,
}

impl RecordingEndpoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            response: Mutex::new(ResponseStatus::Ok),
            nb_status: Mutex::new(SyncStatus::Completed),
            latency: Duration::ZERO,
            deliveries: Mutex::new(Vec::new()),
            log: None,
        }
    }

    pub fn shared(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::new(name))
    }

    /// Appends this endpoint's name to `log` on every delivery.
    pub fn with_log(mut self, log: DeliveryLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Adds `latency` to the caller's delay on every blocking delivery.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_response(self, status: ResponseStatus) -> Self {
        *self.response.lock() = status;
        self
    }

    pub fn with_nb_status(self, status: SyncStatus) -> Self {
        *self.nb_status.lock() = status;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_response(&self, status: ResponseStatus) {
        *self.response.lock() = status;
    }

    pub fn set_nb_status(&self, status: SyncStatus) {
        *self.nb_status.lock() = status;
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }

    pub fn delivery_count(&self) -> usize {
        self.deliveries.lock().len()
    }

    fn record(&self, kind: TransportKind, frame: &Frame, phase: Option<Phase>) {
        self.deliveries.lock().push(Delivery {
            kind,
            data: frame.data().to_vec(),
            phase,
        });
        if let Some(log) = &self.log {
            log.lock().push(self.name.clone());
        }
    }
}

#[async_trait]
impl TransportTarget for RecordingEndpoint {
    async fn b_transport(&self, frame: &mut Frame, delay: &mut Duration) {
        self.record(TransportKind::BTransport, frame, None);
        *delay += self.latency;
        frame.set_response_status(*self.response.lock());
    }

    fn nb_transport_fw(
        &self,
        frame: &mut Frame,
        phase: &mut Phase,
        _delay: &mut Duration,
    ) -> SyncStatus {
        self.record(TransportKind::NbTransportFw, frame, Some(*phase));
        frame.set_response_status(*self.response.lock());
        let status = *self.nb_status.lock();
        if status == SyncStatus::UpdateNeeded {
            *phase = Phase::EndReq;
        }
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_records_blocking_delivery() {
        let ep = RecordingEndpoint::new("node").with_latency(Duration::from_nanos(10));
        let mut frame = Frame::new(vec![7u8; 14]);
        let mut delay = Duration::from_nanos(5);

        ep.b_transport(&mut frame, &mut delay).await;

        assert_eq!(delay, Duration::from_nanos(15));
        assert_eq!(ep.delivery_count(), 1);
        assert_eq!(ep.deliveries()[0].kind, TransportKind::BTransport);
        assert!(frame.response_status().is_ok());
    }

    #[test]
    fn test_nb_status_and_response() {
        let ep = RecordingEndpoint::new("node")
            .with_response(ResponseStatus::AddressError)
            .with_nb_status(SyncStatus::UpdateNeeded);
        let mut frame = Frame::new(vec![0u8; 14]);
        let mut phase = Phase::BeginReq;
        let mut delay = Duration::ZERO;

        let status = ep.nb_transport_fw(&mut frame, &mut phase, &mut delay);

        assert_eq!(status, SyncStatus::UpdateNeeded);
        assert_eq!(phase, Phase::EndReq);
        assert_eq!(frame.response_status(), ResponseStatus::AddressError);
        assert_eq!(ep.deliveries()[0].phase, Some(Phase::BeginReq));
    }

    #[test]
    fn test_shared_log() {
        let log = DeliveryLog::default();
        let a = RecordingEndpoint::new("a").with_log(log.clone());
        let b = RecordingEndpoint::new("b").with_log(log.clone());
        let mut frame = Frame::new(vec![0u8; 14]);
        let mut delay = Duration::ZERO;

        b.nb_transport_fw(&mut frame, &mut Phase::BeginReq, &mut delay);
        a.nb_transport_fw(&mut frame, &mut Phase::BeginReq, &mut delay);

        assert_eq!(*log.lock(), vec!["b".to_string(), "a".to_string()]);
    }
}
