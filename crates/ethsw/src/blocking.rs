//! Blocking transport path.
//!
//! `Idle -> Locked -> Forwarding -> Unlocked -> Idle`
//!
//! A blocking call holds the switch-wide lock for the whole forward,
//! including egress calls that advance simulated time. The lock guard is
//! scoped to the forward, so it is released on every exit path. After
//! release the caller yields once: the lock has already been handed to the
//! longest-waiting caller, and yielding lets that caller run before this one
//! can queue again.

use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::{Result, SwitchError};
use crate::forward::RoutingDecision;
use crate::frame::Frame;
use crate::monitor::TransportKind;
use crate::switch::SwitchCore;
use ethsw_types::PortIndex;

impl SwitchCore {
    #[instrument(level = "debug", name = "b_transport", skip(self, frame, delay), fields(switch = %self.name))]
    pub(crate) async fn b_transport(
        &self,
        ingress: PortIndex,
        frame: &mut Frame,
        delay: &mut Duration,
    ) -> Result<()> {
        self.stats.record_b_transport();

        let result = {
            let _guard = self.b_lock.lock().await;
            self.forward_blocking(ingress, frame, delay).await
        };

        tokio::task::yield_now().await;
        result
    }

    async fn forward_blocking(
        &self,
        ingress: PortIndex,
        frame: &mut Frame,
        delay: &mut Duration,
    ) -> Result<()> {
        let rx = self.ports.rx(ingress)?;
        self.publish_rx(rx, TransportKind::BTransport, frame);

        match self.decide(frame, ingress)? {
            RoutingDecision::Unicast(port) => {
                let tx = self.ports.tx(port)?;
                self.publish_tx(tx, TransportKind::BTransport, frame);
                debug!(%port, name = tx.name(), "sending");

                tx.b_transport(frame, delay).await?;

                let status = frame.response_status();
                if !status.is_ok() {
                    self.stats.record_forward_failure();
                    warn!(%port, %status, "unicast egress returned error response");
                    return Err(SwitchError::ForwardFailure { port, status });
                }
                Ok(())
            }
            RoutingDecision::Flood(targets) => {
                let mut delivered = Vec::with_capacity(targets.len());
                for port in targets {
                    let tx = self.ports.tx(port)?;
                    self.publish_tx(tx, TransportKind::BTransport, frame);
                    debug!(%port, name = tx.name(), "flooding");

                    tx.b_transport(frame, delay).await?;

                    let status = frame.response_status();
                    if !status.is_ok() {
                        self.stats.record_forward_failure();
                        warn!(%port, %status, ?delivered, "flood stopped by error response");
                        return Err(SwitchError::PartialForwardFailure {
                            port,
                            status,
                            delivered,
                        });
                    }
                    delivered.push(port);
                }
                Ok(())
            }
        }
    }
}
