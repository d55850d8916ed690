//! Non-blocking transport path.
//!
//! Non-blocking calls take no simulated time inside the switch: every egress
//! either completes in the call or queues the frame and reports a
//! non-completed status. No switch lock is taken. The only shared state this
//! path writes is the learning table, whose per-key learn is atomic.

use std::time::Duration;
use tracing::{debug, instrument, trace};

use crate::error::Result;
use crate::forward::RoutingDecision;
use crate::frame::{Frame, PassThroughConfig, Phase, ResponseStatus, SyncStatus};
use crate::monitor::TransportKind;
use crate::switch::SwitchCore;
use ethsw_types::PortIndex;

impl SwitchCore {
    #[instrument(level = "debug", name = "nb_transport_fw", skip(self, frame, phase, delay), fields(switch = %self.name))]
    pub(crate) fn nb_transport_fw(
        &self,
        ingress: PortIndex,
        frame: &mut Frame,
        phase: &mut Phase,
        delay: &mut Duration,
    ) -> Result<SyncStatus> {
        self.stats.record_nb_transport();
        frame.set_response_status(ResponseStatus::Ok);

        // Configuration traffic for another consumer on the channel.
        if frame.has_extension::<PassThroughConfig>() {
            self.stats.record_pass_through();
            trace!("pass-through configuration frame");
            return Ok(SyncStatus::Completed);
        }

        let rx = self.ports.rx(ingress)?;
        self.publish_rx(rx, TransportKind::NbTransportFw, frame);

        match self.decide(frame, ingress)? {
            RoutingDecision::Unicast(port) => {
                let tx = self.ports.tx(port)?;
                self.publish_tx(tx, TransportKind::NbTransportFw, frame);
                debug!(%port, name = tx.name(), "sending");

                *phase = Phase::BeginReq;
                tx.nb_transport_fw(frame, phase, delay)
            }
            RoutingDecision::Flood(targets) => {
                let mut ret = SyncStatus::Completed;
                for port in targets {
                    let tx = self.ports.tx(port)?;
                    self.publish_tx(tx, TransportKind::NbTransportFw, frame);
                    debug!(%port, name = tx.name(), "flooding");

                    *phase = Phase::BeginReq;
                    let status = tx.nb_transport_fw(frame, phase, delay)?;

                    if !status.is_completed() {
                        self.stats.record_pending();
                        debug!(%port, ?status, "flood stopped by pending egress");
                        ret = status;
                        break;
                    }
                    if !frame.response_status().is_ok() {
                        debug!(%port, status = %frame.response_status(), "flood stopped by error response");
                        break;
                    }
                }
                Ok(ret)
            }
        }
    }
}
