//! # ethsw - Virtual learning Ethernet switch
//!
//! This crate implements the forwarding core of a virtual Ethernet switch used
//! in hardware/software co-simulation. Frames arrive on ingress (RX) ports and
//! are forwarded to egress (TX) ports using learning-switch semantics:
//!
//! - The source address of every frame is learned against its ingress port.
//! - Frames whose destination is learned are unicast to that port.
//! - Frames whose destination is unknown are flooded to every other port.
//!
//! ## Transport disciplines
//!
//! Two calling conventions share one forwarding engine:
//!
//! | Entry point | Discipline |
//! |-------------|------------|
//! | [`EthSwitch::b_transport`] | Blocking. Switch-wide FIFO mutual exclusion, may consume simulated time. |
//! | [`EthSwitch::nb_transport_fw`] | Non-blocking. No switch lock, phased [`SyncStatus`] completion. |
//!
//! ## Example
//!
//! ```ignore
//! use ethsw::{EthSwitch, Frame, RecordingEndpoint, SwitchConfig};
//!
//! let switch = EthSwitch::new(SwitchConfig::with_ports("sw0", 3))?;
//! for port in 0..3 {
//!     switch.bind_tx(port.into(), RecordingEndpoint::shared(format!("node{port}")))?;
//! }
//! let mut frame = Frame::ethernet(dst, src, 0x0800, b"payload");
//! let mut delay = Duration::ZERO;
//! switch.b_transport(0.into(), &mut frame, &mut delay).await?;
//! ```

mod blocking;
pub mod clock;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod forward;
pub mod frame;
pub mod monitor;
mod nonblocking;
pub mod port;
pub mod stats;
mod switch;
pub mod table;

pub use clock::{ManualClock, SimClock, WallClock};
pub use config::SwitchConfig;
pub use endpoint::RecordingEndpoint;
pub use error::{Result, SwitchError};
pub use forward::{ForwardingEngine, RoutingDecision};
pub use frame::{Extensions, Frame, PassThroughConfig, Phase, ResponseStatus, SyncStatus};
pub use monitor::{Direction, MonitorEvent, MonitorTap, TransportKind};
pub use port::{IngressHandler, PortRegistry, RxPort, TransportTarget, TxPort};
pub use stats::{SwitchStats, SwitchStatsSnapshot};
pub use switch::EthSwitch;
pub use table::{KeyMode, LearnKey, Learned, LearningTable};

pub use ethsw_types::{Fingerprint, MacAddress, PortIndex};
