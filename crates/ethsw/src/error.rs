//! Error types for the switch core.
//!
//! Every failure the calling traffic layer can observe is a distinct
//! variant, so a caller can decide whether to retry the frame, abort it, or
//! abort the whole session.

use crate::frame::ResponseStatus;
use crate::table::LearnKey;
use ethsw_types::PortIndex;
use thiserror::Error;

/// Result type alias for switch operations.
pub type Result<T> = std::result::Result<T, SwitchError>;

/// Errors raised by the switch core.
#[derive(Debug, Error)]
pub enum SwitchError {
    /// A source address was observed on a different ingress port than the
    /// one it is already bound to.
    #[error("inconsistent binding for {key}: learned on port {bound}, observed on port {observed}")]
    InconsistentBinding {
        /// The learning-table key of the source address.
        key: LearnKey,
        /// The port the key is bound to.
        bound: PortIndex,
        /// The port the key was just observed on.
        observed: PortIndex,
    },

    /// A blocking flood stopped early because an egress port left a non-OK
    /// response status on the frame.
    #[error("flood stopped at port {port} ({status}) after delivering to {delivered:?}")]
    PartialForwardFailure {
        /// The egress port that reported the failure.
        port: PortIndex,
        /// The response status left on the frame.
        status: ResponseStatus,
        /// Ports that accepted the frame before the failure, in order.
        delivered: Vec<PortIndex>,
    },

    /// A blocking unicast left a non-OK response status on the frame.
    #[error("forward to port {port} failed ({status})")]
    ForwardFailure {
        /// The egress port.
        port: PortIndex,
        /// The response status left on the frame.
        status: ResponseStatus,
    },

    /// A port index outside the switch's port range.
    #[error("port {port} out of range (switch has {num_ports} ports)")]
    PortOutOfRange { port: PortIndex, num_ports: usize },

    /// An egress port has no transport target bound.
    #[error("egress port {port} is not bound")]
    PortUnbound { port: PortIndex },

    /// A port handle was bound twice.
    #[error("port {port} is already bound")]
    PortAlreadyBound { port: PortIndex },

    /// A frame too short to carry destination and source addresses.
    #[error("frame too short for an Ethernet header: {len} bytes")]
    TruncatedFrame { len: usize },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SwitchError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns true if this error is a learning protocol violation.
    ///
    /// The frame was not forwarded and the session state is suspect.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, SwitchError::InconsistentBinding { .. })
    }

    /// Returns true if the frame was handed to at least one egress port
    /// before the failure was detected.
    pub fn is_forward_failure(&self) -> bool {
        matches!(
            self,
            SwitchError::PartialForwardFailure { .. } | SwitchError::ForwardFailure { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethsw_types::Fingerprint;

    #[test]
    fn test_inconsistent_binding_display() {
        let err = SwitchError::InconsistentBinding {
            key: LearnKey::Fingerprint(Fingerprint::new(0xab)),
            bound: PortIndex::new(0),
            observed: PortIndex::new(2),
        };
        assert_eq!(
            err.to_string(),
            "inconsistent binding for fp:0x000000ab: learned on port 0, observed on port 2"
        );
        assert!(err.is_protocol_violation());
        assert!(!err.is_forward_failure());
    }

    #[test]
    fn test_partial_forward_failure_display() {
        let err = SwitchError::PartialForwardFailure {
            port: PortIndex::new(2),
            status: ResponseStatus::GenericError,
            delivered: vec![PortIndex::new(1)],
        };
        assert_eq!(
            err.to_string(),
            "flood stopped at port 2 (GENERIC_ERROR_RESPONSE) after delivering to [PortIndex(1)]"
        );
        assert!(err.is_forward_failure());
    }

    #[test]
    fn test_port_out_of_range_display() {
        let err = SwitchError::PortOutOfRange {
            port: PortIndex::new(5),
            num_ports: 3,
        };
        assert_eq!(err.to_string(), "port 5 out of range (switch has 3 ports)");
    }

    #[test]
    fn test_config_error() {
        let err = SwitchError::config("num_ports must be > 0");
        assert_eq!(err.to_string(), "Configuration error: num_ports must be > 0");
    }
}
