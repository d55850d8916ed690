//! Common types for the virtual Ethernet switch.
//!
//! This crate provides type-safe representations of the primitives shared by
//! the switch core and its collaborators:
//!
//! - [`MacAddress`]: 48-bit Ethernet MAC addresses
//! - [`Fingerprint`]: compact 32-bit digest of a MAC address used as the
//!   learning-table key
//! - [`PortIndex`]: zero-based switch port identifier

mod fingerprint;
mod mac;
mod port;

pub use fingerprint::Fingerprint;
pub use mac::MacAddress;
pub use port::PortIndex;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid port index: {0}")]
    InvalidPortIndex(String),
}
