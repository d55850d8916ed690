//! Frames and the transport status types carried alongside them.
//!
//! A [`Frame`] is the generic payload handed through both transport
//! disciplines. Its first twelve bytes are the Ethernet destination and
//! source addresses; everything after that is opaque to the switch.

use ethsw_types::MacAddress;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Response status written into a frame by its final recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResponseStatus {
    #[default]
    Ok,
    Incomplete,
    GenericError,
    AddressError,
    CommandError,
    BurstError,
    ByteEnableError,
}

impl ResponseStatus {
    /// Returns true for [`ResponseStatus::Ok`].
    pub const fn is_ok(&self) -> bool {
        matches!(self, ResponseStatus::Ok)
    }

    /// Returns the status name as printed in transport logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Ok => "OK_RESPONSE",
            ResponseStatus::Incomplete => "INCOMPLETE_RESPONSE",
            ResponseStatus::GenericError => "GENERIC_ERROR_RESPONSE",
            ResponseStatus::AddressError => "ADDRESS_ERROR_RESPONSE",
            ResponseStatus::CommandError => "COMMAND_ERROR_RESPONSE",
            ResponseStatus::BurstError => "BURST_ERROR_RESPONSE",
            ResponseStatus::ByteEnableError => "BYTE_ENABLE_ERROR_RESPONSE",
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase of a non-blocking transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    BeginReq,
    EndReq,
    BeginResp,
    EndResp,
}

/// Completion status returned by a non-blocking transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncStatus {
    /// The callee accepted the transaction; completion happens later.
    Accepted,
    /// The callee updated the phase and expects the caller to act on it.
    UpdateNeeded,
    /// The transaction completed within the call.
    Completed,
}

impl SyncStatus {
    /// Returns true for [`SyncStatus::Completed`].
    pub const fn is_completed(&self) -> bool {
        matches!(self, SyncStatus::Completed)
    }
}

/// Marker extension for configuration traffic addressed to some other
/// consumer on the transport channel.
///
/// The switch only checks for its presence and passes such frames through
/// untouched. The payload is never inspected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassThroughConfig {
    pub payload: Vec<u8>,
}

impl PassThroughConfig {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

/// Typed extension set attached to a frame, at most one value per type.
#[derive(Default)]
pub struct Extensions {
    map: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `value`, returning the previous extension of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) -> Option<T> {
        self.map
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|prev| prev.downcast::<T>().ok())
            .map(|prev| *prev)
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    pub fn remove<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.map
            .remove(&TypeId::of::<T>())
            .and_then(|value| value.downcast::<T>().ok())
            .map(|value| *value)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("len", &self.map.len())
            .finish()
    }
}

/// A simulated Ethernet frame in flight through the switch.
#[derive(Debug, Default)]
pub struct Frame {
    data: Vec<u8>,
    response: ResponseStatus,
    extensions: Extensions,
}

impl Frame {
    /// Bytes taken by the destination and source addresses.
    pub const HEADER_LEN: usize = 2 * MacAddress::LEN;

    /// Wraps raw frame bytes.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            response: ResponseStatus::Ok,
            extensions: Extensions::new(),
        }
    }

    /// Builds an Ethernet II frame: destination, source, ethertype, payload.
    pub fn ethernet(dest: MacAddress, src: MacAddress, ether_type: u16, payload: &[u8]) -> Self {
        let mut data = Vec::with_capacity(Self::HEADER_LEN + 2 + payload.len());
        data.extend_from_slice(dest.as_bytes());
        data.extend_from_slice(src.as_bytes());
        data.extend_from_slice(&ether_type.to_be_bytes());
        data.extend_from_slice(payload);
        Self::new(data)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Vec<u8> {
        &mut self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Destination address, or `None` if the frame is too short.
    pub fn dest_addr(&self) -> Option<MacAddress> {
        MacAddress::from_slice(&self.data)
    }

    /// Source address, or `None` if the frame is too short.
    pub fn src_addr(&self) -> Option<MacAddress> {
        MacAddress::from_slice(self.data.get(MacAddress::LEN..)?)
    }

    pub fn response_status(&self) -> ResponseStatus {
        self.response
    }

    pub fn set_response_status(&mut self, status: ResponseStatus) {
        self.response = status;
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Attaches an extension, replacing any previous one of the same type.
    pub fn set_extension<T: std::any::Any + Send + Sync>(&mut self, value: T) -> Option<T> {
        self.extensions.insert(value)
    }

    pub fn has_extension<T: std::any::Any + Send + Sync>(&self) -> bool {
        self.extensions.contains::<T>()
    }
}
