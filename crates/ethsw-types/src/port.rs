//! Switch port identifier.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Zero-based index of a switch port.
///
/// Indices are only meaningful relative to a switch: a port index is valid
/// when it is below the switch's port count.
///
/// # Examples
///
/// ```
/// use ethsw_types::PortIndex;
///
/// let port: PortIndex = "2".parse().unwrap();
/// assert_eq!(port.as_usize(), 2);
/// assert!(port.is_within(3));
/// assert!(!port.is_within(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortIndex(u32);

impl PortIndex {
    /// Creates a port index.
    pub const fn new(index: u32) -> Self {
        PortIndex(index)
    }

    /// Returns the index as a `u32`.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Returns the index as a `usize`, for addressing port arenas.
    pub const fn as_usize(&self) -> usize {
        self.0 as usize
    }

    /// Returns true if this index addresses a port of a switch with
    /// `num_ports` ports.
    pub const fn is_within(&self, num_ports: usize) -> bool {
        (self.0 as usize) < num_ports
    }
}

impl fmt::Display for PortIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PortIndex {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(PortIndex)
            .map_err(|_| ParseError::InvalidPortIndex(s.to_string()))
    }
}

impl From<u32> for PortIndex {
    fn from(index: u32) -> Self {
        PortIndex(index)
    }
}

impl From<PortIndex> for u32 {
    fn from(port: PortIndex) -> u32 {
        port.0
    }
}
