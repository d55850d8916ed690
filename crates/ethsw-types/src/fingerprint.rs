//! Compact MAC address digest used to key the learning table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 32-bit digest of a 6-byte MAC address.
///
/// The first four bytes are read as a little-endian `u32`, then the fifth and
/// sixth bytes are added as unsigned increments (wrapping). Distinct addresses
/// may fold to the same fingerprint; this is not a cryptographic hash.
///
/// # Examples
///
/// ```
/// use ethsw_types::{Fingerprint, MacAddress};
///
/// let mac: MacAddress = "aa:bb:cc:00:00:01".parse().unwrap();
/// assert_eq!(mac.fingerprint(), Fingerprint::new(0x00cc_bbab));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(u32);

impl Fingerprint {
    /// Wraps a raw fingerprint value.
    pub const fn new(value: u32) -> Self {
        Fingerprint(value)
    }

    /// Computes the fingerprint of a raw address.
    pub const fn of(addr: &[u8; 6]) -> Self {
        let head = u32::from_le_bytes([addr[0], addr[1], addr[2], addr[3]]);
        Fingerprint(
            head.wrapping_add(addr[4] as u32)
                .wrapping_add(addr[5] as u32),
        )
    }

    /// Returns the raw value.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl From<Fingerprint> for u32 {
    fn from(fp: Fingerprint) -> u32 {
        fp.0
    }
}
