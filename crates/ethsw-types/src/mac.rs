//! Ethernet station addresses as they appear in frame headers.

use crate::{Fingerprint, ParseError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 6-byte Ethernet station address.
///
/// Text form is six colon-separated two-digit hex octets. Either case is
/// accepted on input; output is lowercase.
///
/// ```
/// use ethsw_types::MacAddress;
///
/// let mac: MacAddress = "AA:BB:CC:00:00:01".parse().unwrap();
/// assert_eq!(mac.to_string(), "aa:bb:cc:00:00:01");
/// assert!(!mac.is_group());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Octets on the wire.
    pub const LEN: usize = 6;

    /// All-stations address.
    ///
    /// The switch keys it like any other address: it floods only while its
    /// learning key is unbound, and a frame carrying it as source is learned.
    /// Its fingerprint is `0x1fd`, shared with e.g. `fd:01:00:00:00:00`.
    pub const BROADCAST: MacAddress = MacAddress([0xff; Self::LEN]);

    pub const fn new(octets: [u8; 6]) -> Self {
        MacAddress(octets)
    }

    /// Reads the address at the start of `buf`, or `None` if `buf` is
    /// shorter than [`MacAddress::LEN`].
    pub fn from_slice(buf: &[u8]) -> Option<Self> {
        buf.get(..Self::LEN)
            .and_then(|head| <[u8; 6]>::try_from(head).ok())
            .map(MacAddress)
    }

    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Learning-table fingerprint of this address.
    pub const fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.0)
    }

    /// I/G bit of the first octet: set for multicast and broadcast.
    pub const fn is_group(&self) -> bool {
        self.0[0] & 0x01 == 0x01
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, octet) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}", octet)?;
        }
        Ok(())
    }
}

impl FromStr for MacAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidMacAddress(s.to_string());

        let mut octets = [0u8; 6];
        let mut fields = s.split(':');
        for slot in octets.iter_mut() {
            let field = fields.next().ok_or_else(invalid)?;
            if field.len() != 2 || !field.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            *slot = u8::from_str_radix(field, 16).map_err(|_| invalid())?;
        }
        if fields.next().is_some() {
            return Err(invalid());
        }

        Ok(MacAddress(octets))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> String {
        mac.to_string()
    }
}
