//! Address learning table.
//!
//! Maps a key derived from a source MAC address to the ingress port the
//! address was first observed on. The table is append-only: entries are
//! created on first observation and never removed or overwritten.
//!
//! Both transport paths learn into the same table without a shared lock.
//! Each key is updated through the map's entry API, which holds the key's
//! shard lock across the check and the insert, so concurrent learns of one
//! key are linearizable: exactly one binding wins and every other port is
//! rejected with [`SwitchError::InconsistentBinding`].

use crate::error::{Result, SwitchError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ethsw_types::{Fingerprint, MacAddress, PortIndex};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// How MAC addresses are reduced to learning-table keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    /// Key on the 32-bit address fingerprint. Distinct addresses with the
    /// same fingerprint share one binding.
    #[default]
    Fingerprint,
    /// Key on the full 48-bit address.
    FullAddress,
}

impl KeyMode {
    pub fn key_of(&self, mac: &MacAddress) -> LearnKey {
        match self {
            KeyMode::Fingerprint => LearnKey::Fingerprint(mac.fingerprint()),
            KeyMode::FullAddress => LearnKey::Address(*mac),
        }
    }
}

/// Learning-table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LearnKey {
    Fingerprint(Fingerprint),
    Address(MacAddress),
}

impl fmt::Display for LearnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LearnKey::Fingerprint(fp) => write!(f, "fp:{}", fp),
            LearnKey::Address(mac) => write!(f, "mac:{}", mac),
        }
    }
}

/// Outcome of a successful [`LearningTable::learn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Learned {
    /// The key was unseen and is now bound.
    New,
    /// The key was already bound to the same port.
    Existing,
}

/// Concurrent, append-only key-to-port table.
#[derive(Debug, Default)]
pub struct LearningTable {
    entries: DashMap<LearnKey, PortIndex>,
}

impl LearningTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the port `key` is bound to, if any.
    pub fn lookup(&self, key: &LearnKey) -> Option<PortIndex> {
        self.entries.get(key).map(|entry| *entry.value())
    }

    /// Binds `key` to `port` if unbound.
    ///
    /// Re-learning a key on the port it is bound to is a no-op. Learning it
    /// on any other port fails and leaves the existing binding in place.
    pub fn learn(&self, key: LearnKey, port: PortIndex) -> Result<Learned> {
        match self.entries.entry(key) {
            Entry::Occupied(entry) => {
                let bound = *entry.get();
                if bound == port {
                    Ok(Learned::Existing)
                } else {
                    Err(SwitchError::InconsistentBinding {
                        key,
                        bound,
                        observed: port,
                    })
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(port);
                debug!(%key, %port, "learned address binding");
                Ok(Learned::New)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns all bindings sorted by key.
    pub fn snapshot(&self) -> Vec<(LearnKey, PortIndex)> {
        let mut bindings: Vec<_> = self
            .entries
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();
        bindings.sort();
        bindings
    }
}
