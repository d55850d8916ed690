//! Switch configuration.
//!
//! Loads and validates switch configuration from TOML files. Every field has
//! a default, so a partial file (or no file at all) yields a usable switch.
//!
//! ```toml
//! name = "ethSwitch"
//! num_ports = 4
//! key_mode = "fingerprint"
//!
//! [monitor]
//! enabled = true
//! queue_depth = 1024
//! ```

use crate::error::{Result, SwitchError};
use crate::table::KeyMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Monitoring tap configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Publish transport events from startup
    #[serde(default)]
    pub enabled: bool,

    /// Events buffered for the observer before new ones are dropped
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

/// Complete switch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchConfig {
    /// Instance name, used as the prefix of port names and in banners
    #[serde(default = "default_name")]
    pub name: String,

    /// Number of ports, fixed for the life of the switch
    #[serde(default = "default_num_ports")]
    pub num_ports: usize,

    /// Learning-table key derivation
    #[serde(default)]
    pub key_mode: KeyMode,

    /// Monitoring tap
    #[serde(default)]
    pub monitor: MonitorConfig,
}

fn default_name() -> String {
    "ethSwitch".to_string()
}

fn default_num_ports() -> usize {
    4
}

fn default_queue_depth() -> usize {
    1024
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            queue_depth: default_queue_depth(),
        }
    }
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            num_ports: default_num_ports(),
            key_mode: KeyMode::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

impl SwitchConfig {
    /// Default configuration with the given name and port count.
    pub fn with_ports(name: impl Into<String>, num_ports: usize) -> Self {
        Self {
            name: name.into(),
            num_ports,
            ..Self::default()
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SwitchError::config(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                SwitchError::config(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(SwitchError::Io(e)),
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SwitchError::config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(SwitchError::config("name must not be empty"));
        }

        if self.num_ports == 0 {
            return Err(SwitchError::config("num_ports must be > 0"));
        }

        if u32::try_from(self.num_ports).is_err() {
            return Err(SwitchError::config("num_ports must fit in 32 bits"));
        }

        if self.monitor.queue_depth == 0 {
            return Err(SwitchError::config("monitor.queue_depth must be > 0"));
        }

        Ok(())
    }
}
