//! Configuration handling for the framer binary.
//!
//! Defaults are overridden first by an optional YAML file, then by
//! environment variables, then by command-line flags in `main`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Framer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FramerConfig {
    /// Default destination hardware address
    pub dest: String,
    /// Default source hardware address
    pub src: String,
    /// Default type/length field
    pub ether_type: u16,
    /// Default declared payload length
    pub payload_len: u16,
    /// Payload buffer capacity in bytes
    pub buffer_capacity: usize,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            dest: "ff:ff:ff:ff:ff:ff".to_string(),
            src: "02:00:00:00:00:01".to_string(),
            ether_type: 0x0800,
            payload_len: 46,
            buffer_capacity: framer_buffer::DEFAULT_CAPACITY,
        }
    }
}

impl FramerConfig {
    /// Load configuration from file and environment variables
    pub fn load_from_file<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let mut config = Self::default();

        if let Ok(content) = std::fs::read_to_string(&config_path) {
            match serde_yaml::from_str::<FramerConfig>(&content) {
                Ok(parsed) => {
                    config = parsed;
                    info!("Loaded configuration from {:?}", config_path.as_ref());
                }
                Err(e) => {
                    warn!(
                        "Failed to parse config file {:?} ({}), using defaults",
                        config_path.as_ref(),
                        e
                    );
                }
            }
        } else {
            warn!(
                "Config file {:?} not found, using defaults",
                config_path.as_ref()
            );
        }

        config.apply_environment_overrides();

        info!(
            "Final framer configuration: dest={}, src={}, type={:#06x}, len={}, capacity={}",
            config.dest, config.src, config.ether_type, config.payload_len, config.buffer_capacity
        );

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn load_from_env() -> Self {
        let mut config = Self::default();
        config.apply_environment_overrides();
        config
    }

    fn apply_environment_overrides(&mut self) {
        if let Ok(dest) = std::env::var("FRAMER_DEST") {
            self.dest = dest;
        }
        if let Ok(src) = std::env::var("FRAMER_SRC") {
            self.src = src;
        }
        if let Ok(ether_type) = std::env::var("FRAMER_TYPE") {
            match parse_u16(&ether_type) {
                Some(value) => self.ether_type = value,
                None => warn!("Ignoring malformed FRAMER_TYPE={:?}", ether_type),
            }
        }
        if let Ok(len) = std::env::var("FRAMER_LEN") {
            match parse_u16(&len) {
                Some(value) => self.payload_len = value,
                None => warn!("Ignoring malformed FRAMER_LEN={:?}", len),
            }
        }
        if let Ok(capacity) = std::env::var("FRAMER_CAPACITY") {
            match capacity.parse::<usize>() {
                Ok(value) => self.buffer_capacity = value,
                Err(_) => warn!("Ignoring malformed FRAMER_CAPACITY={:?}", capacity),
            }
        }
    }
}

/// Parse a decimal or `0x`-prefixed hex integer.
pub fn parse_u16(text: &str) -> Option<u16> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}
