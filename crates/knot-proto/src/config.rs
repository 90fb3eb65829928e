// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Node configuration.
//!
//! Supports both programmatic and file-based (TOML) configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::driver::PhyKind;
use crate::net::{NodeAddress, NodeRole};
use crate::socket::{KNOT_SOCKET_FD_MAX_DEVICE, KNOT_SOCKET_FD_MAX_GATEWAY};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        crate::error::Error::Config(e.to_string())
    }
}

/// Network node configuration.
///
/// ```toml
/// phy = "nrf24"
/// role = "gateway"
/// gateway_address = 0xF1
/// max_devices = 32
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetConfig {
    /// Physical layer of the active driver.
    pub phy: PhyKind,

    /// Device or gateway.
    pub role: NodeRole,

    /// Socket slots; defaults to 1 for devices and 255 for gateways.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_capacity: Option<usize>,

    /// Address this gateway listens on.
    #[serde(default = "default_gateway_address")]
    pub gateway_address: NodeAddress,

    /// Simultaneously joined devices (gateway only).
    #[serde(default = "default_max_devices")]
    pub max_devices: usize,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_gateway_address() -> NodeAddress {
    NodeAddress::GATEWAY_MIN
}

fn default_max_devices() -> usize {
    NodeAddress::DEVICE_COUNT
}

fn default_log_level() -> String {
    "info".to_string()
}

impl NetConfig {
    /// Device node on `phy` with defaults.
    pub fn device(phy: PhyKind) -> Self {
        Self {
            phy,
            role: NodeRole::Device,
            socket_capacity: None,
            gateway_address: default_gateway_address(),
            max_devices: default_max_devices(),
            log_level: default_log_level(),
        }
    }

    /// Gateway node on `phy` with defaults.
    pub fn gateway(phy: PhyKind) -> Self {
        Self {
            role: NodeRole::Gateway,
            ..Self::device(phy)
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Effective socket capacity.
    pub fn socket_capacity(&self) -> usize {
        self.socket_capacity.unwrap_or(match self.role {
            NodeRole::Device => KNOT_SOCKET_FD_MAX_DEVICE,
            NodeRole::Gateway => KNOT_SOCKET_FD_MAX_GATEWAY,
        })
    }

    /// `log_level` as a filter; unknown names fall back to `Info`.
    fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }

    /// Cap the `log` facade at `log_level`.
    ///
    /// The installed logger still applies its own filter below this level.
    pub fn apply_log_level(&self) {
        log::set_max_level(self.level_filter());
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let capacity = self.socket_capacity();
        if capacity == 0 {
            return Err(ConfigError::Invalid("socket_capacity must be > 0".into()));
        }
        // Socket ids are one byte
        if capacity > KNOT_SOCKET_FD_MAX_GATEWAY {
            return Err(ConfigError::Invalid(format!(
                "socket_capacity must be <= {KNOT_SOCKET_FD_MAX_GATEWAY}"
            )));
        }
        if self.role == NodeRole::Gateway && capacity < 2 {
            return Err(ConfigError::Invalid(
                "gateway needs a listening socket plus at least one device socket".into(),
            ));
        }
        if !self.gateway_address.is_gateway() {
            return Err(ConfigError::Invalid(format!(
                "gateway_address {} outside {}..={}",
                self.gateway_address,
                NodeAddress::GATEWAY_MIN,
                NodeAddress::GATEWAY_MAX
            )));
        }
        if self.max_devices == 0 || self.max_devices > NodeAddress::DEVICE_COUNT {
            return Err(ConfigError::Invalid(format!(
                "max_devices must be in 1..={}",
                NodeAddress::DEVICE_COUNT
            )));
        }
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "unknown log_level {:?}",
                self.log_level
            )));
        }
        Ok(())
    }
}
