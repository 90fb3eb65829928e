// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Network layer
//!
//! Fixed 128-byte envelopes with one-byte node addressing, the join
//! handshake that hands out device addresses, and stop-and-wait
//! retransmission over unreliable links.
//!
//! ## Address space
//!
//! ```text
//! 0x00          unassigned (before join)
//! 0x01 - 0xF0   devices   (240)
//! 0xF1 - 0xFE   gateways  (14)
//! 0xFF          broadcast
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

pub mod framer;
pub mod join;
pub mod message;
pub mod retry;

pub use framer::{NetEvent, NetworkFramer};
pub use join::{AddressPool, JoinKind, JoinRequest, JoinResult, JoinStatus};
pub use message::{NetBody, NetMessage, NetMessageType};
pub use retry::{RetryAction, RetryState};

/// Network protocol major version
pub const KNOT_NET_VERSION_MAJOR: u8 = 1;

/// Network protocol minor version
pub const KNOT_NET_VERSION_MINOR: u8 = 0;

/// Time without acknowledgement before a retransmission (ms)
pub const KNOT_NET_TIMEOUT_MS: u64 = 100;

/// Retransmissions after the first attempt
pub const KNOT_NET_RETRIES: u32 = 5;

/// Wire size of every network message
pub const NET_MESSAGE_SIZE: usize = 128;

/// type + to + from + payload_len
pub const NET_HEADER_SIZE: usize = 4;

/// Largest network payload
pub const NET_PAYLOAD_MAX: usize = NET_MESSAGE_SIZE - NET_HEADER_SIZE;

/// One-byte node address
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeAddress(pub u8);

impl NodeAddress {
    pub const UNASSIGNED: Self = Self(0x00);
    pub const DEVICE_MIN: Self = Self(0x01);
    pub const DEVICE_MAX: Self = Self(0xF0);
    pub const GATEWAY_MIN: Self = Self(0xF1);
    pub const GATEWAY_MAX: Self = Self(0xFE);
    pub const BROADCAST: Self = Self(0xFF);

    /// Number of device addresses
    pub const DEVICE_COUNT: usize = (Self::DEVICE_MAX.0 - Self::DEVICE_MIN.0) as usize + 1;

    /// Number of gateway addresses
    pub const GATEWAY_COUNT: usize = (Self::GATEWAY_MAX.0 - Self::GATEWAY_MIN.0) as usize + 1;

    pub const fn is_unassigned(self) -> bool {
        self.0 == Self::UNASSIGNED.0
    }

    pub const fn is_device(self) -> bool {
        self.0 >= Self::DEVICE_MIN.0 && self.0 <= Self::DEVICE_MAX.0
    }

    pub const fn is_gateway(self) -> bool {
        self.0 >= Self::GATEWAY_MIN.0 && self.0 <= Self::GATEWAY_MAX.0
    }

    pub const fn is_broadcast(self) -> bool {
        self.0 == Self::BROADCAST.0
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

/// Role of a node in the local network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Constrained node; joins a gateway
    Device,
    /// Coordinator; accepts devices and assigns addresses
    Gateway,
}

impl NodeRole {
    pub const fn name(self) -> &'static str {
        match self {
            NodeRole::Device => "device",
            NodeRole::Gateway => "gateway",
        }
    }
}
