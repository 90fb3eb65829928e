// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # knot-proto - KNoT protocol engine
//!
//! Two-layer wire protocol letting constrained IoT devices join a local
//! network, authenticate, publish typed sensor data and receive commands
//! from a gateway, over interchangeable physical transports.
//!
//! ## Design Constraints
//!
//! - **Fixed-size frames**: every network message is 128 bytes on the wire
//! - **Bounded memory**: socket arena and message bodies have fixed capacity
//! - **Poll-driven**: nothing blocks, time advances through `service(now_ms)`
//! - **Validate first**: untrusted schema/value bytes are checked before use
//!
//! ## Architecture
//!
//! ```text
//! +-----------------------------------------+
//! |  Application (User Code)                |
//! +-----------------------------------------+
//!           v                    ^
//! +-----------------------------------------+
//! |  App codec (data, schema, credentials)  |
//! +-----------------------------------------+
//!           v                    ^
//! +-----------------------------------------+
//! |  Network framer (join, ACK, retries)    |
//! +-----------------------------------------+
//!           v                    ^
//! +-----------------------------------------+
//! |  Socket manager (fixed socket arena)    |
//! +-----------------------------------------+
//!           v                    ^
//! +-----------------------------------------+
//! |  Physical driver (serial / radio / eth) |
//! +-----------------------------------------+
//! ```
//!
//! The validation library ([`validate`], [`types`]) is used by both the
//! framer and the codec.

#![deny(unsafe_code)]

/// Application messages, data points, schema and credentials
pub mod app;

/// Packed little-endian byte writer/reader
pub mod codec;

/// Node configuration (TOML)
pub mod config;

/// Physical driver abstraction plus null and loopback drivers
pub mod driver;

/// Error types
pub mod error;

/// Network envelope, addressing, join and retransmission
pub mod net;

/// Logical socket manager
pub mod socket;

/// Value types, sensor type ids and units
pub mod types;

/// Stateless validation predicates
pub mod validate;

// Re-exports for convenience
pub use crate::app::{AppMessage, AppMessageType, DataPoint, DataValue, ResultCode, SchemaEntry};
pub use crate::config::{ConfigError, NetConfig};
pub use crate::driver::{DriverHandle, PhyKind, PhysicalDriver, SocketRole};
pub use crate::error::{Error, Result, ValidationError};
pub use crate::net::{NetEvent, NetworkFramer, NodeAddress, NodeRole};
pub use crate::socket::{SocketId, SocketManager, SocketState};
pub use crate::types::ValueType;
