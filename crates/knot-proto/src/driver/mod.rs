// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Physical driver abstraction
//!
//! Every physical transport (serial line, sub-GHz radio, BLE, Wi-Fi,
//! Ethernet) implements [`PhysicalDriver`]. The socket manager owns exactly
//! one driver and never touches hardware directly.
//!
//! ## Design Principles
//!
//! - **Non-blocking** - `poll`/`recv` return immediately
//! - **Opaque handles** - a [`DriverHandle`] means nothing outside its driver
//! - **Exclusive ownership** - a handle belongs to one logical socket until closed

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::net::NodeAddress;

pub mod loopback;

pub use loopback::{LoopbackDriver, LoopbackMedium};

/// Physical layer kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PhyKind {
    /// UART / USB CDC
    Serial = 0,
    /// nRF24L01+ 2.4 GHz radio
    Nrf24 = 1,
    /// nRF51 (BLE)
    Nrf51 = 2,
    /// nRF905 sub-GHz radio
    Nrf905 = 3,
    /// RFM69 sub-GHz radio
    Rfm69 = 4,
    /// Wired Ethernet
    Eth = 5,
    /// ESP8266 Wi-Fi
    Esp8266 = 6,
    /// Amplitude shift keying (433 MHz on-off keying)
    Ask = 7,
}

impl PhyKind {
    /// Every supported kind, in wire order
    pub const ALL: [PhyKind; 8] = [
        PhyKind::Serial,
        PhyKind::Nrf24,
        PhyKind::Nrf51,
        PhyKind::Nrf905,
        PhyKind::Rfm69,
        PhyKind::Eth,
        PhyKind::Esp8266,
        PhyKind::Ask,
    ];

    pub fn from_u8(v: u8) -> Option<Self> {
        Self::ALL.get(usize::from(v)).copied()
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Short lowercase name, identical to the config spelling
    pub const fn name(self) -> &'static str {
        match self {
            PhyKind::Serial => "serial",
            PhyKind::Nrf24 => "nrf24",
            PhyKind::Nrf51 => "nrf51",
            PhyKind::Nrf905 => "nrf905",
            PhyKind::Rfm69 => "rfm69",
            PhyKind::Eth => "eth",
            PhyKind::Esp8266 => "esp8266",
            PhyKind::Ask => "ask",
        }
    }
}

impl fmt::Display for PhyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Role of a logical socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SocketRole {
    /// Initiates connections (devices)
    Client = 0,
    /// Accepts connections (gateways)
    Server = 1,
}

impl TryFrom<u8> for SocketRole {
    type Error = Error;

    fn try_from(v: u8) -> Result<Self> {
        match v {
            0 => Ok(SocketRole::Client),
            1 => Ok(SocketRole::Server),
            other => Err(Error::UnsupportedRole(other)),
        }
    }
}

/// Opaque transport handle issued by a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DriverHandle(pub u32);

/// Capability set of a physical transport
///
/// Implementors must handle:
/// - Radio / line bring-up (`probe`)
/// - Link establishment (`open`, `accept`, `connect`)
/// - Frame movement (`send`, `recv`)
pub trait PhysicalDriver {
    /// Physical layer this driver speaks
    fn kind(&self) -> PhyKind;

    /// Check that the hardware is present and usable
    ///
    /// Called exactly once, when the socket manager is built.
    fn probe(&mut self) -> Result<()>;

    /// Whether sockets of `role` can be opened on this driver
    fn supports_role(&self, _role: SocketRole) -> bool {
        true
    }

    /// Open a transport endpoint bound to `local`
    fn open(&mut self, role: SocketRole, local: NodeAddress) -> Result<DriverHandle>;

    /// Take one pending connection from a listening endpoint
    ///
    /// Returns `Ok(None)` when nothing is pending.
    fn accept(&mut self, handle: DriverHandle) -> Result<Option<DriverHandle>>;

    /// Establish a link from a client endpoint to `remote`
    fn connect(&mut self, handle: DriverHandle, remote: NodeAddress) -> Result<()>;

    /// Number of pending items (frames, or connections on a listener)
    fn poll(&mut self, handle: DriverHandle) -> Result<usize>;

    /// Put one frame on the link
    ///
    /// # Returns
    ///
    /// Number of bytes sent
    fn send(&mut self, handle: DriverHandle, frame: &[u8]) -> Result<usize>;

    /// Take one frame off the link (non-blocking)
    ///
    /// Returns `Ok(None)` if no frame is available.
    fn recv(&mut self, handle: DriverHandle, buf: &mut [u8]) -> Result<Option<usize>>;

    /// Release the endpoint; the handle must not be used afterwards
    fn close(&mut self, handle: DriverHandle);
}

/// Null driver (for testing)
///
/// Accepts and discards every frame, never receives anything and never
/// has pending connections.
#[derive(Debug)]
pub struct NullDriver {
    kind: PhyKind,
    probe_ok: bool,
    next_handle: u32,
    frames_sent: usize,
}

impl NullDriver {
    pub const fn new(kind: PhyKind) -> Self {
        Self {
            kind,
            probe_ok: true,
            next_handle: 1,
            frames_sent: 0,
        }
    }

    /// A driver whose hardware is absent
    pub const fn absent(kind: PhyKind) -> Self {
        Self {
            kind,
            probe_ok: false,
            next_handle: 1,
            frames_sent: 0,
        }
    }

    /// Frames discarded so far
    pub const fn frames_sent(&self) -> usize {
        self.frames_sent
    }
}

impl Default for NullDriver {
    fn default() -> Self {
        Self::new(PhyKind::Serial)
    }
}

impl PhysicalDriver for NullDriver {
    fn kind(&self) -> PhyKind {
        self.kind
    }

    fn probe(&mut self) -> Result<()> {
        if self.probe_ok {
            Ok(())
        } else {
            Err(Error::ProbeFailed(self.kind))
        }
    }

    fn open(&mut self, _role: SocketRole, _local: NodeAddress) -> Result<DriverHandle> {
        let handle = DriverHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        Ok(handle)
    }

    fn accept(&mut self, _handle: DriverHandle) -> Result<Option<DriverHandle>> {
        Ok(None)
    }

    fn connect(&mut self, _handle: DriverHandle, _remote: NodeAddress) -> Result<()> {
        Ok(())
    }

    fn poll(&mut self, _handle: DriverHandle) -> Result<usize> {
        Ok(0)
    }

    fn send(&mut self, _handle: DriverHandle, frame: &[u8]) -> Result<usize> {
        // Discard frame
        self.frames_sent += 1;
        Ok(frame.len())
    }

    fn recv(&mut self, _handle: DriverHandle, _buf: &mut [u8]) -> Result<Option<usize>> {
        Ok(None)
    }

    fn close(&mut self, _handle: DriverHandle) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_driver() {
        let mut driver = NullDriver::new(PhyKind::Nrf24);
        driver.probe().unwrap();

        let h = driver.open(SocketRole::Client, NodeAddress::UNASSIGNED).unwrap();
        assert_eq!(driver.send(h, b"hello").unwrap(), 5);
        assert_eq!(driver.frames_sent(), 1);

        let mut buf = [0u8; 16];
        assert_eq!(driver.recv(h, &mut buf).unwrap(), None);
        assert_eq!(driver.accept(h).unwrap(), None);
    }

    #[test]
    fn test_absent_driver_fails_probe() {
        let mut driver = NullDriver::absent(PhyKind::Rfm69);
        assert_eq!(driver.probe(), Err(Error::ProbeFailed(PhyKind::Rfm69)));
    }

    #[test]
    fn test_phy_kind_codes() {
        for kind in PhyKind::ALL {
            assert_eq!(PhyKind::from_u8(kind.as_u8()), Some(kind));
        }
        assert_eq!(PhyKind::from_u8(8), None);
        assert_eq!(PhyKind::Esp8266.to_string(), "esp8266");
    }

    #[test]
    fn test_socket_role_from_byte() {
        assert_eq!(SocketRole::try_from(1), Ok(SocketRole::Server));
        assert_eq!(SocketRole::try_from(2), Err(Error::UnsupportedRole(2)));
    }
}
