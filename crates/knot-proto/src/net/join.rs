// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Join handshake
//!
//! A device sends JOIN_LOCAL carrying its protocol version; the gateway
//! answers with JOIN_RESULT carrying a status and, on success, the device
//! address it assigned. Gateways joining another gateway use JOIN_GATEWAY
//! and draw from the gateway range instead.

use super::{NodeAddress, KNOT_NET_VERSION_MAJOR, KNOT_NET_VERSION_MINOR};
use crate::error::{Error, Result};
use crate::validate;

/// Outcome carried by JOIN_RESULT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum JoinStatus {
    Success = 0x00,
    /// Major version differs from the gateway's
    IncompatibleVersion = 0x01,
    /// Every address of the requested range is in use
    NoAddressAvailable = 0x02,
}

impl JoinStatus {
    pub fn from_u8(v: u8) -> Result<Self> {
        match v {
            0x00 => Ok(Self::Success),
            0x01 => Ok(Self::IncompatibleVersion),
            0x02 => Ok(Self::NoAddressAvailable),
            other => Err(Error::UnknownJoinStatus(other)),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// JOIN_LOCAL / JOIN_GATEWAY payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinRequest {
    pub major: u8,
    pub minor: u8,
    /// Always zero in requests
    pub result: u8,
}

impl JoinRequest {
    /// Wire size
    pub const SIZE: usize = 3;

    /// Request advertising our protocol version
    pub const fn current() -> Self {
        Self {
            major: KNOT_NET_VERSION_MAJOR,
            minor: KNOT_NET_VERSION_MINOR,
            result: 0,
        }
    }
}

impl Default for JoinRequest {
    fn default() -> Self {
        Self::current()
    }
}

/// JOIN_RESULT payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinResult {
    pub major: u8,
    pub minor: u8,
    pub status: JoinStatus,
    /// Assigned address, `UNASSIGNED` unless `status` is `Success`
    pub address: NodeAddress,
}

impl JoinResult {
    /// Wire size
    pub const SIZE: usize = 4;

    pub const fn accepted(address: NodeAddress) -> Self {
        Self {
            major: KNOT_NET_VERSION_MAJOR,
            minor: KNOT_NET_VERSION_MINOR,
            status: JoinStatus::Success,
            address,
        }
    }

    pub const fn rejected(status: JoinStatus) -> Self {
        Self {
            major: KNOT_NET_VERSION_MAJOR,
            minor: KNOT_NET_VERSION_MINOR,
            status,
            address: NodeAddress::UNASSIGNED,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JoinStatus::Success
    }
}

/// Address allocator of a gateway
///
/// Devices and gateways are drawn from separate ranges; allocation always
/// returns the lowest free address of the range.
#[derive(Debug, Clone)]
pub struct AddressPool {
    in_use: [bool; 256],
    max_devices: usize,
    devices: usize,
}

impl AddressPool {
    /// Pool limited to `max_devices` simultaneous devices (at most 240).
    pub fn new(max_devices: usize) -> Self {
        Self {
            in_use: [false; 256],
            max_devices: max_devices.min(NodeAddress::DEVICE_COUNT),
            devices: 0,
        }
    }

    pub fn max_devices(&self) -> usize {
        self.max_devices
    }

    /// Devices currently holding an address
    pub fn devices(&self) -> usize {
        self.devices
    }

    pub fn is_allocated(&self, addr: NodeAddress) -> bool {
        self.in_use[usize::from(addr.0)]
    }

    pub fn allocate_device(&mut self) -> Option<NodeAddress> {
        if self.devices >= self.max_devices {
            return None;
        }
        let addr = self.lowest_free(NodeAddress::DEVICE_MIN, NodeAddress::DEVICE_MAX)?;
        self.mark(addr);
        Some(addr)
    }

    pub fn allocate_gateway(&mut self) -> Option<NodeAddress> {
        let addr = self.lowest_free(NodeAddress::GATEWAY_MIN, NodeAddress::GATEWAY_MAX)?;
        self.mark(addr);
        Some(addr)
    }

    /// Claim a specific device or gateway address.
    ///
    /// Returns false if the address is outside both ranges, already taken,
    /// or would exceed the device limit.
    pub fn reserve(&mut self, addr: NodeAddress) -> bool {
        if !(addr.is_device() || addr.is_gateway()) || self.is_allocated(addr) {
            return false;
        }
        if addr.is_device() && self.devices >= self.max_devices {
            return false;
        }
        self.mark(addr);
        true
    }

    /// Return `addr` to the pool; releasing a free address is a no-op.
    pub fn release(&mut self, addr: NodeAddress) {
        let slot = &mut self.in_use[usize::from(addr.0)];
        if *slot {
            *slot = false;
            if addr.is_device() {
                self.devices -= 1;
            }
        }
    }

    fn lowest_free(&self, min: NodeAddress, max: NodeAddress) -> Option<NodeAddress> {
        (min.0..=max.0)
            .map(NodeAddress)
            .find(|a| !self.is_allocated(*a))
    }

    fn mark(&mut self, addr: NodeAddress) {
        self.in_use[usize::from(addr.0)] = true;
        if addr.is_device() {
            self.devices += 1;
        }
    }
}

impl Default for AddressPool {
    fn default() -> Self {
        Self::new(NodeAddress::DEVICE_COUNT)
    }
}

/// Which range a join request draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// JOIN_LOCAL
    Device,
    /// JOIN_GATEWAY
    Gateway,
}

/// Gateway-side evaluation of a join request.
///
/// `current` is the address already held by the requesting socket, if any;
/// a repeated request is answered with it instead of a fresh allocation. A
/// request for the other range moves the peer: the new address is drawn
/// and `current` goes back to the pool.
pub fn answer_join(
    pool: &mut AddressPool,
    request: &JoinRequest,
    kind: JoinKind,
    current: Option<NodeAddress>,
) -> JoinResult {
    if validate::version_is_compatible(request.major, request.minor).is_err() {
        log::info!(
            "[join] rejected version {}.{} (ours {}.{})",
            request.major,
            request.minor,
            KNOT_NET_VERSION_MAJOR,
            KNOT_NET_VERSION_MINOR
        );
        return JoinResult::rejected(JoinStatus::IncompatibleVersion);
    }

    if let Some(addr) = current {
        let same_range = match kind {
            JoinKind::Device => addr.is_device(),
            JoinKind::Gateway => addr.is_gateway(),
        };
        if same_range && pool.is_allocated(addr) {
            return JoinResult::accepted(addr);
        }
    }

    let assigned = match kind {
        JoinKind::Device => pool.allocate_device(),
        JoinKind::Gateway => pool.allocate_gateway(),
    };
    match assigned {
        Some(addr) => {
            if let Some(old) = current {
                log::info!("[join] {:?} join from {} releases it", kind, old);
                pool.release(old);
            }
            JoinResult::accepted(addr)
        }
        None => {
            log::warn!("[join] {:?} address pool exhausted", kind);
            JoinResult::rejected(JoinStatus::NoAddressAvailable)
        }
    }
}
