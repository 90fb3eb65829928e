// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Logical socket manager
//!
//! A fixed-capacity arena of logical sockets layered over one
//! [`PhysicalDriver`]. Each slot moves through
//! `Unused -> Bound -> Connected -> Unused`; operations attempted in the
//! wrong state fail with a specific error and leave the slot untouched.

use crate::driver::{DriverHandle, PhysicalDriver, SocketRole};
use crate::error::{Error, Result};
use crate::net::NodeAddress;

/// Socket capacity of a device node
pub const KNOT_SOCKET_FD_MAX_DEVICE: usize = 1;

/// Socket capacity of a gateway node
pub const KNOT_SOCKET_FD_MAX_GATEWAY: usize = 255;

/// Logical socket identifier (slot index)
pub type SocketId = u8;

/// Lifecycle state of a socket slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    /// Free slot
    Unused,
    /// Driver endpoint open, no peer
    Bound,
    /// Linked to a peer
    Connected,
}

/// An allocated socket slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalSocket {
    pub id: SocketId,
    pub handle: DriverHandle,
    pub role: SocketRole,
    pub local_address: NodeAddress,
    pub peer_address: NodeAddress,
    pub state: SocketState,
}

/// Socket arena bound to exactly one driver
pub struct SocketManager<D: PhysicalDriver> {
    driver: D,
    slots: Vec<Option<LogicalSocket>>,
}

impl<D: PhysicalDriver> SocketManager<D> {
    /// Probe `driver` and build an arena of `capacity` slots.
    ///
    /// Capacity must be within `1..=KNOT_SOCKET_FD_MAX_GATEWAY` so every
    /// socket id fits one byte.
    pub fn new(mut driver: D, capacity: usize) -> Result<Self> {
        if capacity == 0 || capacity > KNOT_SOCKET_FD_MAX_GATEWAY {
            return Err(Error::Config(format!(
                "socket capacity {capacity} outside 1..={KNOT_SOCKET_FD_MAX_GATEWAY}"
            )));
        }

        driver.probe().map_err(|e| {
            log::warn!("[socket] {} probe failed: {}", driver.kind(), e);
            Error::ProbeFailed(driver.kind())
        })?;
        log::debug!("[socket] {} ready, {} slots", driver.kind(), capacity);

        Ok(Self {
            driver,
            slots: vec![None; capacity],
        })
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of allocated slots
    pub fn in_use(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Ids of every allocated slot, ascending
    pub fn ids(&self) -> impl Iterator<Item = SocketId> + '_ {
        self.slots
            .iter()
            .filter_map(|s| s.as_ref().map(|sock| sock.id))
    }

    pub fn socket(&self, id: SocketId) -> Result<&LogicalSocket> {
        self.slots
            .get(usize::from(id))
            .and_then(Option::as_ref)
            .ok_or(Error::BadSocket(id))
    }

    fn socket_mut(&mut self, id: SocketId) -> Result<&mut LogicalSocket> {
        self.slots
            .get_mut(usize::from(id))
            .and_then(Option::as_mut)
            .ok_or(Error::BadSocket(id))
    }

    /// State of slot `id`; ids beyond capacity read as `Unused`
    pub fn state(&self, id: SocketId) -> SocketState {
        self.socket(id).map_or(SocketState::Unused, |s| s.state)
    }

    fn free_slot(&self) -> Option<SocketId> {
        self.slots
            .iter()
            .position(Option::is_none)
            .map(|i| i as SocketId)
    }

    /// Allocate a socket and open a driver endpoint bound to `local`.
    pub fn create_socket(&mut self, local: NodeAddress, role: SocketRole) -> Result<SocketId> {
        if !self.driver.supports_role(role) {
            return Err(Error::UnsupportedRole(role as u8));
        }
        let id = self.free_slot().ok_or(Error::NoFreeSlot)?;

        // Slot stays free if the driver refuses
        let handle = self.driver.open(role, local)?;
        self.slots[usize::from(id)] = Some(LogicalSocket {
            id,
            handle,
            role,
            local_address: local,
            peer_address: NodeAddress::UNASSIGNED,
            state: SocketState::Bound,
        });

        log::debug!("[socket] {} opened {:?} as {:?}", id, handle, role);
        Ok(id)
    }

    /// Take a pending connection from server socket `server`.
    ///
    /// The new socket is Connected, its peer is the server's local address
    /// and its local address is its own id.
    pub fn accept(&mut self, server: SocketId) -> Result<SocketId> {
        let listener = *self.socket(server)?;
        if listener.role != SocketRole::Server {
            return Err(Error::NotAServer(server));
        }

        let raw = self
            .driver
            .accept(listener.handle)?
            .ok_or(Error::NoPendingConnection)?;

        let Some(id) = self.free_slot() else {
            log::warn!("[socket] no slot for connection on {}, closing", server);
            self.driver.close(raw);
            return Err(Error::NoFreeSlot);
        };

        self.slots[usize::from(id)] = Some(LogicalSocket {
            id,
            handle: raw,
            role: SocketRole::Client,
            local_address: NodeAddress(id),
            peer_address: listener.local_address,
            state: SocketState::Connected,
        });

        log::debug!("[socket] {} accepted {:?} on {}", id, raw, server);
        Ok(id)
    }

    /// Link client socket `id` to `remote`.
    pub fn connect(&mut self, id: SocketId, remote: NodeAddress) -> Result<()> {
        let sock = *self.socket(id)?;
        if sock.role != SocketRole::Client {
            return Err(Error::NotAClient(id));
        }
        if sock.state == SocketState::Connected {
            return Err(Error::AlreadyConnected(id));
        }
        crate::validate::peer_address_is_valid(remote)?;

        self.driver.connect(sock.handle, remote).map_err(|e| {
            log::debug!("[socket] {} connect to {} failed: {}", id, remote, e);
            Error::ConnectFailed
        })?;

        let sock = self.socket_mut(id)?;
        sock.peer_address = remote;
        sock.state = SocketState::Connected;
        log::debug!("[socket] {} connected to {}", id, remote);
        Ok(())
    }

    /// Pending items on socket `id`, never blocks
    pub fn poll(&mut self, id: SocketId) -> Result<usize> {
        let handle = self.socket(id)?.handle;
        self.driver.poll(handle)
    }

    pub fn send(&mut self, id: SocketId, frame: &[u8]) -> Result<usize> {
        let sock = self.socket(id)?;
        if sock.state != SocketState::Connected {
            return Err(Error::NotConnected(id));
        }
        let handle = sock.handle;
        self.driver.send(handle, frame)
    }

    pub fn recv(&mut self, id: SocketId, buf: &mut [u8]) -> Result<Option<usize>> {
        let sock = self.socket(id)?;
        if sock.state != SocketState::Connected {
            return Err(Error::NotConnected(id));
        }
        let handle = sock.handle;
        self.driver.recv(handle, buf)
    }

    /// Close the driver endpoint and free slot `id`.
    pub fn close(&mut self, id: SocketId) -> Result<()> {
        let sock = self.socket(id)?;
        let handle = sock.handle;
        self.driver.close(handle);
        self.slots[usize::from(id)] = None;
        log::debug!("[socket] {} closed", id);
        Ok(())
    }

    pub fn set_local_address(&mut self, id: SocketId, addr: NodeAddress) -> Result<()> {
        self.socket_mut(id)?.local_address = addr;
        Ok(())
    }

    pub fn set_peer_address(&mut self, id: SocketId, addr: NodeAddress) -> Result<()> {
        self.socket_mut(id)?.peer_address = addr;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{LoopbackMedium, NullDriver, PhyKind};
    use crate::error::ValidationError;

    struct ClientOnly(NullDriver);

    impl PhysicalDriver for ClientOnly {
        fn kind(&self) -> PhyKind {
            self.0.kind()
        }
        fn probe(&mut self) -> Result<()> {
            self.0.probe()
        }
        fn supports_role(&self, role: SocketRole) -> bool {
            role == SocketRole::Client
        }
        fn open(&mut self, role: SocketRole, local: NodeAddress) -> Result<DriverHandle> {
            self.0.open(role, local)
        }
        fn accept(&mut self, h: DriverHandle) -> Result<Option<DriverHandle>> {
            self.0.accept(h)
        }
        fn connect(&mut self, h: DriverHandle, remote: NodeAddress) -> Result<()> {
            self.0.connect(h, remote)
        }
        fn poll(&mut self, h: DriverHandle) -> Result<usize> {
            self.0.poll(h)
        }
        fn send(&mut self, h: DriverHandle, frame: &[u8]) -> Result<usize> {
            self.0.send(h, frame)
        }
        fn recv(&mut self, h: DriverHandle, buf: &mut [u8]) -> Result<Option<usize>> {
            self.0.recv(h, buf)
        }
        fn close(&mut self, h: DriverHandle) {
            self.0.close(h)
        }
    }

    #[test]
    fn test_probe_failure_is_fatal() {
        let result = SocketManager::new(NullDriver::absent(PhyKind::Nrf905), 1);
        assert!(matches!(result, Err(Error::ProbeFailed(PhyKind::Nrf905))));
    }

    #[test]
    fn test_capacity_bounds() {
        assert!(SocketManager::new(NullDriver::default(), 0).is_err());
        assert!(SocketManager::new(NullDriver::default(), 256).is_err());
        let mgr = SocketManager::new(NullDriver::default(), KNOT_SOCKET_FD_MAX_GATEWAY).unwrap();
        assert_eq!(mgr.capacity(), 255);
    }

    #[test]
    fn test_device_capacity_exhaustion() {
        let mut mgr = SocketManager::new(NullDriver::default(), KNOT_SOCKET_FD_MAX_DEVICE).unwrap();
        let id = mgr
            .create_socket(NodeAddress::UNASSIGNED, SocketRole::Client)
            .unwrap();
        assert_eq!(mgr.state(id), SocketState::Bound);
        assert_eq!(
            mgr.create_socket(NodeAddress::UNASSIGNED, SocketRole::Client),
            Err(Error::NoFreeSlot)
        );

        mgr.close(id).unwrap();
        assert_eq!(mgr.state(id), SocketState::Unused);
        assert!(mgr
            .create_socket(NodeAddress::UNASSIGNED, SocketRole::Client)
            .is_ok());
    }

    #[test]
    fn test_unsupported_role() {
        let mut mgr = SocketManager::new(ClientOnly(NullDriver::default()), 4).unwrap();
        assert_eq!(
            mgr.create_socket(NodeAddress(0xF1), SocketRole::Server),
            Err(Error::UnsupportedRole(1))
        );
        assert_eq!(mgr.in_use(), 0);
    }

    #[test]
    fn test_accept_rejects_client_socket() {
        let mut mgr = SocketManager::new(NullDriver::default(), 4).unwrap();
        let client = mgr
            .create_socket(NodeAddress::UNASSIGNED, SocketRole::Client)
            .unwrap();
        assert_eq!(mgr.accept(client), Err(Error::NotAServer(client)));
    }

    #[test]
    fn test_accept_without_pending() {
        let mut mgr = SocketManager::new(NullDriver::default(), 4).unwrap();
        let server = mgr
            .create_socket(NodeAddress(0xF1), SocketRole::Server)
            .unwrap();
        assert_eq!(mgr.accept(server), Err(Error::NoPendingConnection));
        assert_eq!(mgr.in_use(), 1);
    }

    #[test]
    fn test_accept_sets_addresses() {
        let medium = LoopbackMedium::new();
        let mut gw = SocketManager::new(medium.driver(PhyKind::Nrf24), 8).unwrap();
        let mut dev = SocketManager::new(medium.driver(PhyKind::Nrf24), 1).unwrap();

        let server = gw.create_socket(NodeAddress(0xF1), SocketRole::Server).unwrap();
        let client = dev
            .create_socket(NodeAddress::UNASSIGNED, SocketRole::Client)
            .unwrap();
        dev.connect(client, NodeAddress(0xF1)).unwrap();
        assert_eq!(dev.state(client), SocketState::Connected);

        let accepted = gw.accept(server).unwrap();
        let sock = gw.socket(accepted).unwrap();
        assert_eq!(sock.state, SocketState::Connected);
        assert_eq!(sock.peer_address, NodeAddress(0xF1));
        assert_eq!(sock.local_address, NodeAddress(accepted));
    }

    #[test]
    fn test_accept_closes_handle_when_full() {
        let medium = LoopbackMedium::new();
        let mut gw = SocketManager::new(medium.driver(PhyKind::Eth), 1).unwrap();
        let mut dev = SocketManager::new(medium.driver(PhyKind::Eth), 1).unwrap();

        let server = gw.create_socket(NodeAddress(0xF1), SocketRole::Server).unwrap();
        let client = dev
            .create_socket(NodeAddress::UNASSIGNED, SocketRole::Client)
            .unwrap();
        dev.connect(client, NodeAddress(0xF1)).unwrap();

        // listener + client + server-side stream
        assert_eq!(medium.open_endpoints(), 3);
        assert_eq!(gw.accept(server), Err(Error::NoFreeSlot));
        assert_eq!(medium.open_endpoints(), 2);
    }

    #[test]
    fn test_connect_state_checks() {
        let medium = LoopbackMedium::new();
        let mut mgr = SocketManager::new(medium.driver(PhyKind::Serial), 4).unwrap();
        let server = mgr.create_socket(NodeAddress(0xF1), SocketRole::Server).unwrap();
        let client = mgr
            .create_socket(NodeAddress::UNASSIGNED, SocketRole::Client)
            .unwrap();

        assert_eq!(mgr.connect(server, NodeAddress(0xF1)), Err(Error::NotAClient(server)));
        assert_eq!(
            mgr.connect(client, NodeAddress::BROADCAST),
            Err(Error::Validation(ValidationError::InvalidAddress(0xFF)))
        );
        assert_eq!(mgr.connect(client, NodeAddress(0xF5)), Err(Error::ConnectFailed));
        assert_eq!(mgr.state(client), SocketState::Bound);

        mgr.connect(client, NodeAddress(0xF1)).unwrap();
        assert_eq!(
            mgr.connect(client, NodeAddress(0xF1)),
            Err(Error::AlreadyConnected(client))
        );
        assert_eq!(mgr.socket(client).unwrap().peer_address, NodeAddress(0xF1));
    }

    #[test]
    fn test_unknown_socket() {
        let mut mgr = SocketManager::new(NullDriver::default(), 2).unwrap();
        assert_eq!(mgr.poll(1), Err(Error::BadSocket(1)));
        assert_eq!(mgr.close(9), Err(Error::BadSocket(9)));
        assert_eq!(mgr.state(200), SocketState::Unused);
    }

    #[test]
    fn test_send_requires_connection() {
        let mut mgr = SocketManager::new(NullDriver::default(), 2).unwrap();
        let id = mgr
            .create_socket(NodeAddress::UNASSIGNED, SocketRole::Client)
            .unwrap();
        assert_eq!(mgr.send(id, b"x"), Err(Error::NotConnected(id)));
        mgr.connect(id, NodeAddress(0xF1)).unwrap();
        assert_eq!(mgr.send(id, b"x"), Ok(1));
        assert_eq!(mgr.driver().frames_sent(), 1);
    }
}
