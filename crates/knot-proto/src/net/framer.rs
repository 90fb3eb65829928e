// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Network framer
//!
//! Drives the network layer over a [`SocketManager`]: join/unjoin,
//! address assignment, acknowledgements and retransmission. Nothing
//! blocks; the caller invokes [`NetworkFramer::service`] with the current
//! time and receives the resulting [`NetEvent`]s.
//!
//! # Example
//!
//! ```ignore
//! let mut gw = NetworkFramer::new(medium.driver(PhyKind::Nrf24), &NetConfig::gateway(PhyKind::Nrf24))?;
//! let server = gw.listen()?;
//!
//! let mut dev = NetworkFramer::new(medium.driver(PhyKind::Nrf24), &NetConfig::device(PhyKind::Nrf24))?;
//! let link = dev.connect(gw.gateway_address())?;
//! dev.join(link, now_ms)?;
//!
//! let client = gw.accept(server)?;
//! gw.service(now_ms);          // answers JOIN_RESULT
//! for event in dev.service(now_ms) {
//!     // NetEvent::Joined { .. }
//! }
//! ```

use heapless::Vec as FrameVec;

use super::join::{answer_join, AddressPool, JoinKind, JoinRequest, JoinResult, JoinStatus};
use super::message::{NetBody, NetMessage, NetMessageType};
use super::retry::{RetryAction, RetryState};
use super::{NodeAddress, NodeRole, NET_MESSAGE_SIZE, NET_PAYLOAD_MAX};
use crate::app::AppMessage;
use crate::config::NetConfig;
use crate::driver::{PhysicalDriver, SocketRole};
use crate::error::{Error, Result};
use crate::socket::{SocketId, SocketManager, SocketState};
use crate::validate;

/// Something the caller must know about after servicing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetEvent {
    /// Our join succeeded; `address` is now our local address
    Joined {
        socket: SocketId,
        address: NodeAddress,
    },
    /// The gateway refused our join
    JoinRejected {
        socket: SocketId,
        status: JoinStatus,
    },
    /// A peer joined through this gateway
    DeviceJoined {
        socket: SocketId,
        address: NodeAddress,
    },
    /// A peer unjoined; its address is free again
    DeviceLeft {
        socket: SocketId,
        address: NodeAddress,
    },
    /// The outstanding message of this type was acknowledged
    Delivered {
        socket: SocketId,
        message_type: NetMessageType,
    },
    /// Encoded application message from a joined peer
    App {
        socket: SocketId,
        from: NodeAddress,
        payload: FrameVec<u8, NET_PAYLOAD_MAX>,
    },
    /// The outstanding message was abandoned
    SendFailed {
        socket: SocketId,
        message_type: NetMessageType,
        error: Error,
    },
    /// The gateway moved us to a new address
    AddressChanged {
        socket: SocketId,
        address: NodeAddress,
    },
}

impl NetEvent {
    pub fn socket(&self) -> SocketId {
        match self {
            NetEvent::Joined { socket, .. }
            | NetEvent::JoinRejected { socket, .. }
            | NetEvent::DeviceJoined { socket, .. }
            | NetEvent::DeviceLeft { socket, .. }
            | NetEvent::Delivered { socket, .. }
            | NetEvent::App { socket, .. }
            | NetEvent::SendFailed { socket, .. }
            | NetEvent::AddressChanged { socket, .. } => *socket,
        }
    }

    /// Decode the application message carried by an `App` event
    pub fn app_message(&self) -> Option<Result<AppMessage>> {
        match self {
            NetEvent::App { payload, .. } => Some(AppMessage::decode(payload)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Link {
    joined: bool,
    retry: RetryState,
}

/// Network layer of one node
pub struct NetworkFramer<D: PhysicalDriver> {
    sockets: SocketManager<D>,
    role: NodeRole,
    gateway_address: NodeAddress,
    pool: AddressPool,
    links: Vec<Link>,
}

impl<D: PhysicalDriver> NetworkFramer<D> {
    /// Build the network layer over `driver`.
    ///
    /// The driver must speak the configured physical layer. The node's
    /// `log_level` becomes the `log` facade's maximum level.
    pub fn new(driver: D, config: &NetConfig) -> Result<Self> {
        config.validate()?;
        config.apply_log_level();
        if driver.kind() != config.phy {
            return Err(Error::DriverMismatch {
                expected: config.phy,
                actual: driver.kind(),
            });
        }

        let sockets = SocketManager::new(driver, config.socket_capacity())?;
        let mut pool = AddressPool::new(config.max_devices);
        if config.role == NodeRole::Gateway {
            pool.reserve(config.gateway_address);
        }

        log::info!(
            "[net] {} on {} ({} sockets)",
            config.role.name(),
            config.phy,
            sockets.capacity()
        );

        Ok(Self {
            links: vec![Link::default(); sockets.capacity()],
            sockets,
            role: config.role,
            gateway_address: config.gateway_address,
            pool,
        })
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    pub fn gateway_address(&self) -> NodeAddress {
        self.gateway_address
    }

    pub fn sockets(&self) -> &SocketManager<D> {
        &self.sockets
    }

    pub fn driver(&self) -> &D {
        self.sockets.driver()
    }

    pub fn pool(&self) -> &AddressPool {
        &self.pool
    }

    pub fn is_joined(&self, id: SocketId) -> bool {
        self.links.get(usize::from(id)).is_some_and(|l| l.joined)
    }

    /// Whether a reliable message is awaiting acknowledgement on `id`
    pub fn is_pending(&self, id: SocketId) -> bool {
        self.links
            .get(usize::from(id))
            .is_some_and(|l| l.retry.is_pending())
    }

    pub fn local_address(&self, id: SocketId) -> Result<NodeAddress> {
        Ok(self.sockets.socket(id)?.local_address)
    }

    pub fn peer_address(&self, id: SocketId) -> Result<NodeAddress> {
        Ok(self.sockets.socket(id)?.peer_address)
    }

    fn require_role(&self, role: NodeRole) -> Result<()> {
        if self.role != role {
            return Err(Error::WrongNodeRole(role.name()));
        }
        Ok(())
    }

    fn link_mut(&mut self, id: SocketId) -> Result<&mut Link> {
        self.links
            .get_mut(usize::from(id))
            .ok_or(Error::BadSocket(id))
    }

    // ========================================================================
    // Socket lifecycle
    // ========================================================================

    /// Open the gateway's listening socket.
    pub fn listen(&mut self) -> Result<SocketId> {
        self.require_role(NodeRole::Gateway)?;
        let id = self
            .sockets
            .create_socket(self.gateway_address, SocketRole::Server)?;
        log::info!("[net] listening on {}", self.gateway_address);
        Ok(id)
    }

    /// Open a client socket linked to the given gateway.
    pub fn connect(&mut self, gateway: NodeAddress) -> Result<SocketId> {
        validate::gateway_address_is_valid(gateway)?;
        let id = self
            .sockets
            .create_socket(NodeAddress::UNASSIGNED, SocketRole::Client)?;
        if let Err(e) = self.sockets.connect(id, gateway) {
            // Slot must not leak on a failed connect
            let _ = self.sockets.close(id);
            return Err(e);
        }
        *self.link_mut(id)? = Link::default();
        Ok(id)
    }

    /// Accept one pending connection on the listening socket.
    ///
    /// The peer stays unassigned until it joins.
    pub fn accept(&mut self, server: SocketId) -> Result<SocketId> {
        self.require_role(NodeRole::Gateway)?;
        let id = self.sockets.accept(server)?;
        self.sockets.set_local_address(id, self.gateway_address)?;
        self.sockets.set_peer_address(id, NodeAddress::UNASSIGNED)?;
        *self.link_mut(id)? = Link::default();
        log::info!("[net] accepted socket {}", id);
        Ok(id)
    }

    /// Accept every pending connection; returns the new socket ids.
    pub fn accept_pending(&mut self, server: SocketId) -> Result<std::vec::Vec<SocketId>> {
        let mut accepted = std::vec::Vec::new();
        loop {
            match self.accept(server) {
                Ok(id) => accepted.push(id),
                Err(Error::NoPendingConnection) => return Ok(accepted),
                Err(e) => return Err(e),
            }
        }
    }

    /// Close socket `id`, returning any address it held to the pool.
    pub fn close(&mut self, id: SocketId) -> Result<()> {
        let sock = *self.sockets.socket(id)?;
        let link = self.link_mut(id)?;
        let was_joined = link.joined;
        *link = Link::default();

        if self.role == NodeRole::Gateway && was_joined && sock.role == SocketRole::Client {
            self.pool.release(sock.peer_address);
            log::info!("[net] socket {} closed, released {}", id, sock.peer_address);
        }
        self.sockets.close(id)
    }

    // ========================================================================
    // Outbound
    // ========================================================================

    /// Start the device join handshake on client socket `id`.
    pub fn join(&mut self, id: SocketId, now_ms: u64) -> Result<()> {
        self.require_role(NodeRole::Device)?;
        self.start_join(id, NetBody::JoinLocal(JoinRequest::current()), now_ms)
    }

    /// Join another gateway as a gateway on client socket `id`.
    pub fn join_gateway(&mut self, id: SocketId, now_ms: u64) -> Result<()> {
        self.require_role(NodeRole::Gateway)?;
        self.start_join(id, NetBody::JoinGateway(JoinRequest::current()), now_ms)
    }

    fn start_join(&mut self, id: SocketId, body: NetBody, now_ms: u64) -> Result<()> {
        if self.sockets.socket(id)?.role != SocketRole::Client {
            return Err(Error::NotAClient(id));
        }
        self.send_body(id, body, now_ms)?;
        log::debug!("[net] socket {} join requested", id);
        Ok(())
    }

    /// Leave the network. The socket counts as unjoined immediately.
    pub fn unjoin(&mut self, id: SocketId, now_ms: u64) -> Result<()> {
        if !self.is_joined(id) {
            return Err(Error::NotJoined(id));
        }
        self.send_body(id, NetBody::UnjoinLocal, now_ms)?;
        self.link_mut(id)?.joined = false;
        self.sockets.set_local_address(id, NodeAddress::UNASSIGNED)?;
        log::info!("[net] socket {} unjoined", id);
        Ok(())
    }

    /// Send an application message to the peer of joined socket `id`.
    pub fn send_app(&mut self, id: SocketId, msg: &AppMessage, now_ms: u64) -> Result<()> {
        if !self.is_joined(id) {
            return Err(Error::NotJoined(id));
        }
        let bytes = msg.encode()?;
        self.send_body(id, NetBody::app(&bytes)?, now_ms)
    }

    /// Move the device on gateway socket `id` to `address`.
    pub fn set_device_address(
        &mut self,
        id: SocketId,
        address: NodeAddress,
        now_ms: u64,
    ) -> Result<()> {
        self.require_role(NodeRole::Gateway)?;
        if !self.is_joined(id) {
            return Err(Error::NotJoined(id));
        }
        validate::device_address_is_valid(address)?;
        if self.is_pending(id) {
            return Err(Error::TransmitPending(id));
        }

        let old = self.sockets.socket(id)?.peer_address;
        if old == address {
            return Ok(());
        }
        if !self.pool.reserve(address) {
            return Err(crate::error::ValidationError::InvalidAddress(address.0).into());
        }

        // Frame goes to the old address, later traffic to the new one
        if let Err(e) = self.send_body(id, NetBody::SetAddress(address), now_ms) {
            self.pool.release(address);
            return Err(e);
        }
        self.pool.release(old);
        self.sockets.set_peer_address(id, address)?;
        log::info!("[net] socket {} moved {} -> {}", id, old, address);
        Ok(())
    }

    /// Frame `body` for the peer of `id` and put it on the link.
    ///
    /// Reliable messages are tracked for retransmission; a send failure
    /// after tracking is left to the retry timer.
    fn send_body(&mut self, id: SocketId, body: NetBody, now_ms: u64) -> Result<()> {
        let sock = *self.sockets.socket(id)?;
        if sock.state != SocketState::Connected {
            return Err(Error::NotConnected(id));
        }

        let msg = NetMessage::new(sock.peer_address, sock.local_address, body);
        let frame = msg.encode()?;
        let msg_type = msg.message_type();

        if msg.is_reliable() {
            let link = self.link_mut(id)?;
            if !link.retry.begin(frame, msg_type, now_ms) {
                return Err(Error::TransmitPending(id));
            }
            if let Err(e) = self.sockets.send(id, &frame) {
                log::warn!("[net] socket {} send {:?} failed, will retry: {}", id, msg_type, e);
            }
            return Ok(());
        }

        self.sockets.send(id, &frame)?;
        Ok(())
    }

    // ========================================================================
    // Inbound
    // ========================================================================

    /// Receive pending frames and advance retransmission timers.
    pub fn service(&mut self, now_ms: u64) -> std::vec::Vec<NetEvent> {
        let mut events = std::vec::Vec::new();
        let ids: std::vec::Vec<SocketId> = self.sockets.ids().collect();

        for id in ids {
            if self.sockets.state(id) != SocketState::Connected {
                continue;
            }
            self.drain(id, now_ms, &mut events);
            self.tick(id, now_ms, &mut events);
        }
        events
    }

    fn drain(&mut self, id: SocketId, now_ms: u64, events: &mut std::vec::Vec<NetEvent>) {
        let mut buf = [0u8; NET_MESSAGE_SIZE];
        loop {
            match self.sockets.recv(id, &mut buf) {
                Ok(Some(n)) => self.handle_frame(id, &buf[..n], now_ms, events),
                Ok(None) => break,
                Err(e) => {
                    log::warn!("[net] socket {} recv failed: {}", id, e);
                    break;
                }
            }
        }
    }

    fn tick(&mut self, id: SocketId, now_ms: u64, events: &mut std::vec::Vec<NetEvent>) {
        let Some(link) = self.links.get_mut(usize::from(id)) else {
            return;
        };
        match link.retry.poll(now_ms) {
            RetryAction::Idle | RetryAction::Wait => {}
            RetryAction::Retransmit(frame) => {
                log::debug!(
                    "[net] socket {} retransmit #{}",
                    id,
                    link.retry.retransmissions()
                );
                if let Err(e) = self.sockets.send(id, &frame) {
                    log::warn!("[net] socket {} retransmit failed: {}", id, e);
                }
            }
            RetryAction::Expired(message_type) => {
                log::warn!(
                    "[net] socket {} gave up on {:?} after {} retries",
                    id,
                    message_type,
                    super::KNOT_NET_RETRIES
                );
                events.push(NetEvent::SendFailed {
                    socket: id,
                    message_type,
                    error: Error::Timeout,
                });
            }
        }
    }

    fn handle_frame(
        &mut self,
        id: SocketId,
        bytes: &[u8],
        now_ms: u64,
        events: &mut std::vec::Vec<NetEvent>,
    ) {
        let msg = match NetMessage::decode(bytes) {
            Ok(msg) => msg,
            Err(e) => {
                log::warn!("[net] socket {} dropped malformed frame: {}", id, e);
                return;
            }
        };
        let Ok(sock) = self.sockets.socket(id).copied() else {
            return;
        };
        if !addressed_to(&msg, sock.local_address) {
            log::debug!(
                "[net] socket {} dropped {:?} for {} (we are {})",
                id,
                msg.message_type(),
                msg.to,
                sock.local_address
            );
            return;
        }

        let result = match msg.body {
            NetBody::Ack(acked) => {
                self.on_ack(id, acked, events);
                Ok(())
            }
            NetBody::JoinLocal(req) => self.on_join_request(id, &req, JoinKind::Device, events),
            NetBody::JoinGateway(req) => self.on_join_request(id, &req, JoinKind::Gateway, events),
            NetBody::JoinResult(res) => {
                self.on_join_result(id, &res, events);
                Ok(())
            }
            NetBody::UnjoinLocal => self.on_unjoin(id, sock.peer_address, now_ms, events),
            NetBody::SetAddress(address) => self.on_set_address(id, address, now_ms, events),
            NetBody::App(payload) => self.on_app(id, msg.from, sock.peer_address, payload, now_ms, events),
        };

        if let Err(e) = result {
            log::warn!("[net] socket {} failed to answer: {}", id, e);
        }
    }

    fn ack(&mut self, id: SocketId, acked: NetMessageType, now_ms: u64) -> Result<()> {
        self.send_body(id, NetBody::Ack(acked), now_ms)
    }

    fn on_ack(&mut self, id: SocketId, acked: NetMessageType, events: &mut std::vec::Vec<NetEvent>) {
        let Ok(link) = self.link_mut(id) else {
            return;
        };
        if link.retry.acknowledge(acked) {
            events.push(NetEvent::Delivered {
                socket: id,
                message_type: acked,
            });
        } else {
            log::debug!("[net] socket {} stray ACK for {:?}", id, acked);
        }
    }

    fn on_join_request(
        &mut self,
        id: SocketId,
        req: &JoinRequest,
        kind: JoinKind,
        events: &mut std::vec::Vec<NetEvent>,
    ) -> Result<()> {
        if self.role != NodeRole::Gateway {
            log::warn!("[net] socket {} join request on a device, dropped", id);
            return Ok(());
        }

        let peer = self.sockets.socket(id)?.peer_address;
        let was_joined = self.is_joined(id);
        let current = was_joined.then_some(peer);
        let result = answer_join(&mut self.pool, req, kind, current);

        if result.is_success() {
            self.link_mut(id)?.joined = true;
            self.sockets.set_peer_address(id, result.address)?;
            if !(was_joined && peer == result.address) {
                log::info!("[net] socket {} joined as {}", id, result.address);
                events.push(NetEvent::DeviceJoined {
                    socket: id,
                    address: result.address,
                });
            }
        }

        let to = if result.is_success() {
            result.address
        } else {
            NodeAddress::UNASSIGNED
        };
        self.send_join_result(id, to, result)
    }

    /// JOIN_RESULT is never retransmitted; a lost one triggers a repeated
    /// request, answered with the same address.
    fn send_join_result(&mut self, id: SocketId, to: NodeAddress, result: JoinResult) -> Result<()> {
        let msg = NetMessage::new(to, self.gateway_address, NetBody::JoinResult(result));
        let frame = msg.encode()?;
        self.sockets.send(id, &frame)?;
        Ok(())
    }

    fn on_join_result(&mut self, id: SocketId, res: &JoinResult, events: &mut std::vec::Vec<NetEvent>) {
        let Ok(link) = self.link_mut(id) else {
            return;
        };
        let asked = link.retry.pending_type();
        if !link.retry.resolve_join() {
            log::debug!("[net] socket {} stale JOIN_RESULT", id);
            return;
        }

        if !res.is_success() {
            link.joined = false;
            log::info!("[net] socket {} join rejected: {:?}", id, res.status);
            events.push(NetEvent::JoinRejected {
                socket: id,
                status: res.status,
            });
            return;
        }

        let in_range = match asked {
            Some(NetMessageType::JoinGateway) => validate::gateway_address_is_valid(res.address),
            _ => validate::device_address_is_valid(res.address),
        };
        if let Err(e) = in_range {
            log::warn!("[net] socket {} assigned unusable {}: {}", id, res.address, e);
            events.push(NetEvent::SendFailed {
                socket: id,
                message_type: asked.unwrap_or(NetMessageType::JoinLocal),
                error: e.into(),
            });
            return;
        }

        link.joined = true;
        if self.sockets.set_local_address(id, res.address).is_err() {
            return;
        }
        log::info!("[net] socket {} joined as {}", id, res.address);
        events.push(NetEvent::Joined {
            socket: id,
            address: res.address,
        });
    }

    fn on_unjoin(
        &mut self,
        id: SocketId,
        peer: NodeAddress,
        now_ms: u64,
        events: &mut std::vec::Vec<NetEvent>,
    ) -> Result<()> {
        if self.role != NodeRole::Gateway {
            log::warn!("[net] socket {} UNJOIN_LOCAL on a device, dropped", id);
            return Ok(());
        }

        // A repeated unjoin (lost ACK) is acknowledged again
        if self.is_joined(id) {
            self.link_mut(id)?.joined = false;
            self.pool.release(peer);
            self.sockets.set_peer_address(id, NodeAddress::UNASSIGNED)?;
            log::info!("[net] socket {} {} left", id, peer);
            events.push(NetEvent::DeviceLeft {
                socket: id,
                address: peer,
            });
        }
        self.ack(id, NetMessageType::UnjoinLocal, now_ms)
    }

    fn on_set_address(
        &mut self,
        id: SocketId,
        address: NodeAddress,
        now_ms: u64,
        events: &mut std::vec::Vec<NetEvent>,
    ) -> Result<()> {
        if self.role != NodeRole::Device || !self.is_joined(id) {
            log::warn!("[net] socket {} unexpected SET_ADDRESS, dropped", id);
            return Ok(());
        }
        if let Err(e) = validate::device_address_is_valid(address) {
            log::warn!("[net] socket {} SET_ADDRESS rejected: {}", id, e);
            return Ok(());
        }

        if self.sockets.socket(id)?.local_address != address {
            self.sockets.set_local_address(id, address)?;
            log::info!("[net] socket {} address changed to {}", id, address);
            events.push(NetEvent::AddressChanged {
                socket: id,
                address,
            });
        }
        self.ack(id, NetMessageType::SetAddress, now_ms)
    }

    fn on_app(
        &mut self,
        id: SocketId,
        from: NodeAddress,
        peer: NodeAddress,
        payload: FrameVec<u8, NET_PAYLOAD_MAX>,
        now_ms: u64,
        events: &mut std::vec::Vec<NetEvent>,
    ) -> Result<()> {
        if !self.is_joined(id) || from != peer {
            log::warn!("[net] socket {} APPMSG from unjoined {}, dropped", id, from);
            return Ok(());
        }
        self.ack(id, NetMessageType::AppMsg, now_ms)?;
        events.push(NetEvent::App {
            socket: id,
            from,
            payload,
        });
        Ok(())
    }
}

/// Frames for us, broadcasts, anything while we have no address yet, and
/// a repeated SET_ADDRESS naming the address we already moved to.
fn addressed_to(msg: &NetMessage, local: NodeAddress) -> bool {
    msg.to == local
        || msg.is_broadcast()
        || local.is_unassigned()
        || matches!(msg.body, NetBody::SetAddress(a) if a == local)
}
