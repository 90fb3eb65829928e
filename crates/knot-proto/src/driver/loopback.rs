// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory loopback driver
//!
//! A [`LoopbackMedium`] models a shared link that any number of
//! [`LoopbackDriver`]s attach to. Servers listen on a node address;
//! clients connect to that address and get a paired stream endpoint.
//! Frames are delivered in order to the peer's inbox.
//!
//! The medium can drop frames to model a lossy link and counts every
//! frame put on the air, dropped or not.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use super::{DriverHandle, PhyKind, PhysicalDriver, SocketRole};
use crate::error::{Error, Result};
use crate::net::NodeAddress;

#[derive(Debug)]
enum Endpoint {
    Listener {
        address: NodeAddress,
        backlog: VecDeque<DriverHandle>,
    },
    Stream {
        peer: Option<DriverHandle>,
        inbox: VecDeque<Vec<u8>>,
    },
}

#[derive(Debug, Default)]
struct MediumState {
    next_handle: u32,
    endpoints: BTreeMap<DriverHandle, Endpoint>,
    listeners: BTreeMap<NodeAddress, DriverHandle>,
    drop_next: usize,
    frames_sent: usize,
    frames_dropped: usize,
}

impl MediumState {
    fn alloc(&mut self, endpoint: Endpoint) -> DriverHandle {
        self.next_handle = self.next_handle.wrapping_add(1);
        let handle = DriverHandle(self.next_handle);
        self.endpoints.insert(handle, endpoint);
        handle
    }
}

/// Shared in-memory link
#[derive(Debug, Clone, Default)]
pub struct LoopbackMedium {
    state: Rc<RefCell<MediumState>>,
}

impl LoopbackMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new driver of the given kind
    pub fn driver(&self, kind: PhyKind) -> LoopbackDriver {
        LoopbackDriver {
            kind,
            medium: self.clone(),
        }
    }

    /// Silently drop the next `count` frames sent by anyone
    pub fn drop_next(&self, count: usize) {
        self.state.borrow_mut().drop_next = count;
    }

    /// Frames put on the air, including dropped ones
    pub fn frames_sent(&self) -> usize {
        self.state.borrow().frames_sent
    }

    pub fn frames_dropped(&self) -> usize {
        self.state.borrow().frames_dropped
    }

    /// Endpoints currently open across all attached drivers
    pub fn open_endpoints(&self) -> usize {
        self.state.borrow().endpoints.len()
    }
}

/// Driver attached to a [`LoopbackMedium`]
#[derive(Debug, Clone)]
pub struct LoopbackDriver {
    kind: PhyKind,
    medium: LoopbackMedium,
}

impl LoopbackDriver {
    /// The medium this driver is attached to
    pub fn medium(&self) -> &LoopbackMedium {
        &self.medium
    }
}

impl PhysicalDriver for LoopbackDriver {
    fn kind(&self) -> PhyKind {
        self.kind
    }

    fn probe(&mut self) -> Result<()> {
        Ok(())
    }

    fn open(&mut self, role: SocketRole, local: NodeAddress) -> Result<DriverHandle> {
        let mut state = self.medium.state.borrow_mut();
        match role {
            SocketRole::Server => {
                if state.listeners.contains_key(&local) {
                    return Err(Error::Driver(format!("address {local} already listening")));
                }
                let handle = state.alloc(Endpoint::Listener {
                    address: local,
                    backlog: VecDeque::new(),
                });
                state.listeners.insert(local, handle);
                log::debug!("[loopback] listen {} on {:?}", local, handle);
                Ok(handle)
            }
            SocketRole::Client => Ok(state.alloc(Endpoint::Stream {
                peer: None,
                inbox: VecDeque::new(),
            })),
        }
    }

    fn accept(&mut self, handle: DriverHandle) -> Result<Option<DriverHandle>> {
        let mut state = self.medium.state.borrow_mut();
        match state.endpoints.get_mut(&handle) {
            Some(Endpoint::Listener { backlog, .. }) => Ok(backlog.pop_front()),
            Some(Endpoint::Stream { .. }) => {
                Err(Error::Driver(format!("{handle:?} is not listening")))
            }
            None => Err(Error::Driver(format!("{handle:?} is closed"))),
        }
    }

    fn connect(&mut self, handle: DriverHandle, remote: NodeAddress) -> Result<()> {
        let mut state = self.medium.state.borrow_mut();
        match state.endpoints.get(&handle) {
            Some(Endpoint::Stream { peer: None, .. }) => {}
            _ => return Err(Error::ConnectFailed),
        }
        let listener = *state.listeners.get(&remote).ok_or(Error::ConnectFailed)?;

        let server_side = state.alloc(Endpoint::Stream {
            peer: Some(handle),
            inbox: VecDeque::new(),
        });
        if let Some(Endpoint::Stream { peer, .. }) = state.endpoints.get_mut(&handle) {
            *peer = Some(server_side);
        }
        if let Some(Endpoint::Listener { backlog, .. }) = state.endpoints.get_mut(&listener) {
            backlog.push_back(server_side);
        }
        log::debug!("[loopback] {:?} -> {} paired with {:?}", handle, remote, server_side);
        Ok(())
    }

    fn poll(&mut self, handle: DriverHandle) -> Result<usize> {
        let state = self.medium.state.borrow();
        match state.endpoints.get(&handle) {
            Some(Endpoint::Listener { backlog, .. }) => Ok(backlog.len()),
            Some(Endpoint::Stream { inbox, .. }) => Ok(inbox.len()),
            None => Err(Error::Driver(format!("{handle:?} is closed"))),
        }
    }

    fn send(&mut self, handle: DriverHandle, frame: &[u8]) -> Result<usize> {
        let mut state = self.medium.state.borrow_mut();
        let peer = match state.endpoints.get(&handle) {
            Some(Endpoint::Stream { peer: Some(peer), .. }) => *peer,
            Some(_) => return Err(Error::Driver(format!("{handle:?} has no peer"))),
            None => return Err(Error::Driver(format!("{handle:?} is closed"))),
        };

        state.frames_sent += 1;
        if state.drop_next > 0 {
            state.drop_next -= 1;
            state.frames_dropped += 1;
            log::debug!("[loopback] dropped frame from {:?}", handle);
            return Ok(frame.len());
        }

        match state.endpoints.get_mut(&peer) {
            Some(Endpoint::Stream { inbox, .. }) => {
                inbox.push_back(frame.to_vec());
                Ok(frame.len())
            }
            _ => Err(Error::Driver(format!("peer of {handle:?} is closed"))),
        }
    }

    fn recv(&mut self, handle: DriverHandle, buf: &mut [u8]) -> Result<Option<usize>> {
        let mut state = self.medium.state.borrow_mut();
        let inbox = match state.endpoints.get_mut(&handle) {
            Some(Endpoint::Stream { inbox, .. }) => inbox,
            Some(Endpoint::Listener { .. }) => {
                return Err(Error::Driver(format!("{handle:?} is listening")))
            }
            None => return Err(Error::Driver(format!("{handle:?} is closed"))),
        };

        let Some(frame) = inbox.front() else {
            return Ok(None);
        };
        if frame.len() > buf.len() {
            return Err(Error::BufferTooSmall);
        }
        let len = frame.len();
        buf[..len].copy_from_slice(frame);
        inbox.pop_front();
        Ok(Some(len))
    }

    fn close(&mut self, handle: DriverHandle) {
        let mut state = self.medium.state.borrow_mut();
        match state.endpoints.remove(&handle) {
            Some(Endpoint::Listener { address, backlog }) => {
                state.listeners.remove(&address);
                // Connections never accepted die with the listener
                for pending in backlog {
                    if let Some(Endpoint::Stream { peer: Some(client), .. }) =
                        state.endpoints.remove(&pending)
                    {
                        if let Some(Endpoint::Stream { peer, .. }) = state.endpoints.get_mut(&client)
                        {
                            *peer = None;
                        }
                    }
                }
            }
            Some(Endpoint::Stream { peer: Some(peer_handle), .. }) => {
                if let Some(Endpoint::Stream { peer, .. }) = state.endpoints.get_mut(&peer_handle) {
                    *peer = None;
                }
            }
            Some(Endpoint::Stream { peer: None, .. }) | None => {}
        }
    }
}
