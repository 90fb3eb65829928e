// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Network message envelope
//!
//! ```text
//! 0        1        2        3        4                         128
//! +--------+--------+--------+--------+-------------------------+
//! |  type  |   to   |  from  |  len   |  payload (len <= 124)   |
//! +--------+--------+--------+--------+-------------------------+
//! ```
//!
//! Encoding always produces 128 bytes with the unused payload tail zeroed.
//! Decoding validates the discriminant first, then the exact payload size
//! the type requires, and only then builds the typed body.

use heapless::Vec;

use super::join::{JoinRequest, JoinResult, JoinStatus};
use super::{NodeAddress, NET_HEADER_SIZE, NET_MESSAGE_SIZE, NET_PAYLOAD_MAX};
use crate::codec::{ByteReader, ByteWriter};
use crate::error::{Error, Result};

/// Network message type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NetMessageType {
    JoinLocal = 0x01,
    UnjoinLocal = 0x02,
    JoinGateway = 0x03,
    JoinResult = 0x04,
    SetAddress = 0x05,
    AppMsg = 0x06,
    Ack = 0x07,
}

impl NetMessageType {
    /// Reserved, never valid on the wire
    pub const INVALID: u8 = 0x00;

    pub fn from_u8(v: u8) -> Result<Self> {
        match v {
            0x01 => Ok(Self::JoinLocal),
            0x02 => Ok(Self::UnjoinLocal),
            0x03 => Ok(Self::JoinGateway),
            0x04 => Ok(Self::JoinResult),
            0x05 => Ok(Self::SetAddress),
            0x06 => Ok(Self::AppMsg),
            0x07 => Ok(Self::Ack),
            other => Err(Error::UnknownNetMessage(other)),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Payload size required by the type, `None` if variable
    pub const fn fixed_payload_len(self) -> Option<usize> {
        match self {
            Self::JoinLocal | Self::JoinGateway => Some(JoinRequest::SIZE),
            Self::UnjoinLocal => Some(0),
            Self::JoinResult => Some(JoinResult::SIZE),
            Self::SetAddress | Self::Ack => Some(1),
            Self::AppMsg => None,
        }
    }
}

/// Typed network payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetBody {
    JoinLocal(JoinRequest),
    UnjoinLocal,
    JoinGateway(JoinRequest),
    JoinResult(JoinResult),
    SetAddress(NodeAddress),
    /// Encoded application message
    App(Vec<u8, NET_PAYLOAD_MAX>),
    /// Acknowledges the last message of the given type
    Ack(NetMessageType),
}

impl NetBody {
    pub fn message_type(&self) -> NetMessageType {
        match self {
            NetBody::JoinLocal(_) => NetMessageType::JoinLocal,
            NetBody::UnjoinLocal => NetMessageType::UnjoinLocal,
            NetBody::JoinGateway(_) => NetMessageType::JoinGateway,
            NetBody::JoinResult(_) => NetMessageType::JoinResult,
            NetBody::SetAddress(_) => NetMessageType::SetAddress,
            NetBody::App(_) => NetMessageType::AppMsg,
            NetBody::Ack(_) => NetMessageType::Ack,
        }
    }

    /// Wrap an encoded application frame
    pub fn app(bytes: &[u8]) -> Result<Self> {
        Vec::from_slice(bytes)
            .map(NetBody::App)
            .map_err(|()| Error::PayloadTooLarge(bytes.len()))
    }

    fn payload_len(&self) -> usize {
        match self {
            NetBody::App(bytes) => bytes.len(),
            other => other.message_type().fixed_payload_len().unwrap_or(0),
        }
    }
}

/// Decoded network message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetMessage {
    pub to: NodeAddress,
    pub from: NodeAddress,
    pub body: NetBody,
}

impl NetMessage {
    pub fn new(to: NodeAddress, from: NodeAddress, body: NetBody) -> Self {
        Self { to, from, body }
    }

    pub fn message_type(&self) -> NetMessageType {
        self.body.message_type()
    }

    pub fn is_broadcast(&self) -> bool {
        self.to.is_broadcast()
    }

    /// Whether the receiver answers this message with an ACK.
    ///
    /// Join requests are answered by JOIN_RESULT, which is itself never
    /// acknowledged; if it is lost the request is retransmitted.
    pub fn needs_ack(&self) -> bool {
        !self.is_broadcast()
            && !matches!(
                self.message_type(),
                NetMessageType::Ack
                    | NetMessageType::JoinLocal
                    | NetMessageType::JoinGateway
                    | NetMessageType::JoinResult
            )
    }

    /// Whether the sender keeps the message for retransmission
    pub fn is_reliable(&self) -> bool {
        !self.is_broadcast()
            && !matches!(
                self.message_type(),
                NetMessageType::Ack | NetMessageType::JoinResult
            )
    }

    /// Encode into a full 128-byte frame
    pub fn encode(&self) -> Result<[u8; NET_MESSAGE_SIZE]> {
        let mut frame = [0u8; NET_MESSAGE_SIZE];
        self.encode_into(&mut frame)?;
        Ok(frame)
    }

    /// Encode into `buf`, which must hold the full 128 bytes.
    ///
    /// Returns the number of bytes written (always `NET_MESSAGE_SIZE`).
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < NET_MESSAGE_SIZE {
            return Err(Error::BufferTooSmall);
        }
        let payload_len = self.body.payload_len();
        if payload_len > NET_PAYLOAD_MAX {
            return Err(Error::PayloadTooLarge(payload_len));
        }

        let frame = &mut buf[..NET_MESSAGE_SIZE];
        frame.fill(0);
        let mut w = ByteWriter::new(frame);
        w.put_u8(self.message_type().as_u8())?;
        w.put_u8(self.to.0)?;
        w.put_u8(self.from.0)?;
        w.put_u8(payload_len as u8)?;

        match &self.body {
            NetBody::JoinLocal(req) | NetBody::JoinGateway(req) => {
                w.put_u8(req.major)?;
                w.put_u8(req.minor)?;
                w.put_u8(req.result)?;
            }
            NetBody::UnjoinLocal => {}
            NetBody::JoinResult(res) => {
                w.put_u8(res.major)?;
                w.put_u8(res.minor)?;
                w.put_u8(res.status.as_u8())?;
                w.put_u8(res.address.0)?;
            }
            NetBody::SetAddress(addr) => w.put_u8(addr.0)?,
            NetBody::App(bytes) => w.put_bytes(bytes)?,
            NetBody::Ack(acked) => w.put_u8(acked.as_u8())?,
        }

        Ok(NET_MESSAGE_SIZE)
    }

    /// Decode a frame.
    ///
    /// Bytes past `NET_HEADER_SIZE + payload_len` are ignored, so both full
    /// 128-byte frames and trimmed frames are accepted.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < NET_HEADER_SIZE {
            return Err(Error::BufferTooSmall);
        }
        let mut r = ByteReader::new(buf);
        let raw_type = r.u8()?;
        let to = NodeAddress(r.u8()?);
        let from = NodeAddress(r.u8()?);
        let payload_len = usize::from(r.u8()?);

        if payload_len > NET_PAYLOAD_MAX {
            return Err(Error::PayloadTooLarge(payload_len));
        }
        let msg_type = NetMessageType::from_u8(raw_type)?;
        if let Some(expected) = msg_type.fixed_payload_len() {
            if payload_len != expected {
                return Err(Error::PayloadLengthMismatch);
            }
        }

        let payload = r.bytes(payload_len)?;
        let mut p = ByteReader::new(payload);
        let body = match msg_type {
            NetMessageType::JoinLocal => NetBody::JoinLocal(read_join_request(&mut p)?),
            NetMessageType::JoinGateway => NetBody::JoinGateway(read_join_request(&mut p)?),
            NetMessageType::UnjoinLocal => NetBody::UnjoinLocal,
            NetMessageType::JoinResult => NetBody::JoinResult(JoinResult {
                major: p.u8()?,
                minor: p.u8()?,
                status: JoinStatus::from_u8(p.u8()?)?,
                address: NodeAddress(p.u8()?),
            }),
            NetMessageType::SetAddress => NetBody::SetAddress(NodeAddress(p.u8()?)),
            NetMessageType::AppMsg => NetBody::app(payload)?,
            NetMessageType::Ack => NetBody::Ack(NetMessageType::from_u8(p.u8()?)?),
        };

        Ok(Self { to, from, body })
    }
}

fn read_join_request(r: &mut ByteReader<'_>) -> Result<JoinRequest> {
    Ok(JoinRequest {
        major: r.u8()?,
        minor: r.u8()?,
        result: r.u8()?,
    })
}
