// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Stop-and-wait retransmission
//!
//! At most one reliable message is outstanding per socket. It is resent
//! every `KNOT_NET_TIMEOUT_MS` until acknowledged; after
//! `KNOT_NET_RETRIES` retransmissions the next timeout abandons it. Time
//! only advances through the `now_ms` values the caller passes in.
//!
//! Frames carry no sequence number and an ACK names only the message type
//! it answers. A late ACK for an earlier frame therefore retires a newer
//! outstanding frame of the same type, and the newer frame may never reach
//! the peer. Delivery is at-least-once only for the frame an ACK was
//! actually sent for.

use super::message::NetMessageType;
use super::{KNOT_NET_RETRIES, KNOT_NET_TIMEOUT_MS, NET_MESSAGE_SIZE};

/// A frame awaiting acknowledgement
#[derive(Debug, Clone)]
struct Pending {
    frame: [u8; NET_MESSAGE_SIZE],
    msg_type: NetMessageType,
    sent_at_ms: u64,
    retransmissions: u32,
}

/// What the caller must do after [`RetryState::poll`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryAction {
    /// Nothing outstanding
    Idle,
    /// Outstanding, timer not expired
    Wait,
    /// Put this frame on the link again
    Retransmit([u8; NET_MESSAGE_SIZE]),
    /// Retry budget exhausted; the message of this type was abandoned
    Expired(NetMessageType),
}

/// Per-socket retransmission state
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    pending: Option<Pending>,
}

impl RetryState {
    pub const fn new() -> Self {
        Self { pending: None }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Type of the outstanding message, if any
    pub fn pending_type(&self) -> Option<NetMessageType> {
        self.pending.as_ref().map(|p| p.msg_type)
    }

    /// Retransmissions done so far for the outstanding message
    pub fn retransmissions(&self) -> u32 {
        self.pending.as_ref().map_or(0, |p| p.retransmissions)
    }

    /// Track `frame` as sent at `now_ms`.
    ///
    /// Returns false, leaving the current message untouched, if one is
    /// already outstanding.
    pub fn begin(
        &mut self,
        frame: [u8; NET_MESSAGE_SIZE],
        msg_type: NetMessageType,
        now_ms: u64,
    ) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(Pending {
            frame,
            msg_type,
            sent_at_ms: now_ms,
            retransmissions: 0,
        });
        true
    }

    /// Clear the outstanding message if an ACK for `acked` resolves it.
    ///
    /// Matching is by type alone; see the module docs.
    pub fn acknowledge(&mut self, acked: NetMessageType) -> bool {
        if self.pending_type() == Some(acked) {
            self.pending = None;
            return true;
        }
        false
    }

    /// Clear an outstanding join request answered by JOIN_RESULT.
    pub fn resolve_join(&mut self) -> bool {
        match self.pending_type() {
            Some(NetMessageType::JoinLocal | NetMessageType::JoinGateway) => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Advance the timer to `now_ms`.
    pub fn poll(&mut self, now_ms: u64) -> RetryAction {
        let Some(pending) = self.pending.as_mut() else {
            return RetryAction::Idle;
        };

        if now_ms.saturating_sub(pending.sent_at_ms) < KNOT_NET_TIMEOUT_MS {
            return RetryAction::Wait;
        }

        if pending.retransmissions < KNOT_NET_RETRIES {
            pending.retransmissions += 1;
            pending.sent_at_ms = now_ms;
            return RetryAction::Retransmit(pending.frame);
        }

        let msg_type = pending.msg_type;
        self.pending = None;
        RetryAction::Expired(msg_type)
    }
}
