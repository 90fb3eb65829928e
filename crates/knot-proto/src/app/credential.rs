// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Device credentials
//!
//! Opaque beyond their fixed lengths: a 36-byte uuid and a 40-byte token,
//! both printable ASCII.

use core::fmt;

use crate::codec::{ByteReader, ByteWriter};
use crate::error::{Result, ValidationError};

pub const KNOT_PROTOCOL_UUID_LEN: usize = 36;
pub const KNOT_PROTOCOL_TOKEN_LEN: usize = 40;

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    uuid: [u8; KNOT_PROTOCOL_UUID_LEN],
    token: [u8; KNOT_PROTOCOL_TOKEN_LEN],
}

impl Credential {
    /// Wire size
    pub const SIZE: usize = KNOT_PROTOCOL_UUID_LEN + KNOT_PROTOCOL_TOKEN_LEN;

    pub fn new(uuid: &str, token: &str) -> core::result::Result<Self, ValidationError> {
        Self::from_bytes(uuid.as_bytes(), token.as_bytes())
    }

    pub fn from_bytes(uuid: &[u8], token: &[u8]) -> core::result::Result<Self, ValidationError> {
        let uuid: [u8; KNOT_PROTOCOL_UUID_LEN] =
            uuid.try_into().map_err(|_| ValidationError::InvalidCredential)?;
        let token: [u8; KNOT_PROTOCOL_TOKEN_LEN] =
            token.try_into().map_err(|_| ValidationError::InvalidCredential)?;
        if !is_printable(&uuid) || !is_printable(&token) {
            return Err(ValidationError::InvalidCredential);
        }
        Ok(Self { uuid, token })
    }

    pub fn uuid(&self) -> &str {
        // ASCII checked on construction
        core::str::from_utf8(&self.uuid).unwrap_or_default()
    }

    pub fn token(&self) -> &str {
        core::str::from_utf8(&self.token).unwrap_or_default()
    }

    pub(crate) fn write(&self, w: &mut ByteWriter<'_>) -> Result<()> {
        w.put_bytes(&self.uuid)?;
        w.put_bytes(&self.token)
    }

    pub(crate) fn read(r: &mut ByteReader<'_>) -> Result<Self> {
        let uuid = r.bytes(KNOT_PROTOCOL_UUID_LEN)?;
        let token = r.bytes(KNOT_PROTOCOL_TOKEN_LEN)?;
        Ok(Self::from_bytes(uuid, token)?)
    }

    /// Read a credential field that may be all zeros (no credential issued)
    pub(crate) fn read_optional(r: &mut ByteReader<'_>) -> Result<Option<Self>> {
        let uuid = r.bytes(KNOT_PROTOCOL_UUID_LEN)?;
        let token = r.bytes(KNOT_PROTOCOL_TOKEN_LEN)?;
        if uuid.iter().chain(token).all(|&b| b == 0) {
            return Ok(None);
        }
        Ok(Some(Self::from_bytes(uuid, token)?))
    }
}

fn is_printable(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| b.is_ascii_graphic())
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never log the token
        f.debug_struct("Credential")
            .field("uuid", &self.uuid())
            .field("token", &"<redacted>")
            .finish()
    }
}
