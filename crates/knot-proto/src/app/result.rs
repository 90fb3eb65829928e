// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Protocol result codes (one byte on the wire)

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResultCode {
    Success = 0x00,
    Unknown = 0x01,
    InvalidDevice = 0x02,
    InvalidData = 0x03,
    InvalidDataRaw = 0x04,
    DeviceNotFound = 0x05,
    GatewayFailure = 0x06,
    CloudFailure = 0x07,
    CloudOffline = 0x08,
    InvalidUuid = 0x09,
    CloudInvalidUuid = 0x0A,
    RegisterInvalidDeviceName = 0x0B,
    InvalidSchema = 0x0C,
    SchemaNotFound = 0x0D,
    SchemaEmpty = 0x0E,
    InvalidCredential = 0x0F,
    CredentialUnauthorized = 0x10,
}

impl ResultCode {
    pub fn from_u8(v: u8) -> Result<Self> {
        let code = match v {
            0x00 => Self::Success,
            0x01 => Self::Unknown,
            0x02 => Self::InvalidDevice,
            0x03 => Self::InvalidData,
            0x04 => Self::InvalidDataRaw,
            0x05 => Self::DeviceNotFound,
            0x06 => Self::GatewayFailure,
            0x07 => Self::CloudFailure,
            0x08 => Self::CloudOffline,
            0x09 => Self::InvalidUuid,
            0x0A => Self::CloudInvalidUuid,
            0x0B => Self::RegisterInvalidDeviceName,
            0x0C => Self::InvalidSchema,
            0x0D => Self::SchemaNotFound,
            0x0E => Self::SchemaEmpty,
            0x0F => Self::InvalidCredential,
            0x10 => Self::CredentialUnauthorized,
            other => return Err(Error::UnknownResultCode(other)),
        };
        Ok(code)
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_contiguous() {
        for v in 0x00..=0x10u8 {
            assert_eq!(ResultCode::from_u8(v).unwrap().as_u8(), v);
        }
        assert_eq!(ResultCode::from_u8(0x11), Err(Error::UnknownResultCode(0x11)));
        assert!(ResultCode::Success.is_success());
        assert!(!ResultCode::CloudOffline.is_success());
    }
}
