// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for the KNoT protocol engine

use thiserror::Error;

use crate::app::ResultCode;
use crate::driver::PhyKind;

/// Result type for KNoT operations
pub type Result<T> = core::result::Result<T, Error>;

/// Rejections produced by the validation library.
///
/// Each variant names the field that failed so callers can answer with a
/// precise protocol result code instead of a generic failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// `value_type` byte outside `VALUE_TYPE_MIN..=VALUE_TYPE_MAX`.
    #[error("value type out of range: 0x{0:02x}")]
    ValueTypeOutOfRange(u8),

    /// The (type_id, value_type, unit) triple is not a legal pairing.
    #[error("invalid schema: type_id=0x{type_id:04x} value_type={value_type} unit={unit}")]
    InvalidSchema {
        /// Sensor kind
        type_id: u16,
        /// Declared value type
        value_type: u8,
        /// Declared unit
        unit: u8,
    },

    /// Data id 0xFF is reserved for "not applicable".
    #[error("data id 0x{0:02x} is reserved")]
    InvalidDataId(u8),

    /// Boolean payload byte other than 0 or 1.
    #[error("boolean value must be 0 or 1, got {0}")]
    InvalidBool(u8),

    /// Float decimal part outside the fractional range.
    #[error("float decimal part {0} is not a fraction")]
    InvalidDecimal(u32),

    /// Raw value block shorter than `KNOT_DATA_RAW_SIZE`.
    #[error("raw value truncated to {0} bytes")]
    InvalidRawData(usize),

    /// Empty, oversized or non UTF-8 device name.
    #[error("invalid device name")]
    InvalidDeviceName,

    /// Empty, oversized or non UTF-8 data source name in a schema entry.
    #[error("invalid data source name")]
    InvalidDataName,

    /// Credential field with the wrong length or encoding.
    #[error("invalid credential")]
    InvalidCredential,

    /// Address outside the range allowed for the operation.
    #[error("invalid node address: 0x{0:02x}")]
    InvalidAddress(u8),

    /// Protocol major version differs from ours.
    #[error("incompatible protocol version {major}.{minor}")]
    IncompatibleVersion {
        /// Peer major version
        major: u8,
        /// Peer minor version
        minor: u8,
    },
}

/// Error type for KNoT operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Buffer too small for operation
    #[error("buffer too small")]
    BufferTooSmall,

    /// Declared payload length exceeds the envelope capacity
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),

    /// Payload length does not match the size required by the message type
    #[error("payload length mismatch")]
    PayloadLengthMismatch,

    /// Unknown or reserved network message type
    #[error("unknown network message type: 0x{0:02x}")]
    UnknownNetMessage(u8),

    /// Unknown or reserved application message type
    #[error("unknown application message type: 0x{0:02x}")]
    UnknownAppMessage(u8),

    /// Unknown result code byte
    #[error("unknown result code: 0x{0:02x}")]
    UnknownResultCode(u8),

    /// Unknown join status byte
    #[error("unknown join status: 0x{0:02x}")]
    UnknownJoinStatus(u8),

    /// Rejected by the validation library
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Every socket slot is in use
    #[error("no free socket slot")]
    NoFreeSlot,

    /// Socket role not supported by the active driver
    #[error("unsupported socket role: {0}")]
    UnsupportedRole(u8),

    /// Operation requires a server socket
    #[error("socket {0} is not a server")]
    NotAServer(u8),

    /// Server socket has no pending connection
    #[error("no pending connection")]
    NoPendingConnection,

    /// Operation requires a client socket
    #[error("socket {0} is not a client")]
    NotAClient(u8),

    /// Client socket is already connected
    #[error("socket {0} is already connected")]
    AlreadyConnected(u8),

    /// Socket is bound but not connected to a peer
    #[error("socket {0} is not connected")]
    NotConnected(u8),

    /// Driver refused the connection
    #[error("connect failed")]
    ConnectFailed,

    /// Socket id does not name an allocated slot
    #[error("bad socket: {0}")]
    BadSocket(u8),

    /// Driver probe failed during initialization
    #[error("driver probe failed: {0:?}")]
    ProbeFailed(PhyKind),

    /// Driver does not match the configured physical layer
    #[error("driver mismatch: configured {expected:?}, got {actual:?}")]
    DriverMismatch {
        /// Configured physical layer
        expected: PhyKind,
        /// Physical layer of the supplied driver
        actual: PhyKind,
    },

    /// Low-level driver failure
    #[error("driver error: {0}")]
    Driver(String),

    /// No acknowledgement after exhausting the retry budget
    #[error("transport timeout")]
    Timeout,

    /// A reliable send is already in flight on this socket
    #[error("transmission pending on socket {0}")]
    TransmitPending(u8),

    /// Application traffic before a successful join
    #[error("socket {0} has not joined")]
    NotJoined(u8),

    /// Operation not available for this node role
    #[error("operation requires a {0} node")]
    WrongNodeRole(&'static str),

    /// Schema transfer with no entries
    #[error("schema is empty")]
    SchemaEmpty,

    /// Schema continuation without a start, or duplicate entries
    #[error("invalid schema sequence")]
    SchemaSequence,

    /// Invalid configuration
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Protocol result code used to report this error to a peer.
    pub fn result_code(&self) -> ResultCode {
        match self {
            Error::Validation(v) => match v {
                ValidationError::ValueTypeOutOfRange(_)
                | ValidationError::InvalidBool(_)
                | ValidationError::InvalidDecimal(_)
                | ValidationError::InvalidDataId(_) => ResultCode::InvalidData,
                ValidationError::InvalidRawData(_) => ResultCode::InvalidDataRaw,
                ValidationError::InvalidSchema { .. } | ValidationError::InvalidDataName => {
                    ResultCode::InvalidSchema
                }
                ValidationError::InvalidDeviceName => ResultCode::RegisterInvalidDeviceName,
                ValidationError::InvalidCredential => ResultCode::InvalidCredential,
                ValidationError::InvalidAddress(_) | ValidationError::IncompatibleVersion { .. } => {
                    ResultCode::InvalidDevice
                }
            },
            Error::BufferTooSmall
            | Error::PayloadTooLarge(_)
            | Error::PayloadLengthMismatch
            | Error::UnknownAppMessage(_)
            | Error::UnknownNetMessage(_)
            | Error::UnknownResultCode(_)
            | Error::UnknownJoinStatus(_) => ResultCode::InvalidData,
            Error::SchemaEmpty => ResultCode::SchemaEmpty,
            Error::SchemaSequence => ResultCode::InvalidSchema,
            Error::NotJoined(_) => ResultCode::InvalidDevice,
            Error::Timeout
            | Error::Driver(_)
            | Error::ConnectFailed
            | Error::NoFreeSlot
            | Error::NoPendingConnection
            | Error::ProbeFailed(_)
            | Error::TransmitPending(_) => ResultCode::GatewayFailure,
            _ => ResultCode::Unknown,
        }
    }

    /// True for transport failures that a caller may retry.
    ///
    /// Validation failures never are; resource exhaustion is left to the
    /// caller's judgement and reported as not retryable here.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Timeout | Error::Driver(_) | Error::ConnectFailed | Error::TransmitPending(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_map_to_specific_codes() {
        let e: Error = ValidationError::ValueTypeOutOfRange(9).into();
        assert_eq!(e.result_code(), ResultCode::InvalidData);

        let e: Error = ValidationError::InvalidSchema {
            type_id: 5,
            value_type: 3,
            unit: 1,
        }
        .into();
        assert_eq!(e.result_code(), ResultCode::InvalidSchema);
        assert!(!e.is_retryable());
    }

    #[test]
    fn test_name_errors_map_to_their_layer() {
        let e: Error = ValidationError::InvalidDeviceName.into();
        assert_eq!(e.result_code(), ResultCode::RegisterInvalidDeviceName);
        let e: Error = ValidationError::InvalidDataName.into();
        assert_eq!(e.result_code(), ResultCode::InvalidSchema);
        let e: Error = ValidationError::InvalidRawData(4).into();
        assert_eq!(e.result_code(), ResultCode::InvalidDataRaw);
    }

    #[test]
    fn test_timeout_is_gateway_failure() {
        assert_eq!(Error::Timeout.result_code(), ResultCode::GatewayFailure);
        assert!(Error::Timeout.is_retryable());
        assert!(!Error::NoFreeSlot.is_retryable());
    }

    #[test]
    fn test_display_names_field() {
        let e: Error = ValidationError::ValueTypeOutOfRange(0x07).into();
        assert_eq!(e.to_string(), "value type out of range: 0x07");
    }
}
