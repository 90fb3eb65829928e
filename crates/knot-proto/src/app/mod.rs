// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Application layer
//!
//! Application messages ride inside the payload of an `APPMSG` network
//! message:
//!
//! ```text
//! 0        1        2                     124
//! +--------+--------+---------------------+
//! |  type  |  len   | payload (len <= 122)|
//! +--------+--------+---------------------+
//! ```
//!
//! `len` is always the exact encoded size of the variant and decoding
//! requires the payload to be consumed exactly.

use heapless::{String, Vec};

use crate::codec::{ByteReader, ByteWriter};
use crate::error::{Error, Result, ValidationError};
use crate::net::NET_PAYLOAD_MAX;
use crate::validate;

pub mod credential;
pub mod data;
pub mod result;
pub mod schema;

pub use credential::{Credential, KNOT_PROTOCOL_TOKEN_LEN, KNOT_PROTOCOL_UUID_LEN};
pub use data::{DataPoint, DataValue, KNOT_DATA_RAW_SIZE};
pub use result::ResultCode;
pub use schema::{schema_messages, SchemaAssembler, SchemaEntry, KNOT_PROTOCOL_DATA_NAME_LEN};

/// type + payload_len
pub const APP_HEADER_SIZE: usize = 2;

/// Largest encoded application message
pub const APP_MESSAGE_MAX: usize = NET_PAYLOAD_MAX;

/// Largest application payload
pub const APP_PAYLOAD_MAX: usize = APP_MESSAGE_MAX - APP_HEADER_SIZE;

/// Width of the device name field
pub const KNOT_PROTOCOL_DEVICE_NAME_LEN: usize = 64;

/// Most data points one message can carry (all booleans)
pub const MAX_DATA_POINTS: usize = APP_PAYLOAD_MAX / 4;

/// Data points of one post/set message
pub type DataList = Vec<DataPoint, MAX_DATA_POINTS>;

/// Data ids of one get message
pub type IdList = Vec<u8, APP_PAYLOAD_MAX>;

/// Application message type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AppMessageType {
    RegisterReq = 0x10,
    RegisterResp = 0x11,
    UnregisterReq = 0x12,
    UnregisterResp = 0x13,
    AuthReq = 0x14,
    AuthResp = 0x15,
    PostData = 0x20,
    PostInterval = 0x21,
    PostCommand = 0x22,
    GetData = 0x30,
    SetData = 0x31,
    GetCommand = 0x32,
    SetCommand = 0x33,
    PostSchemaStart = 0x40,
    PostSchema = 0x41,
    PostSchemaEnd = 0x42,
    SchemaResp = 0x43,
    CfgGetInterval = 0x50,
    CfgSetInterval = 0x51,
    CfgGetThreshold = 0x52,
    CfgSetThreshold = 0x53,
}

impl AppMessageType {
    /// Reserved, never valid on the wire
    pub const INVALID: u8 = 0x00;

    pub fn from_u8(v: u8) -> Result<Self> {
        let t = match v {
            0x10 => Self::RegisterReq,
            0x11 => Self::RegisterResp,
            0x12 => Self::UnregisterReq,
            0x13 => Self::UnregisterResp,
            0x14 => Self::AuthReq,
            0x15 => Self::AuthResp,
            0x20 => Self::PostData,
            0x21 => Self::PostInterval,
            0x22 => Self::PostCommand,
            0x30 => Self::GetData,
            0x31 => Self::SetData,
            0x32 => Self::GetCommand,
            0x33 => Self::SetCommand,
            0x40 => Self::PostSchemaStart,
            0x41 => Self::PostSchema,
            0x42 => Self::PostSchemaEnd,
            0x43 => Self::SchemaResp,
            0x50 => Self::CfgGetInterval,
            0x51 => Self::CfgSetInterval,
            0x52 => Self::CfgGetThreshold,
            0x53 => Self::CfgSetThreshold,
            other => return Err(Error::UnknownAppMessage(other)),
        };
        Ok(t)
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Reporting interval of one data source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalConfig {
    pub data_id: u8,
    pub seconds: u32,
}

impl IntervalConfig {
    const SIZE: usize = 5;
}

/// Decoded application message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMessage {
    RegisterReq {
        name: String<KNOT_PROTOCOL_DEVICE_NAME_LEN>,
    },
    /// `credential` is `None` (zero-filled) when registration failed
    RegisterResp {
        result: ResultCode,
        credential: Option<Credential>,
    },
    UnregisterReq,
    UnregisterResp {
        result: ResultCode,
    },
    AuthReq(Credential),
    AuthResp {
        result: ResultCode,
    },
    PostData(DataList),
    PostInterval(IntervalConfig),
    PostCommand(DataList),
    GetData(IdList),
    SetData(DataList),
    GetCommand(IdList),
    SetCommand(DataList),
    SchemaStart(SchemaEntry),
    Schema(SchemaEntry),
    SchemaEnd(SchemaEntry),
    SchemaResp {
        result: ResultCode,
    },
    CfgGetInterval {
        data_id: u8,
    },
    CfgSetInterval(IntervalConfig),
    CfgGetThreshold {
        data_id: u8,
    },
    CfgSetThreshold(DataPoint),
}

impl AppMessage {
    /// Registration request; the name must be 1..=64 bytes without NUL.
    pub fn register(name: &str) -> Result<Self> {
        if name.is_empty() || name.contains('\0') {
            return Err(ValidationError::InvalidDeviceName.into());
        }
        let mut s = String::new();
        s.push_str(name)
            .map_err(|()| Error::Validation(ValidationError::InvalidDeviceName))?;
        Ok(AppMessage::RegisterReq { name: s })
    }

    /// Data list from a slice of points
    pub fn data_list(points: &[DataPoint]) -> Result<DataList> {
        Vec::from_slice(points).map_err(|()| Error::PayloadTooLarge(points.len()))
    }

    pub fn message_type(&self) -> AppMessageType {
        match self {
            AppMessage::RegisterReq { .. } => AppMessageType::RegisterReq,
            AppMessage::RegisterResp { .. } => AppMessageType::RegisterResp,
            AppMessage::UnregisterReq => AppMessageType::UnregisterReq,
            AppMessage::UnregisterResp { .. } => AppMessageType::UnregisterResp,
            AppMessage::AuthReq(_) => AppMessageType::AuthReq,
            AppMessage::AuthResp { .. } => AppMessageType::AuthResp,
            AppMessage::PostData(_) => AppMessageType::PostData,
            AppMessage::PostInterval(_) => AppMessageType::PostInterval,
            AppMessage::PostCommand(_) => AppMessageType::PostCommand,
            AppMessage::GetData(_) => AppMessageType::GetData,
            AppMessage::SetData(_) => AppMessageType::SetData,
            AppMessage::GetCommand(_) => AppMessageType::GetCommand,
            AppMessage::SetCommand(_) => AppMessageType::SetCommand,
            AppMessage::SchemaStart(_) => AppMessageType::PostSchemaStart,
            AppMessage::Schema(_) => AppMessageType::PostSchema,
            AppMessage::SchemaEnd(_) => AppMessageType::PostSchemaEnd,
            AppMessage::SchemaResp { .. } => AppMessageType::SchemaResp,
            AppMessage::CfgGetInterval { .. } => AppMessageType::CfgGetInterval,
            AppMessage::CfgSetInterval(_) => AppMessageType::CfgSetInterval,
            AppMessage::CfgGetThreshold { .. } => AppMessageType::CfgGetThreshold,
            AppMessage::CfgSetThreshold(_) => AppMessageType::CfgSetThreshold,
        }
    }

    /// Result code of a response message
    pub fn result(&self) -> Option<ResultCode> {
        match self {
            AppMessage::RegisterResp { result, .. }
            | AppMessage::UnregisterResp { result }
            | AppMessage::AuthResp { result }
            | AppMessage::SchemaResp { result } => Some(*result),
            _ => None,
        }
    }

    /// Exact encoded payload size
    pub fn payload_len(&self) -> usize {
        match self {
            AppMessage::RegisterReq { .. } => KNOT_PROTOCOL_DEVICE_NAME_LEN,
            AppMessage::RegisterResp { .. } => 1 + Credential::SIZE,
            AppMessage::UnregisterReq => 0,
            AppMessage::AuthReq(_) => Credential::SIZE,
            AppMessage::UnregisterResp { .. }
            | AppMessage::AuthResp { .. }
            | AppMessage::SchemaResp { .. } => 1,
            AppMessage::PostData(points)
            | AppMessage::PostCommand(points)
            | AppMessage::SetData(points)
            | AppMessage::SetCommand(points) => points.iter().map(DataPoint::encoded_len).sum(),
            AppMessage::GetData(ids) | AppMessage::GetCommand(ids) => ids.len(),
            AppMessage::PostInterval(_) | AppMessage::CfgSetInterval(_) => IntervalConfig::SIZE,
            AppMessage::SchemaStart(entry) | AppMessage::Schema(entry) | AppMessage::SchemaEnd(entry) => {
                entry.encoded_len()
            }
            AppMessage::CfgGetInterval { .. } | AppMessage::CfgGetThreshold { .. } => 1,
            AppMessage::CfgSetThreshold(point) => point.encoded_len(),
        }
    }

    /// Encode into `buf`, returning bytes written (header + payload)
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<usize> {
        let payload_len = self.payload_len();
        if payload_len > APP_PAYLOAD_MAX {
            return Err(Error::PayloadTooLarge(payload_len));
        }
        let total = APP_HEADER_SIZE + payload_len;
        if buf.len() < total {
            return Err(Error::BufferTooSmall);
        }

        let mut w = ByteWriter::new(&mut buf[..total]);
        w.put_u8(self.message_type().as_u8())?;
        w.put_u8(payload_len as u8)?;
        self.write_payload(&mut w)?;
        debug_assert_eq!(w.position(), total);
        Ok(w.position())
    }

    /// Encode into an owned frame sized for a network payload
    pub fn encode(&self) -> Result<Vec<u8, APP_MESSAGE_MAX>> {
        let mut buf = [0u8; APP_MESSAGE_MAX];
        let n = self.encode_into(&mut buf)?;
        Vec::from_slice(&buf[..n]).map_err(|()| Error::BufferTooSmall)
    }

    fn write_payload(&self, w: &mut ByteWriter<'_>) -> Result<()> {
        match self {
            AppMessage::RegisterReq { name } => {
                w.put_padded_str(name, KNOT_PROTOCOL_DEVICE_NAME_LEN)?;
            }
            AppMessage::RegisterResp { result, credential } => {
                w.put_u8(result.as_u8())?;
                match credential {
                    Some(cred) => cred.write(w)?,
                    None => w.put_bytes(&[0u8; Credential::SIZE])?,
                }
            }
            AppMessage::UnregisterReq => {}
            AppMessage::AuthReq(cred) => cred.write(w)?,
            AppMessage::UnregisterResp { result }
            | AppMessage::AuthResp { result }
            | AppMessage::SchemaResp { result } => w.put_u8(result.as_u8())?,
            AppMessage::PostData(points)
            | AppMessage::PostCommand(points)
            | AppMessage::SetData(points)
            | AppMessage::SetCommand(points) => {
                if points.is_empty() {
                    return Err(Error::PayloadLengthMismatch);
                }
                for point in points {
                    point.write(w)?;
                }
            }
            AppMessage::GetData(ids) | AppMessage::GetCommand(ids) => {
                if ids.is_empty() {
                    return Err(Error::PayloadLengthMismatch);
                }
                for &id in ids {
                    validate::data_id_is_valid(id)?;
                    w.put_u8(id)?;
                }
            }
            AppMessage::PostInterval(cfg) | AppMessage::CfgSetInterval(cfg) => {
                validate::data_id_is_valid(cfg.data_id)?;
                w.put_u8(cfg.data_id)?;
                w.put_u32(cfg.seconds)?;
            }
            AppMessage::SchemaStart(entry) | AppMessage::Schema(entry) | AppMessage::SchemaEnd(entry) => {
                entry.write(w)?;
            }
            AppMessage::CfgGetInterval { data_id } | AppMessage::CfgGetThreshold { data_id } => {
                validate::data_id_is_valid(*data_id)?;
                w.put_u8(*data_id)?;
            }
            AppMessage::CfgSetThreshold(point) => point.write(w)?,
        }
        Ok(())
    }

    /// Decode one application message.
    ///
    /// Bytes past `APP_HEADER_SIZE + payload_len` are ignored.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < APP_HEADER_SIZE {
            return Err(Error::BufferTooSmall);
        }
        let raw_type = buf[0];
        let payload_len = usize::from(buf[1]);
        if payload_len > APP_PAYLOAD_MAX {
            return Err(Error::PayloadTooLarge(payload_len));
        }
        let msg_type = AppMessageType::from_u8(raw_type)?;
        let payload = buf
            .get(APP_HEADER_SIZE..APP_HEADER_SIZE + payload_len)
            .ok_or(Error::BufferTooSmall)?;

        let mut r = ByteReader::new(payload);
        let msg = Self::read_payload(msg_type, &mut r).map_err(|e| match e {
            // Short payload for the declared type
            Error::BufferTooSmall => Error::PayloadLengthMismatch,
            other => other,
        })?;
        if r.remaining() != 0 {
            return Err(Error::PayloadLengthMismatch);
        }
        Ok(msg)
    }

    fn read_payload(msg_type: AppMessageType, r: &mut ByteReader<'_>) -> Result<Self> {
        let msg = match msg_type {
            AppMessageType::RegisterReq => {
                let name = r.padded_str(KNOT_PROTOCOL_DEVICE_NAME_LEN)?;
                Self::register(name)?
            }
            AppMessageType::RegisterResp => AppMessage::RegisterResp {
                result: ResultCode::from_u8(r.u8()?)?,
                credential: Credential::read_optional(r)?,
            },
            AppMessageType::UnregisterReq => AppMessage::UnregisterReq,
            AppMessageType::UnregisterResp => AppMessage::UnregisterResp {
                result: ResultCode::from_u8(r.u8()?)?,
            },
            AppMessageType::AuthReq => AppMessage::AuthReq(Credential::read(r)?),
            AppMessageType::AuthResp => AppMessage::AuthResp {
                result: ResultCode::from_u8(r.u8()?)?,
            },
            AppMessageType::PostData => AppMessage::PostData(read_points(r)?),
            AppMessageType::PostCommand => AppMessage::PostCommand(read_points(r)?),
            AppMessageType::SetData => AppMessage::SetData(read_points(r)?),
            AppMessageType::SetCommand => AppMessage::SetCommand(read_points(r)?),
            AppMessageType::GetData => AppMessage::GetData(read_ids(r)?),
            AppMessageType::GetCommand => AppMessage::GetCommand(read_ids(r)?),
            AppMessageType::PostInterval => AppMessage::PostInterval(read_interval(r)?),
            AppMessageType::CfgSetInterval => AppMessage::CfgSetInterval(read_interval(r)?),
            AppMessageType::PostSchemaStart => AppMessage::SchemaStart(SchemaEntry::read(r)?),
            AppMessageType::PostSchema => AppMessage::Schema(SchemaEntry::read(r)?),
            AppMessageType::PostSchemaEnd => AppMessage::SchemaEnd(SchemaEntry::read(r)?),
            AppMessageType::SchemaResp => AppMessage::SchemaResp {
                result: ResultCode::from_u8(r.u8()?)?,
            },
            AppMessageType::CfgGetInterval => AppMessage::CfgGetInterval {
                data_id: read_id(r)?,
            },
            AppMessageType::CfgGetThreshold => AppMessage::CfgGetThreshold {
                data_id: read_id(r)?,
            },
            AppMessageType::CfgSetThreshold => AppMessage::CfgSetThreshold(DataPoint::read(r)?),
        };
        Ok(msg)
    }
}

fn read_points(r: &mut ByteReader<'_>) -> Result<DataList> {
    if r.remaining() == 0 {
        return Err(Error::PayloadLengthMismatch);
    }
    let mut points = DataList::new();
    while r.remaining() > 0 {
        let point = DataPoint::read(r)?;
        points
            .push(point)
            .map_err(|_| Error::PayloadTooLarge(MAX_DATA_POINTS + 1))?;
    }
    Ok(points)
}

fn read_ids(r: &mut ByteReader<'_>) -> Result<IdList> {
    if r.remaining() == 0 {
        return Err(Error::PayloadLengthMismatch);
    }
    let mut ids = IdList::new();
    while r.remaining() > 0 {
        ids.push(read_id(r)?)
            .map_err(|_| Error::PayloadTooLarge(APP_PAYLOAD_MAX + 1))?;
    }
    Ok(ids)
}

fn read_id(r: &mut ByteReader<'_>) -> Result<u8> {
    let id = r.u8()?;
    validate::data_id_is_valid(id)?;
    Ok(id)
}

fn read_interval(r: &mut ByteReader<'_>) -> Result<IntervalConfig> {
    Ok(IntervalConfig {
        data_id: read_id(r)?,
        seconds: r.u32()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{type_id, unit, ValueType};

    const UUID: &str = "8e2d5c1a-7b4f-4e3a-9c6d-2f1b0a9e8d7c";
    const TOKEN: &str = "c3f1a9e7d5b3c1f9e7a5d3b1c9f7e5a3d1b9c7e5";

    #[test]
    fn test_post_data_envelope() {
        let points = AppMessage::data_list(&[DataPoint::int(3, 0, 1, 2500).unwrap()]).unwrap();
        let msg = AppMessage::PostData(points);

        let mut buf = [0u8; APP_MESSAGE_MAX];
        let n = msg.encode_into(&mut buf).unwrap();
        assert_eq!(n, 13);
        assert_eq!(&buf[..3], &[0x20, 11, 3]);
        assert_eq!(AppMessage::decode(&buf[..n]).unwrap(), msg);
    }

    #[test]
    fn test_mixed_data_points() {
        let points = AppMessage::data_list(&[
            DataPoint::float(1, unit::TEMPERATURE_C, 1, 23, 500_000).unwrap(),
            DataPoint::bool(2, true).unwrap(),
            DataPoint::raw(3, [7u8; KNOT_DATA_RAW_SIZE]).unwrap(),
        ])
        .unwrap();
        let msg = AppMessage::SetCommand(points);
        assert_eq!(msg.payload_len(), 15 + 4 + 19);
        let bytes = msg.encode().unwrap();
        assert_eq!(AppMessage::decode(&bytes).unwrap(), msg);

        // Raw block cut short
        let mut short = bytes.clone();
        short[1] -= 4;
        let end = short.len() - 4;
        assert_eq!(
            AppMessage::decode(&short[..end]).unwrap_err().result_code(),
            ResultCode::InvalidDataRaw
        );
    }

    #[test]
    fn test_data_list_fills_payload() {
        let points: std::vec::Vec<_> = (0..MAX_DATA_POINTS as u8)
            .map(|id| DataPoint::bool(id, id % 2 == 0).unwrap())
            .collect();
        let msg = AppMessage::PostData(AppMessage::data_list(&points).unwrap());
        assert_eq!(msg.payload_len(), 120);
        assert!(msg.encode().is_ok());

        let ints: std::vec::Vec<_> = (0..12u8)
            .map(|id| DataPoint::int(id, 0, 1, 0).unwrap())
            .collect();
        let too_big = AppMessage::PostData(AppMessage::data_list(&ints).unwrap());
        assert_eq!(too_big.encode(), Err(Error::PayloadTooLarge(132)));
    }

    #[test]
    fn test_exact_consumption() {
        // UNREGISTER_REQ declares a 1-byte payload it does not have
        assert_eq!(
            AppMessage::decode(&[0x12, 1, 0]),
            Err(Error::PayloadLengthMismatch)
        );
        // AUTH_RESP with a missing result byte
        assert_eq!(
            AppMessage::decode(&[0x15, 0]),
            Err(Error::PayloadLengthMismatch)
        );
        // Trailing partial data point
        assert_eq!(
            AppMessage::decode(&[0x20, 6, 1, 0, 3, 1, 2, 0]),
            Err(Error::PayloadLengthMismatch)
        );
    }

    #[test]
    fn test_header_checks() {
        assert_eq!(AppMessage::decode(&[0x20]), Err(Error::BufferTooSmall));
        assert_eq!(
            AppMessage::decode(&[0x00, 0]),
            Err(Error::UnknownAppMessage(0))
        );
        assert_eq!(
            AppMessage::decode(&[0x23, 0]),
            Err(Error::UnknownAppMessage(0x23))
        );
        assert_eq!(
            AppMessage::decode(&[0x20, 123]),
            Err(Error::PayloadTooLarge(123))
        );
        assert_eq!(AppMessage::decode(&[0x20, 4, 1, 0]), Err(Error::BufferTooSmall));
    }

    #[test]
    fn test_register_name() {
        let msg = AppMessage::register("thermostat-kitchen").unwrap();
        let bytes = msg.encode().unwrap();
        assert_eq!(bytes.len(), 2 + KNOT_PROTOCOL_DEVICE_NAME_LEN);
        assert_eq!(AppMessage::decode(&bytes).unwrap(), msg);

        assert_eq!(
            AppMessage::register(""),
            Err(Error::Validation(ValidationError::InvalidDeviceName))
        );
        let mut empty = [0u8; 66];
        empty[0] = 0x10;
        empty[1] = 64;
        assert_eq!(
            AppMessage::decode(&empty).unwrap_err().result_code(),
            ResultCode::RegisterInvalidDeviceName
        );
    }

    #[test]
    fn test_register_response_credential() {
        let cred = Credential::new(UUID, TOKEN).unwrap();
        let ok = AppMessage::RegisterResp {
            result: ResultCode::Success,
            credential: Some(cred.clone()),
        };
        let bytes = ok.encode().unwrap();
        assert_eq!(bytes.len(), 2 + 77);
        assert_eq!(AppMessage::decode(&bytes).unwrap(), ok);

        let failed = AppMessage::RegisterResp {
            result: ResultCode::CloudOffline,
            credential: None,
        };
        let decoded = AppMessage::decode(&failed.encode().unwrap()).unwrap();
        assert_eq!(decoded.result(), Some(ResultCode::CloudOffline));
        assert_eq!(decoded, failed);

        let auth = AppMessage::AuthReq(cred);
        assert_eq!(AppMessage::decode(&auth.encode().unwrap()).unwrap(), auth);
    }

    #[test]
    fn test_get_carries_ids() {
        let ids = IdList::from_slice(&[1, 2, 9]).unwrap();
        let msg = AppMessage::GetData(ids);
        let bytes = msg.encode().unwrap();
        assert_eq!(bytes.as_slice(), &[0x30, 3, 1, 2, 9]);
        assert_eq!(AppMessage::decode(&bytes).unwrap(), msg);

        assert_eq!(
            AppMessage::decode(&[0x32, 2, 1, 0xFF]),
            Err(Error::Validation(ValidationError::InvalidDataId(0xFF)))
        );
        assert_eq!(AppMessage::decode(&[0x30, 0]), Err(Error::PayloadLengthMismatch));
    }

    #[test]
    fn test_config_messages() {
        let set = AppMessage::CfgSetInterval(IntervalConfig {
            data_id: 4,
            seconds: 60,
        });
        let bytes = set.encode().unwrap();
        assert_eq!(bytes.as_slice(), &[0x51, 5, 4, 60, 0, 0, 0]);
        assert_eq!(AppMessage::decode(&bytes).unwrap(), set);

        let get = AppMessage::CfgGetThreshold { data_id: 4 };
        assert_eq!(get.encode().unwrap().as_slice(), &[0x52, 1, 4]);

        let threshold = AppMessage::CfgSetThreshold(DataPoint::int(4, 1, 1, 30).unwrap());
        assert_eq!(
            AppMessage::decode(&threshold.encode().unwrap()).unwrap(),
            threshold
        );
    }

    #[test]
    fn test_schema_message_validated() {
        let entry = SchemaEntry::new(1, ValueType::Bool, 0, "relay")
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(entry, ValidationError::InvalidSchema { .. }));

        let relay = SchemaEntry::new(1, ValueType::Raw, 0, "relay")
            .unwrap()
            .with_type_id(type_id::COMMAND)
            .unwrap();
        let msg = AppMessage::SchemaEnd(relay);
        let mut bytes = msg.encode().unwrap();
        assert_eq!(bytes.len(), 2 + SchemaEntry::SIZE);
        assert_eq!(AppMessage::decode(&bytes).unwrap(), msg);

        // Corrupt value_type to Bool: COMMAND requires Raw
        bytes[3] = ValueType::Bool.as_u8();
        assert_eq!(
            AppMessage::decode(&bytes).unwrap_err().result_code(),
            ResultCode::InvalidSchema
        );
    }

    #[test]
    fn test_schema_name_rejected_as_schema() {
        let msg = AppMessage::SchemaEnd(SchemaEntry::new(2, ValueType::Int, 0, "level").unwrap());
        let mut bytes = msg.encode().unwrap();
        assert_eq!(bytes.len(), 2 + SchemaEntry::BASE_SIZE);

        bytes[5..10].fill(0);
        let err = AppMessage::decode(&bytes).unwrap_err();
        assert_eq!(err, Error::Validation(ValidationError::InvalidDataName));
        assert_eq!(err.result_code(), ResultCode::InvalidSchema);

        bytes[5] = 0xFF;
        assert_eq!(
            AppMessage::decode(&bytes).unwrap_err().result_code(),
            ResultCode::InvalidSchema
        );
    }

    #[test]
    fn test_response_results() {
        let resp = AppMessage::SchemaResp {
            result: ResultCode::SchemaEmpty,
        };
        assert_eq!(resp.encode().unwrap().as_slice(), &[0x43, 1, 0x0E]);
        assert_eq!(
            AppMessage::decode(&[0x15, 1, 0x42]),
            Err(Error::UnknownResultCode(0x42))
        );
        assert_eq!(AppMessage::UnregisterReq.result(), None);
    }
}
