// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema entries and schema transfer
//!
//! A device describes each of its data sources with a [`SchemaEntry`]:
//!
//! ```text
//! data_id(1) | value_type(1) | unit(1) | name(64, null-padded) [| type_id(2)]
//! ```
//!
//! The `type_id` trailer is present only for typed entries; a generic
//! (`type_id::NONE`) entry is the bare 67-byte form.
//!
//! The schema is sent one entry per message. A multi-entry schema is framed
//! as `POST_SCHEMA_START`, any number of `POST_SCHEMA`, then
//! `POST_SCHEMA_END` carrying the last entry; a single-entry schema is just
//! `POST_SCHEMA_END`.

use heapless::{String, Vec};

use super::{AppMessage, AppMessageType};
use crate::codec::{ByteReader, ByteWriter};
use crate::error::{Error, Result, ValidationError};
use crate::types::{type_id, ValueType};
use crate::validate;

/// Width of the data source name field
pub const KNOT_PROTOCOL_DATA_NAME_LEN: usize = 64;

/// Most entries one schema transfer may carry
pub const SCHEMA_MAX_ENTRIES: usize = 32;

/// Declaration of one data source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEntry {
    pub data_id: u8,
    pub value_type: ValueType,
    pub unit: u8,
    pub type_id: u16,
    pub name: String<KNOT_PROTOCOL_DATA_NAME_LEN>,
}

impl SchemaEntry {
    /// Wire size of a generic entry
    pub const BASE_SIZE: usize = 3 + KNOT_PROTOCOL_DATA_NAME_LEN;

    /// Wire size of a typed entry
    pub const SIZE: usize = Self::BASE_SIZE + 2;

    /// Generic entry (`type_id::NONE`); use [`with_type_id`](Self::with_type_id)
    /// to declare a physical quantity or a logic type.
    pub fn new(
        data_id: u8,
        value_type: ValueType,
        unit: u8,
        name: &str,
    ) -> core::result::Result<Self, ValidationError> {
        Self::typed(data_id, type_id::NONE, value_type, unit, name)
    }

    /// Entry of sensor type `type_id`; the value type and unit must suit it.
    pub fn typed(
        data_id: u8,
        type_id: u16,
        value_type: ValueType,
        unit: u8,
        name: &str,
    ) -> core::result::Result<Self, ValidationError> {
        validate::data_id_is_valid(data_id)?;
        let name = checked_name(name)?;
        let entry = Self {
            data_id,
            value_type,
            unit,
            type_id,
            name,
        };
        entry.validate()?;
        Ok(entry)
    }

    pub fn with_type_id(mut self, id: u16) -> core::result::Result<Self, ValidationError> {
        self.type_id = id;
        self.validate()?;
        Ok(self)
    }

    pub const fn is_typed(&self) -> bool {
        self.type_id != type_id::NONE
    }

    /// Encoded size, with the `type_id` trailer only when typed
    pub const fn encoded_len(&self) -> usize {
        if self.is_typed() {
            Self::SIZE
        } else {
            Self::BASE_SIZE
        }
    }

    /// Re-run every check applied on construction and decode
    pub fn validate(&self) -> core::result::Result<(), ValidationError> {
        validate::data_id_is_valid(self.data_id)?;
        validate::schema_is_valid(self.type_id, self.value_type.as_u8(), self.unit)
    }

    pub(crate) fn write(&self, w: &mut ByteWriter<'_>) -> Result<()> {
        self.validate()?;
        w.put_u8(self.data_id)?;
        w.put_u8(self.value_type.as_u8())?;
        w.put_u8(self.unit)?;
        w.put_padded_str(&self.name, KNOT_PROTOCOL_DATA_NAME_LEN)?;
        if self.is_typed() {
            w.put_u16(self.type_id)?;
        }
        Ok(())
    }

    /// Decode one entry filling the rest of the reader.
    pub(crate) fn read(r: &mut ByteReader<'_>) -> Result<Self> {
        let data_id = r.u8()?;
        let raw_value_type = r.u8()?;
        let unit = r.u8()?;
        let name = r.bytes(KNOT_PROTOCOL_DATA_NAME_LEN)?;
        let type_id = match r.remaining() {
            0 => type_id::NONE,
            _ => r.u16()?,
        };

        // Nothing past value_type is interpreted until it checks out
        let value_type = validate::value_type_is_valid(raw_value_type)?;
        validate::data_id_is_valid(data_id)?;
        validate::schema_is_valid(type_id, raw_value_type, unit)?;

        let end = name.iter().position(|&b| b == 0).unwrap_or(name.len());
        let name = core::str::from_utf8(&name[..end]).map_err(|_| ValidationError::InvalidDataName)?;
        Ok(Self {
            data_id,
            value_type,
            unit,
            type_id,
            name: checked_name(name)?,
        })
    }
}

fn checked_name(name: &str) -> core::result::Result<String<KNOT_PROTOCOL_DATA_NAME_LEN>, ValidationError> {
    if name.is_empty() || name.contains('\0') {
        return Err(ValidationError::InvalidDataName);
    }
    let mut out = String::new();
    out.push_str(name)
        .map_err(|()| ValidationError::InvalidDataName)?;
    Ok(out)
}

/// Split `entries` into the schema message sequence.
pub fn schema_messages(entries: &[SchemaEntry]) -> Result<std::vec::Vec<AppMessage>> {
    if entries.is_empty() {
        return Err(Error::SchemaEmpty);
    }
    if entries.len() > SCHEMA_MAX_ENTRIES {
        return Err(Error::PayloadTooLarge(entries.len()));
    }
    for entry in entries {
        entry.validate()?;
    }

    let len = entries.len();
    log::debug!("[schema] splitting {} entries", len);
    let messages = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let entry = entry.clone();
            match schema_message_type(i, len) {
                AppMessageType::PostSchemaStart => AppMessage::SchemaStart(entry),
                AppMessageType::PostSchema => AppMessage::Schema(entry),
                _ => AppMessage::SchemaEnd(entry),
            }
        })
        .collect();
    Ok(messages)
}

/// Receiving side of a schema transfer
///
/// Feed every schema message in arrival order; the finished schema is
/// returned when `POST_SCHEMA_END` arrives. A sequence error resets the
/// assembler.
#[derive(Debug, Default)]
pub struct SchemaAssembler {
    entries: Vec<SchemaEntry, SCHEMA_MAX_ENTRIES>,
    in_progress: bool,
}

impl SchemaAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a START has been seen without its END
    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    /// Entries collected so far in the current transfer
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.in_progress = false;
    }

    /// Process one message.
    ///
    /// Returns `Ok(Some(schema))` on END, `Ok(None)` while the transfer is
    /// open. Non-schema messages are rejected with `UnknownAppMessage`.
    pub fn push(&mut self, msg: &AppMessage) -> Result<Option<Vec<SchemaEntry, SCHEMA_MAX_ENTRIES>>> {
        match msg {
            AppMessage::SchemaStart(entry) => {
                if self.in_progress {
                    log::debug!("[schema] restart discards {} entries", self.entries.len());
                }
                self.reset();
                self.in_progress = true;
                self.add(entry)?;
                Ok(None)
            }
            AppMessage::Schema(entry) => {
                if !self.in_progress {
                    return Err(Error::SchemaSequence);
                }
                self.add(entry)?;
                Ok(None)
            }
            AppMessage::SchemaEnd(entry) => {
                if !self.in_progress {
                    // Single-entry schema
                    self.reset();
                }
                self.add(entry)?;
                let schema = core::mem::take(&mut self.entries);
                self.in_progress = false;
                Ok(Some(schema))
            }
            other => Err(Error::UnknownAppMessage(other.message_type().as_u8())),
        }
    }

    fn add(&mut self, entry: &SchemaEntry) -> Result<()> {
        let outcome = if let Err(e) = entry.validate() {
            Err(Error::from(e))
        } else if self.entries.iter().any(|e| e.data_id == entry.data_id) {
            log::warn!("[schema] duplicate data id {}", entry.data_id);
            Err(Error::SchemaSequence)
        } else {
            self.entries
                .push(entry.clone())
                .map_err(|_| Error::PayloadTooLarge(SCHEMA_MAX_ENTRIES + 1))
        };
        if outcome.is_err() {
            self.reset();
        }
        outcome
    }
}

/// Schema message type for position `index` of a transfer of `len` entries
fn schema_message_type(index: usize, len: usize) -> AppMessageType {
    if index + 1 == len {
        AppMessageType::PostSchemaEnd
    } else if index == 0 {
        AppMessageType::PostSchemaStart
    } else {
        AppMessageType::PostSchema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::unit;

    fn entry(id: u8, name: &str) -> SchemaEntry {
        SchemaEntry::new(id, ValueType::Int, unit::NOT_APPLICABLE, name).unwrap()
    }

    #[test]
    fn test_temperature_entry_layout() {
        let e = SchemaEntry::new(3, ValueType::Int, 0, "temperature").unwrap();
        let mut buf = [0xAAu8; SchemaEntry::SIZE];
        let mut w = ByteWriter::new(&mut buf);
        e.write(&mut w).unwrap();
        assert_eq!(w.position(), 67);
        assert_eq!(e.encoded_len(), SchemaEntry::BASE_SIZE);

        assert_eq!(&buf[..3], &[3, 1, 0]);
        assert_eq!(&buf[3..14], b"temperature");
        assert!(buf[14..67].iter().all(|&b| b == 0));
        assert_eq!(&buf[67..], &[0xAA, 0xAA]);

        let decoded = SchemaEntry::read(&mut ByteReader::new(&buf[..67])).unwrap();
        assert_eq!(decoded, e);
        assert_eq!(decoded.name.as_str(), "temperature");
    }

    #[test]
    fn test_typed_entry_carries_type_id() {
        let e = SchemaEntry::typed(5, type_id::SWITCH, ValueType::Bool, 0, "relay").unwrap();
        let mut buf = [0u8; SchemaEntry::SIZE];
        let mut w = ByteWriter::new(&mut buf);
        e.write(&mut w).unwrap();
        assert_eq!(w.position(), SchemaEntry::SIZE);
        assert_eq!(&buf[67..], &type_id::SWITCH.to_le_bytes());

        assert_eq!(SchemaEntry::read(&mut ByteReader::new(&buf)).unwrap(), e);
        // Without the trailer the entry reads as generic, which Bool is not
        assert!(SchemaEntry::read(&mut ByteReader::new(&buf[..67])).is_err());
    }

    #[test]
    fn test_entry_validation() {
        assert_eq!(
            SchemaEntry::new(1, ValueType::Bool, 0, "switch"),
            Err(ValidationError::InvalidSchema {
                type_id: type_id::NONE,
                value_type: 3,
                unit: 0
            })
        );
        let sw = SchemaEntry::new(1, ValueType::Int, 0, "switch")
            .unwrap()
            .with_type_id(type_id::SWITCH);
        assert!(sw.is_err());

        let temp = SchemaEntry::new(2, ValueType::Float, unit::TEMPERATURE_C, "t");
        assert!(temp.is_err());
        let temp = SchemaEntry {
            type_id: type_id::TEMPERATURE,
            ..entry(2, "t")
        };
        assert!(temp.validate().is_err());

        let sw = SchemaEntry::typed(1, type_id::SWITCH, ValueType::Bool, 0, "switch").unwrap();
        assert_eq!(sw.type_id, type_id::SWITCH);
        assert!(SchemaEntry::typed(2, type_id::TEMPERATURE, ValueType::Int, unit::TEMPERATURE_K, "t").is_ok());
        assert!(SchemaEntry::typed(2, type_id::TEMPERATURE, ValueType::Int, 0, "t").is_err());

        assert_eq!(
            SchemaEntry::new(1, ValueType::Int, 0, ""),
            Err(ValidationError::InvalidDataName)
        );
        let long = "x".repeat(KNOT_PROTOCOL_DATA_NAME_LEN + 1);
        assert!(SchemaEntry::new(1, ValueType::Int, 0, &long).is_err());
        assert!(SchemaEntry::new(0xFF, ValueType::Int, 0, "reserved").is_err());
    }

    #[test]
    fn test_decode_rejects_illegal_pairing() {
        let mut buf = [0u8; SchemaEntry::SIZE];
        buf[0] = 4;
        buf[1] = ValueType::Bool.as_u8();
        buf[2] = unit::TEMPERATURE_C;
        buf[3] = b'x';
        buf[67..].copy_from_slice(&type_id::TEMPERATURE.to_le_bytes());
        let err = SchemaEntry::read(&mut ByteReader::new(&buf)).unwrap_err();
        assert_eq!(err.result_code(), crate::app::ResultCode::InvalidSchema);

        buf[1] = 0;
        assert_eq!(
            SchemaEntry::read(&mut ByteReader::new(&buf)),
            Err(Error::Validation(ValidationError::ValueTypeOutOfRange(0)))
        );
    }

    #[test]
    fn test_value_type_checked_before_name() {
        let mut buf = [0u8; SchemaEntry::BASE_SIZE];
        buf[0] = 4;
        buf[1] = 9;
        buf[3] = 0xFF;
        assert_eq!(
            SchemaEntry::read(&mut ByteReader::new(&buf)),
            Err(Error::Validation(ValidationError::ValueTypeOutOfRange(9)))
        );

        // Once value_type is legal the bad name is what fails
        buf[1] = ValueType::Int.as_u8();
        assert_eq!(
            SchemaEntry::read(&mut ByteReader::new(&buf)),
            Err(Error::Validation(ValidationError::InvalidDataName))
        );
    }

    #[test]
    fn test_message_sequence() {
        assert_eq!(schema_messages(&[]), Err(Error::SchemaEmpty));

        let single = schema_messages(&[entry(1, "a")]).unwrap();
        assert_eq!(single.len(), 1);
        assert!(matches!(single[0], AppMessage::SchemaEnd(_)));

        let entries = [entry(1, "a"), entry(2, "b"), entry(3, "c")];
        let msgs = schema_messages(&entries).unwrap();
        let types: std::vec::Vec<_> = msgs.iter().map(AppMessage::message_type).collect();
        assert_eq!(
            types,
            [
                AppMessageType::PostSchemaStart,
                AppMessageType::PostSchema,
                AppMessageType::PostSchemaEnd
            ]
        );
        for (i, t) in types.iter().enumerate() {
            assert_eq!(schema_message_type(i, types.len()), *t);
        }
    }

    #[test]
    fn test_assembler_collects_schema() {
        let entries = [entry(1, "a"), entry(2, "b"), entry(3, "c")];
        let mut asm = SchemaAssembler::new();
        let mut done = None;
        for msg in schema_messages(&entries).unwrap() {
            done = asm.push(&msg).unwrap();
        }
        let schema = done.unwrap();
        assert_eq!(schema.as_slice(), &entries);
        assert!(!asm.in_progress());
        assert!(asm.is_empty());
    }

    #[test]
    fn test_assembler_single_entry() {
        let mut asm = SchemaAssembler::new();
        let schema = asm.push(&AppMessage::SchemaEnd(entry(9, "solo"))).unwrap();
        assert_eq!(schema.unwrap().len(), 1);
    }

    #[test]
    fn test_assembler_sequence_errors() {
        let mut asm = SchemaAssembler::new();
        assert_eq!(
            asm.push(&AppMessage::Schema(entry(1, "a"))),
            Err(Error::SchemaSequence)
        );

        asm.push(&AppMessage::SchemaStart(entry(1, "a"))).unwrap();
        let dup = asm.push(&AppMessage::Schema(entry(1, "again")));
        assert_eq!(dup, Err(Error::SchemaSequence));
        assert_eq!(dup.unwrap_err().result_code(), crate::app::ResultCode::InvalidSchema);
        assert!(!asm.in_progress());
    }

    #[test]
    fn test_assembler_restart() {
        let mut asm = SchemaAssembler::new();
        asm.push(&AppMessage::SchemaStart(entry(1, "a"))).unwrap();
        asm.push(&AppMessage::SchemaStart(entry(5, "b"))).unwrap();
        let schema = asm
            .push(&AppMessage::SchemaEnd(entry(6, "c")))
            .unwrap()
            .unwrap();
        let ids: std::vec::Vec<u8> = schema.iter().map(|e| e.data_id).collect();
        assert_eq!(ids, [5, 6]);
    }
}
