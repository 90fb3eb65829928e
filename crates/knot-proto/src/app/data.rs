// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed sensor readings
//!
//! ```text
//! data_id(1) | unit(1) | value_type(1) | value
//!
//! Float: multiplier(i32) value_int(i32) value_dec(u32)   12 bytes
//! Int:   multiplier(i32) value(i32)                        8 bytes
//! Bool:  value(u8, 0 or 1)                                 1 byte
//! Raw:   value(16)                                        16 bytes
//! ```

use crate::codec::{ByteReader, ByteWriter};
use crate::error::{Result, ValidationError};
use crate::types::ValueType;
use crate::validate;

/// Size of an opaque raw value
pub const KNOT_DATA_RAW_SIZE: usize = 16;

/// Denominator of the float decimal part (six fractional digits)
pub const FLOAT_DECIMAL_SCALE: u32 = 1_000_000;

/// data_id + unit + value_type
pub const DATA_POINT_HEADER_SIZE: usize = 3;

/// A reading value, tagged by its encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataValue {
    /// `(value_int + value_dec / 10^6) * multiplier`; the sign lives in
    /// `value_int` only.
    Float {
        multiplier: i32,
        value_int: i32,
        value_dec: u32,
    },
    /// `value * multiplier`
    Int { multiplier: i32, value: i32 },
    Bool(bool),
    Raw([u8; KNOT_DATA_RAW_SIZE]),
}

impl DataValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            DataValue::Float { .. } => ValueType::Float,
            DataValue::Int { .. } => ValueType::Int,
            DataValue::Bool(_) => ValueType::Bool,
            DataValue::Raw(_) => ValueType::Raw,
        }
    }

    /// Encoded size of the value part alone
    pub const fn encoded_len(&self) -> usize {
        match self {
            DataValue::Float { .. } => 12,
            DataValue::Int { .. } => 8,
            DataValue::Bool(_) => 1,
            DataValue::Raw(_) => KNOT_DATA_RAW_SIZE,
        }
    }

    /// Numeric reading with the multiplier applied; `None` for bool/raw.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            DataValue::Float {
                multiplier,
                value_int,
                value_dec,
            } => {
                let frac = f64::from(value_dec) / f64::from(FLOAT_DECIMAL_SCALE);
                let magnitude = if value_int < 0 {
                    f64::from(value_int) - frac
                } else {
                    f64::from(value_int) + frac
                };
                Some(magnitude * f64::from(multiplier))
            }
            DataValue::Int { multiplier, value } => {
                Some(f64::from(value) * f64::from(multiplier))
            }
            DataValue::Bool(_) | DataValue::Raw(_) => None,
        }
    }

    fn check(&self) -> core::result::Result<(), ValidationError> {
        if let DataValue::Float { value_dec, .. } = *self {
            if value_dec >= FLOAT_DECIMAL_SCALE {
                return Err(ValidationError::InvalidDecimal(value_dec));
            }
        }
        Ok(())
    }
}

/// One reading of one data source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataPoint {
    pub data_id: u8,
    pub unit: u8,
    pub value: DataValue,
}

impl DataPoint {
    pub fn new(
        data_id: u8,
        unit: u8,
        value: DataValue,
    ) -> core::result::Result<Self, ValidationError> {
        validate::data_id_is_valid(data_id)?;
        value.check()?;
        Ok(Self {
            data_id,
            unit,
            value,
        })
    }

    pub fn int(
        data_id: u8,
        unit: u8,
        multiplier: i32,
        value: i32,
    ) -> core::result::Result<Self, ValidationError> {
        Self::new(data_id, unit, DataValue::Int { multiplier, value })
    }

    pub fn float(
        data_id: u8,
        unit: u8,
        multiplier: i32,
        value_int: i32,
        value_dec: u32,
    ) -> core::result::Result<Self, ValidationError> {
        Self::new(
            data_id,
            unit,
            DataValue::Float {
                multiplier,
                value_int,
                value_dec,
            },
        )
    }

    pub fn bool(data_id: u8, value: bool) -> core::result::Result<Self, ValidationError> {
        Self::new(data_id, crate::types::unit::NOT_APPLICABLE, DataValue::Bool(value))
    }

    pub fn raw(
        data_id: u8,
        value: [u8; KNOT_DATA_RAW_SIZE],
    ) -> core::result::Result<Self, ValidationError> {
        Self::new(data_id, crate::types::unit::NOT_APPLICABLE, DataValue::Raw(value))
    }

    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }

    /// Encoded size including the 3-byte prefix
    pub const fn encoded_len(&self) -> usize {
        DATA_POINT_HEADER_SIZE + self.value.encoded_len()
    }

    /// Encode into `buf`, returning bytes written
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut w = ByteWriter::new(buf);
        self.write(&mut w)?;
        Ok(w.position())
    }

    /// Decode one data point from the front of `buf`.
    ///
    /// Returns the point and the bytes consumed.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        let mut r = ByteReader::new(buf);
        let point = Self::read(&mut r)?;
        Ok((point, r.position()))
    }

    pub(crate) fn write(&self, w: &mut ByteWriter<'_>) -> Result<()> {
        validate::data_id_is_valid(self.data_id)?;
        self.value.check()?;

        w.put_u8(self.data_id)?;
        w.put_u8(self.unit)?;
        w.put_u8(self.value_type().as_u8())?;
        match self.value {
            DataValue::Float {
                multiplier,
                value_int,
                value_dec,
            } => {
                w.put_i32(multiplier)?;
                w.put_i32(value_int)?;
                w.put_u32(value_dec)?;
            }
            DataValue::Int { multiplier, value } => {
                w.put_i32(multiplier)?;
                w.put_i32(value)?;
            }
            DataValue::Bool(v) => w.put_u8(u8::from(v))?,
            DataValue::Raw(bytes) => w.put_bytes(&bytes)?,
        }
        Ok(())
    }

    pub(crate) fn read(r: &mut ByteReader<'_>) -> Result<Self> {
        let data_id = r.u8()?;
        let unit = r.u8()?;
        // value_type gates interpretation of everything after it
        let value_type = validate::value_type_is_valid(r.u8()?)?;
        validate::data_id_is_valid(data_id)?;

        let value = match value_type {
            ValueType::Float => DataValue::Float {
                multiplier: r.i32()?,
                value_int: r.i32()?,
                value_dec: r.u32()?,
            },
            ValueType::Int => DataValue::Int {
                multiplier: r.i32()?,
                value: r.i32()?,
            },
            ValueType::Bool => match r.u8()? {
                0 => DataValue::Bool(false),
                1 => DataValue::Bool(true),
                other => return Err(ValidationError::InvalidBool(other).into()),
            },
            ValueType::Raw => {
                let remaining = r.remaining();
                DataValue::Raw(
                    r.array()
                        .map_err(|_| ValidationError::InvalidRawData(remaining))?,
                )
            }
        };
        value.check()?;

        Ok(Self {
            data_id,
            unit,
            value,
        })
    }
}
