// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Validation library
//!
//! Stateless guards applied before wire bytes become typed values. Every
//! function is pure; failures identify the offending field.

use crate::error::ValidationError;
use crate::net::{NodeAddress, KNOT_NET_VERSION_MAJOR};
use crate::types::{max_unit, type_id, unit, ValueType};

/// Data id reserved for "not applicable"
pub const DATA_ID_NA: u8 = 0xFF;

/// Highest usable data id
pub const DATA_ID_MAX: u8 = 0xFE;

/// Check a `value_type` byte against `VALUE_TYPE_MIN..=VALUE_TYPE_MAX`.
pub fn value_type_is_valid(value_type: u8) -> Result<ValueType, ValidationError> {
    ValueType::from_u8(value_type)
}

/// Check a schema declaration.
///
/// The value type is range-checked first; then the triple must be one of:
///
/// | type_id            | value types   | units                 |
/// |--------------------|---------------|-----------------------|
/// | physical quantity  | Int, Float    | `1..=max_unit(type)`  |
/// | `SWITCH`           | Bool          | not applicable        |
/// | `COMMAND`          | Raw           | not applicable        |
/// | `NONE`             | Int/Float/Raw | not applicable        |
pub fn schema_is_valid(type_id: u16, value_type: u8, unit: u8) -> Result<(), ValidationError> {
    let vt = value_type_is_valid(value_type)?;

    let legal = if let Some(max) = max_unit(type_id) {
        vt.is_numeric() && (1..=max).contains(&unit)
    } else {
        match type_id {
            type_id::SWITCH => vt == ValueType::Bool && unit == unit::NOT_APPLICABLE,
            type_id::COMMAND => vt == ValueType::Raw && unit == unit::NOT_APPLICABLE,
            type_id::NONE => vt != ValueType::Bool && unit == unit::NOT_APPLICABLE,
            _ => false,
        }
    };

    if legal {
        Ok(())
    } else {
        Err(ValidationError::InvalidSchema {
            type_id,
            value_type,
            unit,
        })
    }
}

pub fn data_id_is_valid(data_id: u8) -> Result<(), ValidationError> {
    if data_id > DATA_ID_MAX {
        return Err(ValidationError::InvalidDataId(data_id));
    }
    Ok(())
}

/// Exact major match required; minor differences are tolerated.
pub fn version_is_compatible(major: u8, minor: u8) -> Result<(), ValidationError> {
    if major != KNOT_NET_VERSION_MAJOR {
        return Err(ValidationError::IncompatibleVersion { major, minor });
    }
    Ok(())
}

pub fn device_address_is_valid(addr: NodeAddress) -> Result<(), ValidationError> {
    if !addr.is_device() {
        return Err(ValidationError::InvalidAddress(addr.0));
    }
    Ok(())
}

pub fn gateway_address_is_valid(addr: NodeAddress) -> Result<(), ValidationError> {
    if !addr.is_gateway() {
        return Err(ValidationError::InvalidAddress(addr.0));
    }
    Ok(())
}

/// A unicast destination: neither unassigned nor broadcast.
pub fn peer_address_is_valid(addr: NodeAddress) -> Result<(), ValidationError> {
    if addr.is_unassigned() || addr.is_broadcast() {
        return Err(ValidationError::InvalidAddress(addr.0));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{VALUE_TYPE_MAX, VALUE_TYPE_MIN};

    #[test]
    fn test_value_type_range_is_inclusive() {
        for v in 0..=u8::MAX {
            let inside = (VALUE_TYPE_MIN..=VALUE_TYPE_MAX).contains(&v);
            assert_eq!(value_type_is_valid(v).is_ok(), inside, "value_type {v}");
        }
        assert!(value_type_is_valid(VALUE_TYPE_MIN).is_ok());
        assert!(value_type_is_valid(VALUE_TYPE_MAX).is_ok());
    }

    #[test]
    fn test_schema_value_type_checked_first() {
        assert_eq!(
            schema_is_valid(type_id::TEMPERATURE, 0x09, unit::TEMPERATURE_C),
            Err(ValidationError::ValueTypeOutOfRange(0x09))
        );
    }

    #[test]
    fn test_schema_physical_units() {
        assert!(schema_is_valid(type_id::TEMPERATURE, 1, unit::TEMPERATURE_C).is_ok());
        assert!(schema_is_valid(type_id::TEMPERATURE, 2, unit::TEMPERATURE_K).is_ok());
        assert!(schema_is_valid(type_id::TEMPERATURE, 1, 0).is_err());
        assert!(schema_is_valid(type_id::TEMPERATURE, 1, unit::TEMPERATURE_K + 1).is_err());
    }

    #[test]
    fn test_bool_rejects_continuous_unit() {
        let err = schema_is_valid(type_id::TEMPERATURE, ValueType::Bool.as_u8(), unit::TEMPERATURE_C);
        assert_eq!(
            err,
            Err(ValidationError::InvalidSchema {
                type_id: type_id::TEMPERATURE,
                value_type: 3,
                unit: 1,
            })
        );
        assert!(schema_is_valid(type_id::SWITCH, 3, unit::NOT_APPLICABLE).is_ok());
        assert!(schema_is_valid(type_id::SWITCH, 3, 1).is_err());
        assert!(schema_is_valid(type_id::SWITCH, 1, 0).is_err());
    }

    #[test]
    fn test_logic_and_generic_types() {
        assert!(schema_is_valid(type_id::COMMAND, 4, 0).is_ok());
        assert!(schema_is_valid(type_id::COMMAND, 2, 0).is_err());
        assert!(schema_is_valid(type_id::NONE, 1, 0).is_ok());
        assert!(schema_is_valid(type_id::NONE, 4, 0).is_ok());
        assert!(schema_is_valid(type_id::NONE, 3, 0).is_err());
        assert!(schema_is_valid(type_id::INVALID, 1, 0).is_err());
        assert!(schema_is_valid(0x0100, 1, 1).is_err());
    }

    #[test]
    fn test_schema_valid_iff_pairing_legal() {
        // Exhaustive over value types and a unit window for every known id.
        let ids = (type_id::BASIC_MIN..=type_id::BASIC_MAX)
            .chain([type_id::NONE, type_id::SWITCH, type_id::COMMAND, type_id::INVALID]);
        for id in ids {
            for vt in 0..=6u8 {
                for u in 0..=8u8 {
                    let expected = match ValueType::from_u8(vt) {
                        Err(_) => false,
                        Ok(t) => match max_unit(id) {
                            Some(max) => t.is_numeric() && u >= 1 && u <= max,
                            None => match id {
                                type_id::SWITCH => t == ValueType::Bool && u == 0,
                                type_id::COMMAND => t == ValueType::Raw && u == 0,
                                type_id::NONE => t != ValueType::Bool && u == 0,
                                _ => false,
                            },
                        },
                    };
                    assert_eq!(schema_is_valid(id, vt, u).is_ok(), expected);
                }
            }
        }
    }

    #[test]
    fn test_data_id_reserved() {
        assert!(data_id_is_valid(0).is_ok());
        assert!(data_id_is_valid(DATA_ID_MAX).is_ok());
        assert_eq!(
            data_id_is_valid(DATA_ID_NA),
            Err(ValidationError::InvalidDataId(0xFF))
        );
    }

    #[test]
    fn test_version_compatibility() {
        assert!(version_is_compatible(KNOT_NET_VERSION_MAJOR, 0).is_ok());
        assert!(version_is_compatible(KNOT_NET_VERSION_MAJOR, 7).is_ok());
        assert!(version_is_compatible(KNOT_NET_VERSION_MAJOR + 1, 0).is_err());
    }

    #[test]
    fn test_address_ranges() {
        assert!(device_address_is_valid(NodeAddress(0x01)).is_ok());
        assert!(device_address_is_valid(NodeAddress(0xF0)).is_ok());
        assert!(device_address_is_valid(NodeAddress(0xF1)).is_err());
        assert!(gateway_address_is_valid(NodeAddress(0xF1)).is_ok());
        assert!(gateway_address_is_valid(NodeAddress(0xFF)).is_err());
        assert!(peer_address_is_valid(NodeAddress::UNASSIGNED).is_err());
        assert!(peer_address_is_valid(NodeAddress::BROADCAST).is_err());
    }
}
