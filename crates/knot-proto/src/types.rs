// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Value types, sensor type ids and units
//!
//! A data source is described by three bytes of metadata: what it measures
//! (`type_id`), how its value is encoded (`value_type`) and the unit of the
//! value. Units are numbered per type id starting at 1; `unit::NOT_APPLICABLE`
//! (0) is used by logic types and by the generic `NONE` type.

use crate::error::ValidationError;

/// Lowest valid `value_type` byte
pub const VALUE_TYPE_MIN: u8 = ValueType::Int as u8;

/// Highest valid `value_type` byte
pub const VALUE_TYPE_MAX: u8 = ValueType::Raw as u8;

/// Encoding of a data value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    /// Signed 32-bit integer scaled by a multiplier
    Int = 1,
    /// Integer part + fractional part scaled by a multiplier
    Float = 2,
    /// Single byte, 0 or 1
    Bool = 3,
    /// Opaque fixed-size block
    Raw = 4,
}

impl ValueType {
    pub fn from_u8(v: u8) -> Result<Self, ValidationError> {
        match v {
            1 => Ok(Self::Int),
            2 => Ok(Self::Float),
            3 => Ok(Self::Bool),
            4 => Ok(Self::Raw),
            other => Err(ValidationError::ValueTypeOutOfRange(other)),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// True for encodings that can carry a measured quantity
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }
}

/// Sensor type ids
pub mod type_id {
    /// Generic data source with no physical unit
    pub const NONE: u16 = 0x0000;

    pub const VOLTAGE: u16 = 0x0001;
    pub const CURRENT: u16 = 0x0002;
    pub const RESISTANCE: u16 = 0x0003;
    pub const POWER: u16 = 0x0004;
    pub const TEMPERATURE: u16 = 0x0005;
    pub const RELATIVE_HUMIDITY: u16 = 0x0006;
    pub const LUMINOSITY: u16 = 0x0007;
    pub const TIME: u16 = 0x0008;
    pub const MASS: u16 = 0x0009;
    pub const PRESSURE: u16 = 0x000A;
    pub const DISTANCE: u16 = 0x000B;
    pub const ANGLE: u16 = 0x000C;
    pub const VOLUME: u16 = 0x000D;
    pub const AREA: u16 = 0x000E;
    pub const RAIN: u16 = 0x000F;
    pub const DENSITY: u16 = 0x0010;
    pub const LATITUDE: u16 = 0x0011;
    pub const LONGITUDE: u16 = 0x0012;
    pub const SPEED: u16 = 0x0013;
    pub const VOLUME_FLOW: u16 = 0x0014;
    pub const ENERGY: u16 = 0x0015;

    /// First and last physical quantity ids
    pub const BASIC_MIN: u16 = VOLTAGE;
    pub const BASIC_MAX: u16 = ENERGY;

    /// On/off actuator or contact
    pub const SWITCH: u16 = 0xFFF0;
    /// Opaque command sink
    pub const COMMAND: u16 = 0xFFFA;

    /// Never valid
    pub const INVALID: u16 = 0xFFFF;
}

/// Unit codes, numbered per sensor type
pub mod unit {
    pub const NOT_APPLICABLE: u8 = 0;

    pub const VOLTAGE_V: u8 = 1;
    pub const VOLTAGE_MV: u8 = 2;
    pub const VOLTAGE_KV: u8 = 3;

    pub const CURRENT_A: u8 = 1;
    pub const CURRENT_MA: u8 = 2;

    pub const RESISTANCE_OHM: u8 = 1;

    pub const POWER_W: u8 = 1;
    pub const POWER_KW: u8 = 2;
    pub const POWER_MW: u8 = 3;

    pub const TEMPERATURE_C: u8 = 1;
    pub const TEMPERATURE_F: u8 = 2;
    pub const TEMPERATURE_K: u8 = 3;

    pub const RELATIVE_HUMIDITY: u8 = 1;

    pub const LUMINOSITY_LM: u8 = 1;
    pub const LUMINOSITY_CD: u8 = 2;
    pub const LUMINOSITY_LX: u8 = 3;

    pub const TIME_S: u8 = 1;
    pub const TIME_MS: u8 = 2;
    pub const TIME_US: u8 = 3;

    pub const MASS_KG: u8 = 1;
    pub const MASS_G: u8 = 2;
    pub const MASS_LB: u8 = 3;
    pub const MASS_OZ: u8 = 4;

    pub const PRESSURE_PA: u8 = 1;
    pub const PRESSURE_PSI: u8 = 2;
    pub const PRESSURE_BAR: u8 = 3;

    pub const DISTANCE_M: u8 = 1;
    pub const DISTANCE_CM: u8 = 2;
    pub const DISTANCE_MI: u8 = 3;
    pub const DISTANCE_KM: u8 = 4;

    pub const ANGLE_RADIAN: u8 = 1;
    pub const ANGLE_DEGREE: u8 = 2;

    pub const VOLUME_LITER: u8 = 1;
    pub const VOLUME_MILLILITER: u8 = 2;
    pub const VOLUME_FLUID_OUNCE: u8 = 3;
    pub const VOLUME_GALLON: u8 = 4;

    pub const AREA_M2: u8 = 1;
    pub const AREA_HECTARE: u8 = 2;
    pub const AREA_ACRE: u8 = 3;

    pub const RAIN_MM: u8 = 1;

    pub const DENSITY_KG_M3: u8 = 1;

    pub const LATITUDE_DEGREE: u8 = 1;

    pub const LONGITUDE_DEGREE: u8 = 1;

    pub const SPEED_M_S: u8 = 1;
    pub const SPEED_CM_S: u8 = 2;
    pub const SPEED_KM_H: u8 = 3;
    pub const SPEED_MI_H: u8 = 4;

    pub const VOLUME_FLOW_M3_S: u8 = 1;
    pub const VOLUME_FLOW_L_S: u8 = 2;
    pub const VOLUME_FLOW_L_MIN: u8 = 3;

    pub const ENERGY_J: u8 = 1;
    pub const ENERGY_WH: u8 = 2;
    pub const ENERGY_KWH: u8 = 3;
    pub const ENERGY_BTU: u8 = 4;
}

/// Highest unit code for a physical quantity, `None` if `id` is not one.
pub fn max_unit(id: u16) -> Option<u8> {
    let max = match id {
        type_id::VOLTAGE => unit::VOLTAGE_KV,
        type_id::CURRENT => unit::CURRENT_MA,
        type_id::RESISTANCE => unit::RESISTANCE_OHM,
        type_id::POWER => unit::POWER_MW,
        type_id::TEMPERATURE => unit::TEMPERATURE_K,
        type_id::RELATIVE_HUMIDITY => unit::RELATIVE_HUMIDITY,
        type_id::LUMINOSITY => unit::LUMINOSITY_LX,
        type_id::TIME => unit::TIME_US,
        type_id::MASS => unit::MASS_OZ,
        type_id::PRESSURE => unit::PRESSURE_BAR,
        type_id::DISTANCE => unit::DISTANCE_KM,
        type_id::ANGLE => unit::ANGLE_DEGREE,
        type_id::VOLUME => unit::VOLUME_GALLON,
        type_id::AREA => unit::AREA_ACRE,
        type_id::RAIN => unit::RAIN_MM,
        type_id::DENSITY => unit::DENSITY_KG_M3,
        type_id::LATITUDE => unit::LATITUDE_DEGREE,
        type_id::LONGITUDE => unit::LONGITUDE_DEGREE,
        type_id::SPEED => unit::SPEED_MI_H,
        type_id::VOLUME_FLOW => unit::VOLUME_FLOW_L_MIN,
        type_id::ENERGY => unit::ENERGY_BTU,
        _ => return None,
    };
    Some(max)
}
